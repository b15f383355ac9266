//! Model provider integration.
//!
//! Provides the [`ModelProvider`] seam, the Gemini implementation, a
//! deterministic stub, and the structured-call executor that turns a prompt
//! into a validated typed value.

mod gemini;
mod stub;
mod structured;

pub use gemini::GeminiProvider;
pub use stub::StubProvider;
pub use structured::{
    clean_response, compose_prompt, decode, execute, schema_json, AgentError, CallSpec, Decoded,
};

use async_trait::async_trait;

/// A single prompt sent to a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    /// Model name, e.g. `gemini-2.5-flash`.
    pub model: String,

    /// System instruction describing the role and task.
    pub system: String,

    /// User prompt including the rendered context and schema directive.
    pub prompt: String,
}

/// Trait for remote model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send a prompt and return the raw response text.
    async fn generate(&self, request: &ModelRequest) -> Result<String, ProviderError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}

/// Provider error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("Rate limited ({status}): {message}")]
    RateLimited { status: u16, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No response from model")]
    EmptyResponse,

    #[error("No API key configured")]
    MissingCredentials,
}

impl ProviderError {
    /// Whether this failure signals provider overload and is worth retrying.
    ///
    /// Classified responses count only when they carry a 429. Transport
    /// errors have no status, so their text is checked for
    /// `RESOURCE_EXHAUSTED` or `429 Too Many Requests` instead.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status == 429,
            Self::Transport(message) => {
                let text = message.to_lowercase();
                text.contains("resource_exhausted") || text.contains("429 too many requests")
            }
            Self::EmptyResponse | Self::MissingCredentials => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status.as_u16() == 429 => {
                Self::RateLimited { status: 429, message: err.to_string() }
            }
            Some(status) => Self::Api { status: status.as_u16(), message: err.to_string() },
            None => Self::Transport(err.to_string()),
        }
    }
}
