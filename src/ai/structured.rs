//! Structured calls: prompt in, validated typed value out.
//!
//! Every adapter goes through [`execute`]. It appends a schema directive to
//! the rendered context, calls the provider under the call site's retry
//! policy, strips code fences and decodes the result. Parse and validation
//! failures are terminal; only rate limits are retried.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use super::{ModelProvider, ModelRequest, ProviderError};
use crate::core::{retry_async_if, RetryPolicy};
use crate::models::Validate;

/// Terminal failure of a structured call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("Model still rate limited after {attempts} attempts: {source}")]
    RateLimitExhausted { attempts: u32, source: ProviderError },

    #[error("Model provider failed: {0}")]
    Provider(ProviderError),

    #[error("Model returned malformed JSON: {0}")]
    MalformedResponse(String),

    #[error("Model response failed validation: {0}")]
    InvalidResponse(String),
}

impl AgentError {
    /// Stable tag for the error kind, surfaced by the HTTP API.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateLimitExhausted { .. } => "rate_limited",
            Self::Provider(_) => "provider",
            Self::MalformedResponse(_) => "malformed_response",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// Outcome of decoding cleaned response text.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded<T> {
    /// Parsed and passed every constraint.
    Valid(T),

    /// Not JSON at all.
    Malformed(String),

    /// JSON, but the wrong shape or out of range.
    Invalid(String),
}

impl<T> Decoded<T> {
    pub fn into_result(self) -> Result<T, AgentError> {
        match self {
            Self::Valid(value) => Ok(value),
            Self::Malformed(msg) => Err(AgentError::MalformedResponse(msg)),
            Self::Invalid(msg) => Err(AgentError::InvalidResponse(msg)),
        }
    }
}

/// Everything one call site needs besides the provider.
#[derive(Debug, Clone)]
pub struct CallSpec<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub context: String,
    pub policy: &'a RetryPolicy,
}

/// Pretty-printed JSON schema for `T`.
pub fn schema_json<T: JsonSchema>() -> String {
    let schema = schemars::schema_for!(T);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// Append the JSON-only directive and the schema of `T` to `context`.
pub fn compose_prompt<T: JsonSchema>(context: &str) -> String {
    format!(
        "{context}\n\n\
         CRITICAL: Return the result as valid JSON matching this schema:\n{schema}\n\
         Do not include markdown formatting like code fences.",
        schema = schema_json::<T>()
    )
}

/// Strip surrounding whitespace and any code-fence markers.
pub fn clean_response(raw: &str) -> String {
    raw.trim().replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse and validate cleaned text in one step.
pub fn decode<T: DeserializeOwned + Validate>(text: &str) -> Decoded<T> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => return Decoded::Malformed(e.to_string()),
    };

    let typed: T = match serde_json::from_value(value) {
        Ok(typed) => typed,
        Err(e) => return Decoded::Invalid(e.to_string()),
    };

    match typed.validate() {
        Ok(()) => Decoded::Valid(typed),
        Err(e) => Decoded::Invalid(e.to_string()),
    }
}

/// Run one structured call against `provider`.
pub async fn execute<T>(provider: &dyn ModelProvider, call: &CallSpec<'_>) -> Result<T, AgentError>
where
    T: DeserializeOwned + JsonSchema + Validate,
{
    let request = ModelRequest {
        model: call.model.to_string(),
        system: call.system.to_string(),
        prompt: compose_prompt::<T>(&call.context),
    };

    tracing::debug!(
        provider = provider.name(),
        model = call.model,
        prompt_bytes = request.prompt.len(),
        "Starting structured call"
    );

    let outcome = retry_async_if(
        call.policy,
        || provider.generate(&request),
        ProviderError::is_rate_limit,
    )
    .await;
    let attempts = outcome.attempts;

    let raw = outcome.into_result().map_err(|e| {
        let err = if e.is_rate_limit() {
            AgentError::RateLimitExhausted { attempts, source: e }
        } else {
            AgentError::Provider(e)
        };
        tracing::error!(model = call.model, attempts, kind = err.kind(), error = %err, "Model call failed");
        err
    })?;

    let cleaned = clean_response(&raw);
    tracing::debug!(model = call.model, attempts, response_bytes = cleaned.len(), "Model responded");

    decode::<T>(&cleaned).into_result().map_err(|err| {
        tracing::error!(model = call.model, kind = err.kind(), error = %err, "Model response rejected");
        err
    })
}
