//! Google Gemini API integration.
//!
//! Implements the ModelProvider trait for the `generateContent` endpoint.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ModelProvider, ModelRequest, ProviderError};
use crate::core::{Credentials, ProviderConfig};

/// Gemini API provider.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    /// Create a provider from explicit credentials and provider settings.
    pub fn new(credentials: &Credentials, config: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            api_key: credentials.api_key().to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingCredentials);
        }

        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: request.system.clone() }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: request.prompt.clone() }],
            }],
        };

        tracing::debug!(model = %request.model, "Sending generateContent request");

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &text));
        }

        let response: GenerateResponse = response.json().await?;
        response.text().ok_or(ProviderError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Map a non-success response to a provider error.
fn classify_failure(status: StatusCode, body: &str) -> ProviderError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.to_string());
    let exhausted = parsed
        .as_ref()
        .and_then(|e| e.status.as_deref())
        .is_some_and(|s| s.eq_ignore_ascii_case("RESOURCE_EXHAUSTED"));

    if status == StatusCode::TOO_MANY_REQUESTS || exhausted {
        ProviderError::RateLimited { status: status.as_u16(), message }
    } else {
        ProviderError::Api { status: status.as_u16(), message }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}
