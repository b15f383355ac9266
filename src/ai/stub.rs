use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ModelProvider, ModelRequest, ProviderError};

/// Stub provider for testing.
///
/// Replays scripted responses in order without network calls. Once the
/// script runs out the last response is repeated, so a single scripted
/// error simulates a persistent failure.
pub struct StubProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    last: Mutex<Option<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl StubProvider {
    /// Create a stub that replays `responses` in order.
    pub fn new(responses: impl IntoIterator<Item = Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a stub that always answers with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new([Ok(text.into())])
    }

    /// Create a stub that always fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self::new([Err(error)])
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Copies of every request received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ModelProvider for StubProvider {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ProviderError> {
        self.requests.lock().push(request.clone());

        let next = self.script.lock().pop_front();
        let mut last = self.last.lock();
        if let Some(response) = next {
            *last = Some(response);
        }

        last.clone().unwrap_or(Err(ProviderError::EmptyResponse))
    }

    fn name(&self) -> &str {
        "stub"
    }
}
