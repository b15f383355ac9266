//! Task adapters.
//!
//! Each adapter renders a deterministic context block from its input,
//! pairs it with a fixed system instruction and hands both to
//! [`crate::ai::execute`] with its own output type and retry policy.
//!
//! - [`Groomer`]: one backlog item in, the same item scored and annotated out
//! - [`Analyst`]: feedback items in, themed clusters out
//! - [`Strategist`]: backlog items in, a weekly roadmap out

mod analyst;
mod groomer;
mod strategist;

use std::sync::Arc;

pub use analyst::Analyst;
pub use groomer::Groomer;
pub use strategist::Strategist;

use crate::ai::ModelProvider;
use crate::core::{AgentConfig, AgentsConfig, RetryPolicy};

/// Model and retry policy for one adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub model: String,
    pub retry: RetryPolicy,
}

impl AgentSettings {
    pub fn new(model: impl Into<String>, retry: RetryPolicy) -> Self {
        Self { model: model.into(), retry }
    }
}

impl From<&AgentConfig> for AgentSettings {
    fn from(config: &AgentConfig) -> Self {
        Self::new(config.model.clone(), config.retry.to_policy())
    }
}

/// The three adapters sharing one provider.
#[derive(Clone)]
pub struct Agents {
    pub groomer: Groomer,
    pub analyst: Analyst,
    pub strategist: Strategist,
}

impl Agents {
    /// Build all adapters from configuration.
    pub fn from_config(provider: Arc<dyn ModelProvider>, config: &AgentsConfig) -> Self {
        Self {
            groomer: Groomer::new(Arc::clone(&provider), AgentSettings::from(&config.groomer)),
            analyst: Analyst::new(Arc::clone(&provider), AgentSettings::from(&config.analyst)),
            strategist: Strategist::new(provider, AgentSettings::from(&config.strategist)),
        }
    }
}
