//! # pm-agent
//!
//! Smart PM agent - backlog grooming, feedback clustering and roadmap
//! planning backed by a large language model.
//!
//! Every task follows the same path: render a prompt that embeds a JSON
//! schema, call the model (retrying only on rate limits), strip code fences,
//! then parse and validate the answer into a typed value. Failures are
//! reported with their kind; nothing is ever substituted for a bad answer.
//!
//! ## Quick Start
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! pm-agent serve --port 8000
//!
//! curl -X POST localhost:8000/api/groom \
//!   -H 'content-type: application/json' \
//!   -d '{"id":"5","title":"fix it","description":"","type":"bug"}'
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod agents;
pub mod ai;
pub mod core;
pub mod models;
pub mod server;

pub use agents::{AgentSettings, Agents, Analyst, Groomer, Strategist};
pub use ai::{AgentError, GeminiProvider, ModelProvider, ModelRequest, ProviderError, StubProvider};
pub use core::{Config, Credentials, RetryPolicy};
pub use models::{
    BacklogItem, FeedbackCluster, FeedbackItem, ItemStatus, ItemType, QualityIssue, RiskLevel,
    RoadmapItem, RoadmapPlan, Sentiment, Validate, ValidationError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "pm-agent";
