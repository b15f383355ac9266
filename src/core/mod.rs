//! Core infrastructure shared by the agents and the server.
//!
//! This module contains configuration loading and the retry policy used
//! around every remote model call.

mod config;
mod retry;

pub use config::{
    AgentConfig, AgentsConfig, Config, ConfigError, Credentials, ProviderConfig, RetryConfig,
    ServerConfig, API_KEY_ENV, FALLBACK_API_KEY_ENV,
};
pub use retry::{retry_async_if, RetryPolicy, RetryResult};
