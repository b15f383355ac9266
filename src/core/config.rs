//! Configuration management for pm-agent.
//!
//! Handles loading configuration from TOML files and reading the model
//! provider credential once at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::retry::RetryPolicy;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Fallback variable used by Google's own tooling.
pub const FALLBACK_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("Invalid config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("Invalid listen address {0}")]
    InvalidAddress(String),
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Model provider settings
    pub provider: ProviderConfig,

    /// Per-adapter model and retry settings
    pub agents: AgentsConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Whether to allow cross-origin requests from any origin
    pub cors: bool,
}

/// Model provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Gemini API base URL
    pub base_url: String,

    /// Per-request timeout in seconds (0 disables it)
    pub timeout_secs: u64,
}

/// Settings for the three task adapters.
///
/// Each adapter starts from its own preset; a config file only overrides
/// the keys it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AgentsOverride")]
pub struct AgentsConfig {
    pub groomer: AgentConfig,
    pub analyst: AgentConfig,
    pub strategist: AgentConfig,
}

/// Settings for one task adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentConfig {
    /// Model name passed to the provider
    pub model: String,

    /// Backoff schedule for rate-limited calls
    pub retry: RetryConfig,
}

/// Serializable form of a [`RetryPolicy`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_secs: f64,
    pub multiplier: f64,
    pub max_delay_secs: f64,
    pub jitter: bool,
}

/// `[agents]` as written in a config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AgentsOverride {
    groomer: AgentOverride,
    analyst: AgentOverride,
    strategist: AgentOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AgentOverride {
    model: Option<String>,
    retry: RetryOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RetryOverride {
    max_attempts: Option<u32>,
    initial_delay_secs: Option<f64>,
    multiplier: Option<f64>,
    max_delay_secs: Option<f64>,
    jitter: Option<bool>,
}

impl From<AgentsOverride> for AgentsConfig {
    fn from(overrides: AgentsOverride) -> Self {
        Self {
            groomer: AgentConfig::groomer().with_override(overrides.groomer),
            analyst: AgentConfig::analyst().with_override(overrides.analyst),
            strategist: AgentConfig::strategist().with_override(overrides.strategist),
        }
    }
}

impl AgentConfig {
    pub fn groomer() -> Self {
        Self::preset("gemini-2.5-flash", &RetryPolicy::groomer())
    }

    pub fn analyst() -> Self {
        Self::preset("gemini-2.5-flash", &RetryPolicy::analyst())
    }

    pub fn strategist() -> Self {
        Self::preset("gemini-1.5-flash", &RetryPolicy::strategist())
    }

    fn preset(model: &str, policy: &RetryPolicy) -> Self {
        Self { model: model.to_string(), retry: RetryConfig::from(policy) }
    }

    fn with_override(mut self, overrides: AgentOverride) -> Self {
        if let Some(model) = overrides.model {
            self.model = model;
        }
        let retry = &mut self.retry;
        retry.max_attempts = overrides.retry.max_attempts.unwrap_or(retry.max_attempts);
        retry.initial_delay_secs = overrides.retry.initial_delay_secs.unwrap_or(retry.initial_delay_secs);
        retry.multiplier = overrides.retry.multiplier.unwrap_or(retry.multiplier);
        retry.max_delay_secs = overrides.retry.max_delay_secs.unwrap_or(retry.max_delay_secs);
        retry.jitter = overrides.retry.jitter.unwrap_or(retry.jitter);
        self
    }
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Looks for config in:
    /// 1. `.pm-agent.toml` in current directory
    /// 2. `~/.config/pm-agent/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find() {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Path of the config file `load` would use, if one exists.
    pub fn find() -> Option<PathBuf> {
        let local_config = PathBuf::from(".pm-agent.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        Self::config_dir().map(|dir| dir.join("config.toml")).filter(|path| path.exists())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("pm-agent"))
    }
}

impl ServerConfig {
    /// Get the socket address to listen on.
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl RetryConfig {
    /// Convert into the runtime policy.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_delay: secs(self.initial_delay_secs),
            backoff_multiplier: self.multiplier,
            max_delay: secs(self.max_delay_secs),
            jitter: self.jitter,
        }
    }
}

/// Negative, NaN or out-of-range values become zero.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl From<&RetryPolicy> for RetryConfig {
    fn from(policy: &RetryPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts,
            initial_delay_secs: policy.initial_delay.as_secs_f64(),
            multiplier: policy.backoff_multiplier,
            max_delay_secs: policy.max_delay.as_secs_f64(),
            jitter: policy.jitter,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8000, cors: true }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            groomer: AgentConfig::groomer(),
            analyst: AgentConfig::analyst(),
            strategist: AgentConfig::strategist(),
        }
    }
}

/// Whether a `.env` load failure is worth reporting. An absent file is not.
fn is_dotenv_problem(err: &dotenvy::Error) -> bool {
    !matches!(err, dotenvy::Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound)
}

/// Model provider credential, read once at process start.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("api_key", &"<redacted>").finish()
    }
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into() }
    }

    /// Read the API key from `.env` and the process environment.
    ///
    /// Returns `None` when neither variable is set or both are empty.
    pub fn from_env() -> Option<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if is_dotenv_problem(&e) {
                tracing::warn!(error = %e, "Failed to load .env file");
            }
        }

        [API_KEY_ENV, FALLBACK_API_KEY_ENV]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .map(Self::new)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}
