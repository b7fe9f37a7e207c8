//! Engine gateway configuration.
//!
//! Points the HTTP engine client at a gateway. Built from the service's
//! YAML config, from environment variables, or explicitly for tests.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Connection settings for the engine gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Gateway base URL, e.g. `http://ace-gateway:9000`.
    pub base_url: Url,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after a failed transport attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further attempt.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `BISACE_ENGINE_URL` (required)
    /// - `BISACE_ENGINE_TIMEOUT_SECS` (default: 30)
    /// - `BISACE_ENGINE_MAX_RETRIES` (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("BISACE_ENGINE_URL").map_err(|_| ConfigError::MissingUrl)?;
        let base_url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidUrl("BISACE_ENGINE_URL".to_string(), e.to_string()))?;

        Ok(Self {
            base_url,
            timeout_secs: env_number("BISACE_ENGINE_TIMEOUT_SECS").unwrap_or_else(default_timeout_secs),
            max_retries: env_number("BISACE_ENGINE_MAX_RETRIES").unwrap_or_else(default_max_retries),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        })
    }

    /// Configuration pointing at a local gateway (for testing).
    ///
    /// Retries are disabled so failing tests fail fast.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base` cannot be parsed.
    pub fn local(base: &str) -> Result<Self, ConfigError> {
        let base_url =
            Url::parse(base).map_err(|e| ConfigError::InvalidUrl(base.to_string(), e.to_string()))?;
        Ok(Self {
            base_url,
            timeout_secs: 5,
            max_retries: 0,
            retry_base_delay_ms: 10,
        })
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env_number<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.parse().ok())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BISACE_ENGINE_URL environment variable is required")]
    MissingUrl,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
