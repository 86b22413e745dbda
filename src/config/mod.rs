//! # Reconciler Configuration
//!
//! Process configuration loaded from environment variables.
//!
//! All configuration has sensible defaults and can be overridden via environment variables.
//! Invalid values are logged and replaced by their default.

mod duration;
mod reconciler;

pub use duration::parse_duration;
pub use reconciler::ReconcilerConfig;

use crate::constants::{
    DEFAULT_METRICS_PORT, DEFAULT_SERVER_POLL_INTERVAL_MS, DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
};

/// Listener settings for `/metrics`, `/healthz` and `/readyz`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `METRICS_PORT`
    pub metrics_port: u16,
    /// `SERVER_STARTUP_TIMEOUT_SECS`: startup fails if the listener is not bound by then
    pub startup_timeout_secs: u64,
    /// `SERVER_POLL_INTERVAL_MS`: how often startup checks whether the listener is bound
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            metrics_port: env_var_or_default("METRICS_PORT", defaults.metrics_port),
            startup_timeout_secs: env_var_or_default(
                "SERVER_STARTUP_TIMEOUT_SECS",
                defaults.startup_timeout_secs,
            ),
            poll_interval_ms: env_var_or_default(
                "SERVER_POLL_INTERVAL_MS",
                defaults.poll_interval_ms,
            ),
        }
    }
}

/// Load configuration from environment variables with defaults
pub fn load_config() -> (ReconcilerConfig, ServerConfig) {
    (ReconcilerConfig::from_env(), ServerConfig::from_env())
}

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    variable = key,
                    value = %raw,
                    error = %e,
                    "Invalid configuration value, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}
