//! Structured logging setup for binaries
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to whoever owns the process.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "TELEMETRY_RELAY_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when no environment override is set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| config.level.clone());

    EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter {
        directives,
        reason: e.to_string(),
    })
}

/// Install the global `tracing` subscriber.
///
/// Priority order: `TELEMETRY_RELAY_LOG`, `RUST_LOG`, then `config.level`.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_env_filter(config)?;
    let registry = Registry::default().with(filter);

    let result = match config.format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };

    result.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter {directives:?}: {reason}")]
    InvalidFilter { directives: String, reason: String },

    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}
