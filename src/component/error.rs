use thiserror::Error;

/// Errors raised while starting or stopping a component.
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Start failed: {0}")]
    StartFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type ComponentResult<T> = Result<T, ComponentError>;

/// Errors raised while validating settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid component id: {0}")]
    InvalidComponentId(String),

    #[error("invalid metrics level: {0:?}")]
    InvalidMetricsLevel(String),

    #[error("{field} {reason}")]
    InvalidSetting { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidSetting {
            field,
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
