use crate::component::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much telemetry the pipeline records about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MetricsLevel {
    /// No counters are recorded.
    None,
    Basic,
    #[default]
    Normal,
    /// Everything, including per-queue gauges.
    Detailed,
}

impl MetricsLevel {
    pub fn records_counters(&self) -> bool {
        *self > MetricsLevel::None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricsLevel::None => "none",
            MetricsLevel::Basic => "basic",
            MetricsLevel::Normal => "normal",
            MetricsLevel::Detailed => "detailed",
        }
    }
}

impl fmt::Display for MetricsLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricsLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(MetricsLevel::None),
            "basic" => Ok(MetricsLevel::Basic),
            "normal" => Ok(MetricsLevel::Normal),
            "detailed" => Ok(MetricsLevel::Detailed),
            _ => Err(ConfigError::InvalidMetricsLevel(s.to_string())),
        }
    }
}

impl TryFrom<String> for MetricsLevel {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MetricsLevel> for String {
    fn from(level: MetricsLevel) -> Self {
        level.as_str().to_string()
    }
}
