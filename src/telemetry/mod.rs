//! Telemetry about the pipeline itself
//!
//! - [`TelemetrySettings`]: the injected tracer/meter pair every obsreport
//!   reporter records into, plus the [`MetricsLevel`] gate
//! - [`prometheus`]: optional Prometheus exposition of those counters
//! - [`logging`]: subscriber setup for binaries

pub mod level;
pub mod logging;
pub mod prometheus;
pub mod settings;

pub use level::MetricsLevel;
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingError};
pub use prometheus::{start_metrics_server, MetricsConfig, MetricsError};
pub use settings::TelemetrySettings;
