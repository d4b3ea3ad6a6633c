use crate::component::{ComponentResult, ConfigError, ConfigResult, Host, ShutdownFn, StartFn};
use crate::context::Context;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Durations are configured as whole milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Per-attempt deadline for the transport call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Zero means no deadline.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

impl TimeoutSettings {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    pub enabled: bool,
    /// Number of workers draining the queue.
    pub num_consumers: usize,
    /// Maximum number of requests waiting in the queue.
    pub queue_size: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            ..Self::default_enabled()
        }
    }
}

impl QueueSettings {
    pub fn default_enabled() -> Self {
        Self {
            enabled: true,
            num_consumers: 10,
            queue_size: 5000,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.num_consumers == 0 {
            return Err(ConfigError::invalid("num_consumers", "must be positive"));
        }
        if self.queue_size == 0 {
            return Err(ConfigError::invalid("queue_size", "must be positive"));
        }
        Ok(())
    }
}

/// Exponential backoff policy for failed attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub enabled: bool,
    #[serde(rename = "initial_interval_ms", with = "duration_ms")]
    pub initial_interval: Duration,
    #[serde(rename = "max_interval_ms", with = "duration_ms")]
    pub max_interval: Duration,
    /// Total time budget across all attempts of one request. Zero means none.
    #[serde(rename = "max_elapsed_time_ms", with = "duration_ms")]
    pub max_elapsed_time: Duration,
    /// Total attempts, the first one included. Zero means unlimited.
    pub max_attempts: u32,
    pub multiplier: f64,
    pub randomization_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            ..Self::default_enabled()
        }
    }
}

impl RetrySettings {
    pub fn default_enabled() -> Self {
        Self {
            enabled: true,
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(30),
            max_elapsed_time: Duration::from_secs(300),
            max_attempts: 0,
            multiplier: 1.5,
            randomization_factor: 0.5,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.initial_interval.is_zero() {
            return Err(ConfigError::invalid("initial_interval", "must be positive"));
        }
        if self.max_interval < self.initial_interval {
            return Err(ConfigError::invalid(
                "max_interval",
                "must not be less than initial_interval",
            ));
        }
        if self.multiplier.is_nan() || self.multiplier < 1.0 {
            return Err(ConfigError::invalid("multiplier", "must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.randomization_factor) {
            return Err(ConfigError::invalid(
                "randomization_factor",
                "must be in [0, 1)",
            ));
        }
        Ok(())
    }

    pub(crate) fn max_elapsed(&self) -> Option<Duration> {
        (!self.max_elapsed_time.is_zero()).then_some(self.max_elapsed_time)
    }
}

/// Everything a [`BaseExporter`](crate::exporter::BaseExporter) is built from.
#[derive(Clone, Default)]
pub struct ExporterOptions {
    pub timeout: TimeoutSettings,
    pub queue: QueueSettings,
    pub retry: RetrySettings,
    pub(crate) start: Option<StartFn>,
    pub(crate) shutdown: Option<ShutdownFn>,
}

impl fmt::Debug for ExporterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterOptions")
            .field("timeout", &self.timeout)
            .field("queue", &self.queue)
            .field("retry", &self.retry)
            .field("start", &self.start.is_some())
            .field("shutdown", &self.shutdown.is_some())
            .finish()
    }
}

impl ExporterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: TimeoutSettings) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_queue(mut self, queue: QueueSettings) -> Self {
        self.queue = queue;
        self
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    /// Hook run when the exporter starts, before its queue.
    pub fn with_start<F, Fut>(mut self, start: F) -> Self
    where
        F: Fn(Context, Arc<dyn Host>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ComponentResult<()>> + Send + 'static,
    {
        self.start = Some(Arc::new(move |ctx, host| start(ctx, host).boxed()));
        self
    }

    /// Hook run when the exporter shuts down, after its queue drained.
    pub fn with_shutdown<F, Fut>(mut self, shutdown: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ComponentResult<()>> + Send + 'static,
    {
        self.shutdown = Some(Arc::new(move |ctx| shutdown(ctx).boxed()));
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.queue.validate()?;
        self.retry.validate()
    }
}
