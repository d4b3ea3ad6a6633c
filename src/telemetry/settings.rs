use crate::telemetry::level::MetricsLevel;
use metrics::{Label, Recorder};
use std::fmt;
use std::sync::Arc;
use tracing::Dispatch;

/// The tracer and meter a component reports its own telemetry to.
///
/// Both are supplied by the hosting process. Spans are created under
/// `tracer`; counters go to `meter`, or to the process-wide `metrics`
/// recorder when no meter was injected.
#[derive(Clone)]
pub struct TelemetrySettings {
    tracer: Dispatch,
    meter: Option<Arc<dyn Recorder + Send + Sync>>,
    level: MetricsLevel,
}

impl fmt::Debug for TelemetrySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetrySettings")
            .field("meter", &self.meter.as_ref().map(|_| "injected"))
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self::from_current()
    }
}

impl TelemetrySettings {
    pub fn new(tracer: Dispatch, meter: Arc<dyn Recorder + Send + Sync>, level: MetricsLevel) -> Self {
        Self {
            tracer,
            meter: Some(meter),
            level,
        }
    }

    /// Uses whatever dispatcher is current on this thread and the global recorder.
    pub fn from_current() -> Self {
        Self {
            tracer: tracing::dispatcher::get_default(|d| d.clone()),
            meter: None,
            level: MetricsLevel::default(),
        }
    }

    pub fn with_level(mut self, level: MetricsLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_tracer(mut self, tracer: Dispatch) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn with_meter(mut self, meter: Arc<dyn Recorder + Send + Sync>) -> Self {
        self.meter = Some(meter);
        self
    }

    pub fn level(&self) -> MetricsLevel {
        self.level
    }

    pub fn tracer(&self) -> &Dispatch {
        &self.tracer
    }

    /// Run `f` with the injected tracer as the default dispatcher.
    pub(crate) fn in_tracer<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.tracer, f)
    }

    fn in_meter<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.meter {
            Some(meter) => metrics::with_local_recorder(&**meter, f),
            None => f(),
        }
    }

    /// Add `value` to a counter, unless the level disables counters.
    pub(crate) fn add_to_counter(&self, name: String, labels: Vec<Label>, value: u64) {
        if !self.level.records_counters() {
            return;
        }
        self.in_meter(|| metrics::counter!(name, labels).increment(value));
    }

    /// Set a gauge; only recorded at [`MetricsLevel::Detailed`].
    pub(crate) fn set_gauge(&self, name: String, labels: Vec<Label>, value: f64) {
        if self.level < MetricsLevel::Detailed {
            return;
        }
        self.in_meter(|| metrics::gauge!(name, labels).set(value));
    }
}
