use crate::component::ComponentId;
use crate::obsreport::names::{self, metric_name, PROCESSOR_PREFIX};
use crate::obsreport::Signal;
use crate::telemetry::TelemetrySettings;
use metrics::Label;

#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub processor_id: ComponentId,
    pub telemetry: TelemetrySettings,
}

/// Counts what a processor passed on, refused or dropped. No spans.
#[derive(Debug, Clone)]
pub struct ObsProcessor {
    labels: Vec<Label>,
    telemetry: TelemetrySettings,
}

impl ObsProcessor {
    pub fn new(settings: ProcessorSettings) -> Self {
        Self {
            labels: vec![Label::new(names::PROCESSOR_KEY, settings.processor_id.to_string())],
            telemetry: settings.telemetry,
        }
    }

    /// Items successfully pushed to the next component.
    pub fn accepted(&self, signal: Signal, num_items: usize) {
        self.record(signal.accepted_key(), num_items);
    }

    /// Items the next component rejected.
    pub fn refused(&self, signal: Signal, num_items: usize) {
        self.record(signal.refused_key(), num_items);
    }

    /// Items the processor itself discarded.
    pub fn dropped(&self, signal: Signal, num_items: usize) {
        self.record(signal.dropped_key(), num_items);
    }

    pub fn traces_accepted(&self, num_spans: usize) {
        self.accepted(Signal::Traces, num_spans)
    }

    pub fn traces_refused(&self, num_spans: usize) {
        self.refused(Signal::Traces, num_spans)
    }

    pub fn traces_dropped(&self, num_spans: usize) {
        self.dropped(Signal::Traces, num_spans)
    }

    pub fn metrics_accepted(&self, num_points: usize) {
        self.accepted(Signal::Metrics, num_points)
    }

    pub fn metrics_refused(&self, num_points: usize) {
        self.refused(Signal::Metrics, num_points)
    }

    pub fn metrics_dropped(&self, num_points: usize) {
        self.dropped(Signal::Metrics, num_points)
    }

    pub fn logs_accepted(&self, num_records: usize) {
        self.accepted(Signal::Logs, num_records)
    }

    pub fn logs_refused(&self, num_records: usize) {
        self.refused(Signal::Logs, num_records)
    }

    pub fn logs_dropped(&self, num_records: usize) {
        self.dropped(Signal::Logs, num_records)
    }

    fn record(&self, measure: &str, num_items: usize) {
        self.telemetry.add_to_counter(
            metric_name(PROCESSOR_PREFIX, measure),
            self.labels.clone(),
            num_items as u64,
        );
    }
}
