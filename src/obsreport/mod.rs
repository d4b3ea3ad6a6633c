//! Observability reports for pipeline components
//!
//! Each reporter wraps one component instance and records, for every
//! operation it performs:
//! - a span named `"<kind>/<component id>/<operation>"` (receivers, scrapers
//!   and exporters)
//! - counters named `"<kind>/<measure>"` labelled with the component id
//!
//! Reporters record into the tracer and meter of their [`TelemetrySettings`]
//! and never touch the data path: errors are observed, not changed.
//!
//! [`TelemetrySettings`]: crate::telemetry::TelemetrySettings

pub mod exporter;
pub mod names;
pub mod processor;
pub mod receiver;
pub mod scraper;
pub mod testing;

pub use exporter::{ExporterSettings, ObsExporter};
pub use processor::{ObsProcessor, ProcessorSettings};
pub use receiver::{ObsReceiver, ReceiverSettings};
pub use scraper::{ObsScraper, ScraperSettings};

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::Span;

/// The kind of telemetry data a batch holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Traces,
    Metrics,
    Logs,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Traces => "traces",
            Signal::Metrics => "metrics",
            Signal::Logs => "logs",
        }
    }

    pub(crate) fn accepted_key(&self) -> &'static str {
        match self {
            Signal::Traces => names::ACCEPTED_SPANS_KEY,
            Signal::Metrics => names::ACCEPTED_METRIC_POINTS_KEY,
            Signal::Logs => names::ACCEPTED_LOG_RECORDS_KEY,
        }
    }

    pub(crate) fn refused_key(&self) -> &'static str {
        match self {
            Signal::Traces => names::REFUSED_SPANS_KEY,
            Signal::Metrics => names::REFUSED_METRIC_POINTS_KEY,
            Signal::Logs => names::REFUSED_LOG_RECORDS_KEY,
        }
    }

    pub(crate) fn dropped_key(&self) -> &'static str {
        match self {
            Signal::Traces => names::DROPPED_SPANS_KEY,
            Signal::Metrics => names::DROPPED_METRIC_POINTS_KEY,
            Signal::Logs => names::DROPPED_LOG_RECORDS_KEY,
        }
    }

    pub(crate) fn sent_key(&self) -> &'static str {
        match self {
            Signal::Traces => names::SENT_SPANS_KEY,
            Signal::Metrics => names::SENT_METRIC_POINTS_KEY,
            Signal::Logs => names::SENT_LOG_RECORDS_KEY,
        }
    }

    pub(crate) fn send_failed_key(&self) -> &'static str {
        match self {
            Signal::Traces => names::FAILED_TO_SEND_SPANS_KEY,
            Signal::Metrics => names::FAILED_TO_SEND_METRIC_POINTS_KEY,
            Signal::Logs => names::FAILED_TO_SEND_LOG_RECORDS_KEY,
        }
    }

    pub(crate) fn enqueue_failed_key(&self) -> &'static str {
        match self {
            Signal::Traces => names::FAILED_TO_ENQUEUE_SPANS_KEY,
            Signal::Metrics => names::FAILED_TO_ENQUEUE_METRIC_POINTS_KEY,
            Signal::Logs => names::FAILED_TO_ENQUEUE_LOG_RECORDS_KEY,
        }
    }

    pub(crate) fn receive_operation(&self) -> &'static str {
        match self {
            Signal::Traces => names::RECEIVE_TRACE_DATA_OPERATION,
            Signal::Metrics => names::RECEIVE_METRICS_OPERATION,
            Signal::Logs => names::RECEIVE_LOGS_OPERATION,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error an operation ended with, as seen by a reporter.
pub trait ReportableError: fmt::Display {
    /// Number of items that failed when only part of a batch did.
    /// `None` means the whole batch failed.
    fn failed_items(&self) -> Option<usize> {
        None
    }
}

/// Splits `num_items` into (succeeded, failed) for the outcome `err`.
pub fn split_items(num_items: usize, err: Option<&dyn ReportableError>) -> (usize, usize) {
    match err {
        None => (num_items, 0),
        Some(err) => match err.failed_items() {
            Some(failed) => {
                let failed = failed.min(num_items);
                (num_items - failed, failed)
            }
            None => (0, num_items),
        },
    }
}

/// Marks `span` as failed with the error's message; success leaves the
/// status unset.
pub(crate) fn record_status(span: &Span, err: Option<&dyn ReportableError>) {
    if let Some(err) = err {
        let message = err.to_string();
        span.record("otel.status_code", "ERROR");
        span.record("otel.status_message", message.as_str());
    }
}
