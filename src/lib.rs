//! telemetry_relay: the reliability layer of a telemetry pipeline
//!
//! Batches of traces, metrics and logs are handed to an exporter whose
//! sender chain bounds each attempt with a timeout, queues and retries with
//! exponential backoff, and reports every operation through obsreport.

pub mod component;
pub mod context;
pub mod exporter;
pub mod obsreport;
pub mod queue;
pub mod receiver;
pub mod telemetry;

pub use component::{ComponentId, Host, NopHost};
pub use context::Context;
pub use exporter::{
    BaseExporter, ExportError, ExportResult, ExporterOptions, Pusher, QueueSettings, Request,
    RequestSender, RetrySettings, SignalData, SignalExporter, TimeoutSettings,
};
pub use obsreport::Signal;
pub use telemetry::{MetricsLevel, TelemetrySettings};
