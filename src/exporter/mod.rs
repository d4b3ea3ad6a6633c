//! Exporter helpers
//!
//! Every outbound batch becomes a [`Request`] that travels down a chain of
//! [`RequestSender`]s owned by a [`BaseExporter`]:
//!
//! ```text
//! send -> QueuedRetrySender -> [consumer wrapper] -> TimeoutSender -> Request::export
//! ```
//!
//! [`SignalExporter`] builds that chain for one signal from a [`Pusher`] and
//! instruments every attempt through obsreport.

pub mod base;
pub mod error;
pub mod queued_retry;
pub mod request;
pub mod settings;
pub mod signal;
pub mod timeout;

pub use base::BaseExporter;
pub use error::{BoxError, ExportError, ExportResult, RetryData};
pub use queued_retry::QueuedRetrySender;
pub use request::{Request, RequestSender};
pub use settings::{ExporterOptions, QueueSettings, RetrySettings, TimeoutSettings};
pub use signal::{Pusher, SignalData, SignalExporter};
pub use timeout::TimeoutSender;
