use crate::context::ContextError;
use crate::obsreport::ReportableError;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Data a partial failure hands back so the retry only resends the failed
/// part of the batch.
#[derive(Clone)]
pub struct RetryData(Arc<dyn Any + Send + Sync>);

impl RetryData {
    pub fn new<T: Any + Send + Sync>(data: T) -> Self {
        Self(Arc::new(data))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for RetryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RetryData(..)")
    }
}

/// Errors on the export data path.
///
/// Whether a failed request is retried depends only on
/// [`is_retryable`](ExportError::is_retryable): transports mark errors that
/// can never succeed with [`ExportError::permanent`].
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Permanent error: {0}")]
    Permanent(#[source] BoxError),

    /// A transport failure that may succeed if tried again.
    #[error("{0}")]
    Transport(#[source] BoxError),

    /// Only `failed` items of the batch were not delivered.
    #[error("{source}")]
    Partial {
        source: Box<ExportError>,
        failed: usize,
        retry_data: Option<RetryData>,
    },

    /// The backend asked to wait at least `delay` before the next attempt.
    #[error("{source}")]
    Throttled { source: Box<ExportError>, delay: Duration },

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("context canceled")]
    Cancelled,

    #[error("sending_queue is full")]
    QueueFull,

    #[error("exporter is not running")]
    NotRunning,

    #[error("max elapsed time expired {source}")]
    MaxElapsedTime { source: Box<ExportError> },

    #[error("max attempts ({attempts}) reached {source}")]
    MaxAttempts { attempts: u32, source: Box<ExportError> },

    #[error("request is cancelled or timed out {source}")]
    RequestCancelled { source: Box<ExportError> },

    #[error("interrupted due to shutdown {source}")]
    Shutdown { source: Box<ExportError> },
}

pub type ExportResult<T> = Result<T, ExportError>;

impl ExportError {
    /// An error retrying can never fix.
    pub fn permanent(err: impl Into<BoxError>) -> Self {
        ExportError::Permanent(err.into())
    }

    /// A transport error that is worth retrying.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        ExportError::Transport(err.into())
    }

    pub fn partial(source: ExportError, failed: usize) -> Self {
        ExportError::Partial {
            source: Box::new(source),
            failed,
            retry_data: None,
        }
    }

    /// A partial failure carrying the undelivered items for the retry.
    pub fn partial_with_retry_data<T: Any + Send + Sync>(source: ExportError, failed: usize, data: T) -> Self {
        ExportError::Partial {
            source: Box::new(source),
            failed,
            retry_data: Some(RetryData::new(data)),
        }
    }

    pub fn throttled(source: ExportError, delay: Duration) -> Self {
        ExportError::Throttled {
            source: Box::new(source),
            delay,
        }
    }

    pub fn is_permanent(&self) -> bool {
        match self {
            ExportError::Transport(_) | ExportError::DeadlineExceeded => false,
            ExportError::Partial { source, .. } | ExportError::Throttled { source, .. } => {
                source.is_permanent()
            }
            ExportError::Permanent(_)
            | ExportError::Cancelled
            | ExportError::QueueFull
            | ExportError::NotRunning
            | ExportError::MaxElapsedTime { .. }
            | ExportError::MaxAttempts { .. }
            | ExportError::RequestCancelled { .. }
            | ExportError::Shutdown { .. } => true,
        }
    }

    pub fn is_retryable(&self) -> bool {
        !self.is_permanent()
    }

    /// Minimum wait the backend asked for before the next attempt.
    pub fn throttle_delay(&self) -> Option<Duration> {
        match self {
            ExportError::Throttled { delay, .. } => Some(*delay),
            ExportError::Partial { source, .. } => source.throttle_delay(),
            _ => None,
        }
    }

    /// Retry data attached by a partial failure, if it holds a `T`.
    pub fn retry_data<T: Any>(&self) -> Option<&T> {
        match self {
            ExportError::Partial {
                retry_data: Some(data),
                ..
            } => data.downcast_ref::<T>(),
            ExportError::Throttled { source, .. } => source.retry_data::<T>(),
            _ => None,
        }
    }
}

impl From<ContextError> for ExportError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => ExportError::Cancelled,
            ContextError::DeadlineExceeded => ExportError::DeadlineExceeded,
        }
    }
}

impl ReportableError for ExportError {
    fn failed_items(&self) -> Option<usize> {
        match self {
            ExportError::Partial { failed, .. } => Some(*failed),
            ExportError::Throttled { source, .. }
            | ExportError::MaxElapsedTime { source }
            | ExportError::MaxAttempts { source, .. }
            | ExportError::RequestCancelled { source }
            | ExportError::Shutdown { source } => source.failed_items(),
            _ => None,
        }
    }
}
