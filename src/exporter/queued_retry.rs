use crate::component::{ComponentError, ComponentId, ComponentResult};
use crate::context::Context;
use crate::exporter::error::{ExportError, ExportResult};
use crate::exporter::request::{Request, RequestSender};
use crate::exporter::settings::{QueueSettings, RetrySettings};
use crate::obsreport::ObsExporter;
use crate::queue::{BoundedQueue, QueueError};
use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Runs one request through `next` until it succeeds or the retry policy
/// gives up.
pub(crate) struct RetrySender {
    exporter_id: ComponentId,
    settings: RetrySettings,
    next: Arc<dyn RequestSender>,
    /// Cancelled on shutdown to cut backoff waits short
    stop: CancellationToken,
}

impl RetrySender {
    fn new_backoff(&self) -> ExponentialBackoff {
        // The elapsed budget is enforced on the tokio clock below
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.settings.initial_interval)
            .with_max_interval(self.settings.max_interval)
            .with_multiplier(self.settings.multiplier)
            .with_randomization_factor(self.settings.randomization_factor)
            .with_max_elapsed_time(None)
            .build()
    }

    pub(crate) async fn send(&self, mut req: Box<dyn Request>) -> ExportResult<()> {
        let mut backoff = self.new_backoff();
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let err = match self.next.send(req.as_mut()).await {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };

            if !self.settings.enabled {
                tracing::warn!(
                    exporter = %self.exporter_id,
                    error = %err,
                    dropped_items = req.count(),
                    "Exporting failed. Retry disabled, dropping data"
                );
                return Err(err);
            }

            if err.is_permanent() {
                tracing::error!(
                    exporter = %self.exporter_id,
                    error = %err,
                    dropped_items = req.count(),
                    "Exporting failed. The error is not retryable, dropping data"
                );
                return Err(err);
            }

            // Only what is still unsent counts from here on
            req = req.on_error(&err);

            if self.settings.max_attempts > 0 && attempts >= self.settings.max_attempts {
                tracing::error!(
                    exporter = %self.exporter_id,
                    error = %err,
                    attempts,
                    dropped_items = req.count(),
                    "Exporting failed. No more retries left, dropping data"
                );
                return Err(ExportError::MaxAttempts {
                    attempts,
                    source: Box::new(err),
                });
            }

            let mut delay = match backoff.next_backoff() {
                Some(delay) => delay,
                None => return Err(self.elapsed_budget_exhausted(req.as_ref(), err)),
            };
            if let Some(throttle) = err.throttle_delay() {
                delay = delay.max(throttle);
            }
            if let Some(max_elapsed) = self.settings.max_elapsed() {
                if started.elapsed() + delay > max_elapsed {
                    return Err(self.elapsed_budget_exhausted(req.as_ref(), err));
                }
            }

            tracing::info!(
                exporter = %self.exporter_id,
                error = %err,
                interval = ?delay,
                attempt = attempts,
                "Exporting failed. Will retry the request after interval"
            );

            tokio::select! {
                biased;
                _ = req.context().done() => {
                    return Err(ExportError::RequestCancelled { source: Box::new(err) });
                }
                () = self.stop.cancelled() => {
                    tracing::warn!(
                        exporter = %self.exporter_id,
                        dropped_items = req.count(),
                        "Retry interrupted by shutdown, dropping data"
                    );
                    return Err(ExportError::Shutdown { source: Box::new(err) });
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn elapsed_budget_exhausted(&self, req: &dyn Request, err: ExportError) -> ExportError {
        tracing::error!(
            exporter = %self.exporter_id,
            error = %err,
            dropped_items = req.count(),
            "Exporting failed. Max elapsed time expired, dropping data"
        );
        ExportError::MaxElapsedTime {
            source: Box::new(err),
        }
    }
}

/// Head of the sender chain: an optional bounded queue in front of the
/// retry loop.
///
/// With the queue disabled, [`send`](Self::send) runs the retry loop inline
/// and returns its outcome. With it enabled, `send` only enqueues; consumer
/// tasks started by [`start`](Self::start) run the retry loop.
pub struct QueuedRetrySender {
    exporter_id: ComponentId,
    num_consumers: usize,
    queue: Option<Arc<BoundedQueue<Box<dyn Request>>>>,
    retry: Arc<RetrySender>,
    stop: CancellationToken,
    obs: ObsExporter,
}

impl QueuedRetrySender {
    /// `next` is what consumers send each attempt to.
    pub fn new(
        queue_settings: &QueueSettings,
        retry_settings: RetrySettings,
        next: Arc<dyn RequestSender>,
        obs: ObsExporter,
    ) -> Self {
        let exporter_id = obs.exporter_id().clone();
        let stop = CancellationToken::new();
        let queue = queue_settings
            .enabled
            .then(|| Arc::new(BoundedQueue::new(queue_settings.queue_size)));

        Self {
            retry: Arc::new(RetrySender {
                exporter_id: exporter_id.clone(),
                settings: retry_settings,
                next,
                stop: stop.clone(),
            }),
            exporter_id,
            num_consumers: queue_settings.num_consumers,
            queue,
            stop,
            obs,
        }
    }

    /// Requests waiting in the queue.
    pub fn queue_size(&self) -> usize {
        self.queue.as_ref().map_or(0, |q| q.size())
    }

    /// Starts the queue consumers.
    pub fn start(&self) -> ComponentResult<()> {
        let Some(queue) = &self.queue else {
            return Ok(());
        };

        let retry = Arc::clone(&self.retry);
        let obs = self.obs.clone();
        let depth = Arc::clone(queue);
        queue
            .start_consumers(self.num_consumers, move |req: Box<dyn Request>| {
                let retry = Arc::clone(&retry);
                obs.record_queue_size(depth.size());
                async move {
                    // Failures were logged by the retry loop
                    let _ = retry.send(req).await;
                }
            })
            .map_err(|e| ComponentError::StartFailed(e.to_string()))?;

        tracing::info!(
            exporter = %self.exporter_id,
            num_consumers = self.num_consumers,
            queue_size = queue.capacity(),
            "sending queue started"
        );
        Ok(())
    }

    pub async fn send(&self, mut req: Box<dyn Request>) -> ExportResult<()> {
        let Some(queue) = &self.queue else {
            return self.retry.send(req).await;
        };

        // The caller returns as soon as the request is queued
        let detached = req.context().detached();
        req.set_context(detached);

        let count = req.count();
        match queue.produce(req) {
            Ok(()) => {
                self.obs.record_queue_size(queue.size());
                Ok(())
            }
            Err(QueueError::QueueFull(capacity)) => {
                tracing::warn!(
                    exporter = %self.exporter_id,
                    dropped_items = count,
                    capacity,
                    "Dropping data because sending_queue is full. Try increasing queue_size"
                );
                Err(ExportError::QueueFull)
            }
            Err(_) => Err(ExportError::NotRunning),
        }
    }

    /// Interrupts pending retries, then drains the queue.
    ///
    /// Consumers get until `ctx`'s deadline to finish; whatever is still
    /// queued after that is dropped.
    pub async fn shutdown(&self, ctx: &Context) {
        self.stop.cancel();

        let Some(queue) = &self.queue else {
            return;
        };

        let report = queue.stop(ctx.remaining()).await;
        if report.panicked_consumers > 0 {
            tracing::error!(
                exporter = %self.exporter_id,
                panicked_consumers = report.panicked_consumers,
                "queue consumers panicked before shutdown"
            );
        }
        if report.aborted_consumers > 0 {
            tracing::warn!(
                exporter = %self.exporter_id,
                aborted_consumers = report.aborted_consumers,
                "shutdown deadline reached before the queue drained"
            );
        }

        let dropped = queue.drain();
        if !dropped.is_empty() {
            let dropped_items: usize = dropped.iter().map(|r| r.count()).sum();
            tracing::error!(
                exporter = %self.exporter_id,
                dropped_requests = dropped.len(),
                dropped_items,
                "Dropping queued data on shutdown"
            );
        }
        self.obs.record_queue_size(0);
    }
}
