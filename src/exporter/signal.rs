use crate::component::{ComponentResult, Host, LifecycleState};
use crate::context::Context;
use crate::exporter::base::BaseExporter;
use crate::exporter::error::{ExportError, ExportResult};
use crate::exporter::request::{Request, RequestSender};
use crate::exporter::settings::ExporterOptions;
use crate::obsreport::{ExporterSettings, ObsExporter, ReportableError, Signal};
use async_trait::async_trait;
use std::sync::Arc;

/// A batch of traces, metrics or logs.
pub trait SignalData: Clone + Send + Sync + 'static {
    const SIGNAL: Signal;

    /// Spans, metric points or log records in the batch.
    fn item_count(&self) -> usize;
}

/// Delivers one batch to a backend.
///
/// A pusher that delivered only part of a batch returns
/// [`ExportError::partial_with_retry_data`] with the undelivered subset, so
/// the retry resends just that subset.
#[async_trait]
pub trait Pusher<T: SignalData>: Send + Sync + 'static {
    async fn push(&self, ctx: &Context, data: &T) -> ExportResult<()>;
}

struct PushRequest<T: SignalData> {
    ctx: Context,
    data: T,
    pusher: Arc<dyn Pusher<T>>,
}

#[async_trait]
impl<T: SignalData> Request for PushRequest<T> {
    fn context(&self) -> &Context {
        &self.ctx
    }

    fn set_context(&mut self, ctx: Context) {
        self.ctx = ctx;
    }

    async fn export(&self, ctx: &Context) -> ExportResult<()> {
        self.pusher.push(ctx, &self.data).await
    }

    fn on_error(self: Box<Self>, err: &ExportError) -> Box<dyn Request> {
        match err.retry_data::<T>() {
            Some(remaining) => Box::new(PushRequest {
                ctx: self.ctx,
                data: remaining.clone(),
                pusher: self.pusher,
            }),
            None => self,
        }
    }

    fn count(&self) -> usize {
        self.data.item_count()
    }
}

/// Wraps every attempt in an `exporter/<id>/<signal>` span and counts what
/// was sent or failed.
struct ObsSender {
    obs: ObsExporter,
    signal: Signal,
    next: Arc<dyn RequestSender>,
}

#[async_trait]
impl RequestSender for ObsSender {
    async fn send(&self, req: &mut dyn Request) -> ExportResult<()> {
        let parent = req.context().clone();
        let ctx = self.obs.start_op(&parent, self.signal);

        req.set_context(ctx.clone());
        let result = self.next.send(req).await;
        // Each attempt gets its own span under the submitting context
        req.set_context(parent);

        self.obs.end_op(
            ctx,
            self.signal,
            req.count(),
            result.as_ref().err().map(|e| e as &dyn ReportableError),
        );
        result
    }
}

/// An exporter for one signal, built from a [`Pusher`].
pub struct SignalExporter<T: SignalData> {
    base: BaseExporter,
    obs: ObsExporter,
    pusher: Arc<dyn Pusher<T>>,
}

impl<T: SignalData> SignalExporter<T> {
    pub fn new(
        settings: ExporterSettings,
        options: ExporterOptions,
        pusher: impl Pusher<T>,
    ) -> ComponentResult<Self> {
        let obs = ObsExporter::new(settings.clone());
        let wrapper_obs = obs.clone();
        let base = BaseExporter::with_consumer_wrapper(settings, options, move |next| {
            let instrumented: Arc<dyn RequestSender> = Arc::new(ObsSender {
                obs: wrapper_obs,
                signal: T::SIGNAL,
                next,
            });
            instrumented
        })?;

        Ok(Self {
            base,
            obs,
            pusher: Arc::new(pusher),
        })
    }

    pub async fn start(&self, ctx: &Context, host: Arc<dyn Host>) -> ComponentResult<()> {
        self.base.start(ctx, host).await
    }

    pub async fn shutdown(&self, ctx: &Context) -> ComponentResult<()> {
        self.base.shutdown(ctx).await
    }

    pub fn state(&self) -> LifecycleState {
        self.base.state()
    }

    pub fn queue_size(&self) -> usize {
        self.base.queue_size()
    }

    /// Exports `data`, or queues it when the sending queue is enabled.
    pub async fn consume(&self, ctx: &Context, data: T) -> ExportResult<()> {
        let count = data.item_count();
        let req = Box::new(PushRequest {
            ctx: ctx.clone(),
            data,
            pusher: Arc::clone(&self.pusher),
        });

        let result = self.base.send(req).await;
        if let Err(ExportError::QueueFull) = &result {
            self.obs.record_enqueue_failure(T::SIGNAL, count);
        }
        result
    }
}
