use crate::component::{
    ComponentResult, Host, LifecycleEvent, LifecycleState, LifecycleStateMachine, ShutdownFn,
    StartFn,
};
use crate::context::Context;
use crate::exporter::error::{ExportError, ExportResult};
use crate::exporter::queued_retry::QueuedRetrySender;
use crate::exporter::request::{Request, RequestSender};
use crate::exporter::settings::ExporterOptions;
use crate::exporter::timeout::TimeoutSender;
use crate::obsreport::{ExporterSettings, ObsExporter};
use std::sync::Arc;

/// Owns an exporter's sender chain and drives its lifecycle.
///
/// The chain is, outermost first: the queued-retry sender, an optional
/// consumer wrapper (instrumentation), the timeout sender, and finally the
/// request's own `export`.
pub struct BaseExporter {
    obs: ObsExporter,
    lifecycle: LifecycleStateMachine,
    queued_retry: QueuedRetrySender,
    start: Option<StartFn>,
    shutdown: Option<ShutdownFn>,
}

impl BaseExporter {
    pub fn new(settings: ExporterSettings, options: ExporterOptions) -> ComponentResult<Self> {
        Self::with_consumer_wrapper(settings, options, |next| next)
    }

    /// Like [`new`](Self::new), wrapping the sender that queue consumers
    /// call on every attempt.
    pub fn with_consumer_wrapper<W>(
        settings: ExporterSettings,
        options: ExporterOptions,
        wrap: W,
    ) -> ComponentResult<Self>
    where
        W: FnOnce(Arc<dyn RequestSender>) -> Arc<dyn RequestSender>,
    {
        options.validate()?;

        let obs = ObsExporter::new(settings);
        let timeout: Arc<dyn RequestSender> = Arc::new(TimeoutSender::new(&options.timeout));
        let queued_retry =
            QueuedRetrySender::new(&options.queue, options.retry, wrap(timeout), obs.clone());

        Ok(Self {
            obs,
            lifecycle: LifecycleStateMachine::new(),
            queued_retry,
            start: options.start,
            shutdown: options.shutdown,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.current_state()
    }

    pub fn obs(&self) -> &ObsExporter {
        &self.obs
    }

    /// Requests waiting in the sending queue.
    pub fn queue_size(&self) -> usize {
        self.queued_retry.queue_size()
    }

    /// Runs the start hook, then starts the sending queue.
    pub async fn start(&self, ctx: &Context, host: Arc<dyn Host>) -> ComponentResult<()> {
        self.lifecycle.transition(LifecycleEvent::Start)?;

        if let Some(start) = &self.start {
            if let Err(e) = start(ctx.clone(), host).await {
                self.lifecycle.transition(LifecycleEvent::StartFailed)?;
                return Err(e);
            }
        }
        if let Err(e) = self.queued_retry.start() {
            self.lifecycle.transition(LifecycleEvent::StartFailed)?;
            return Err(e);
        }

        self.lifecycle.transition(LifecycleEvent::Started)?;
        tracing::info!(exporter = %self.obs.exporter_id(), "exporter started");
        Ok(())
    }

    /// Drains the sending queue, then runs the shutdown hook.
    ///
    /// Calling it again is a no-op.
    pub async fn shutdown(&self, ctx: &Context) -> ComponentResult<()> {
        match self.lifecycle.transition(LifecycleEvent::Shutdown) {
            Ok(_) => {}
            Err(_) if matches!(self.state(), LifecycleState::Stopping | LifecycleState::Stopped) => {
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        self.queued_retry.shutdown(ctx).await;

        let result = match &self.shutdown {
            Some(shutdown) => shutdown(ctx.clone()).await,
            None => Ok(()),
        };

        self.lifecycle.transition(LifecycleEvent::Stopped)?;
        tracing::info!(exporter = %self.obs.exporter_id(), "exporter stopped");
        result
    }

    /// Hands `req` to the sender chain.
    pub async fn send(&self, req: Box<dyn Request>) -> ExportResult<()> {
        if !self.state().accepts_data() {
            return Err(ExportError::NotRunning);
        }
        self.queued_retry.send(req).await
    }
}
