use crate::context::Context;
use crate::exporter::error::ExportResult;
use crate::exporter::request::{Request, RequestSender};
use crate::exporter::settings::TimeoutSettings;
use async_trait::async_trait;
use std::time::Duration;

/// Bounds every export attempt by a deadline derived from the request's context.
#[derive(Debug, Clone)]
pub struct TimeoutSender {
    timeout: Duration,
}

impl TimeoutSender {
    pub fn new(settings: &TimeoutSettings) -> Self {
        Self {
            timeout: settings.timeout,
        }
    }
}

/// Runs the export until it finishes or `ctx` is done, whichever comes first.
async fn export_until_done(req: &dyn Request, ctx: &Context) -> ExportResult<()> {
    tokio::select! {
        biased;
        result = req.export(ctx) => result,
        reason = ctx.done() => Err(reason.into()),
    }
}

#[async_trait]
impl RequestSender for TimeoutSender {
    async fn send(&self, req: &mut dyn Request) -> ExportResult<()> {
        let req = &*req;
        if self.timeout.is_zero() {
            return export_until_done(req, req.context()).await;
        }

        // Released when this attempt returns, whatever the outcome
        let attempt_ctx = req.context().with_timeout(self.timeout);
        export_until_done(req, &attempt_ctx).await
    }
}
