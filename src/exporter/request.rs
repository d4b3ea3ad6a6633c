use crate::context::Context;
use crate::exporter::error::{ExportError, ExportResult};
use async_trait::async_trait;

/// One batch of outbound work.
///
/// A request is exported once per attempt. When an attempt fails,
/// [`on_error`](Request::on_error) may shrink it to the items that still
/// need delivering before the next attempt.
#[async_trait]
pub trait Request: Send + Sync + 'static {
    /// The context the request was submitted with.
    fn context(&self) -> &Context;

    fn set_context(&mut self, ctx: Context);

    /// Delivers the request to the backend, bounded by `ctx`.
    async fn export(&self, ctx: &Context) -> ExportResult<()>;

    /// The request to retry after `err`: a reduced request holding only the
    /// items that were not delivered, or `self` unchanged.
    fn on_error(self: Box<Self>, err: &ExportError) -> Box<dyn Request>;

    /// Number of spans, metric points or log records in the request.
    fn count(&self) -> usize;
}

/// A node of the sender chain. Each node wraps the next one.
#[async_trait]
pub trait RequestSender: Send + Sync {
    async fn send(&self, req: &mut dyn Request) -> ExportResult<()>;
}
