use crate::component::error::{ComponentError, ComponentResult};
use crate::context::Context;
use futures::future::BoxFuture;
use std::sync::Arc;

/// The runtime a component is started in.
pub trait Host: Send + Sync {
    /// Called by a component that hit an error it cannot recover from after
    /// start returned.
    fn report_fatal_error(&self, err: ComponentError);
}

/// A host that ignores everything reported to it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopHost;

impl Host for NopHost {
    fn report_fatal_error(&self, err: ComponentError) {
        tracing::error!(error = %err, "fatal component error reported to nop host");
    }
}

/// Hook run when a component starts.
pub type StartFn =
    Arc<dyn Fn(Context, Arc<dyn Host>) -> BoxFuture<'static, ComponentResult<()>> + Send + Sync>;

/// Hook run when a component shuts down.
pub type ShutdownFn = Arc<dyn Fn(Context) -> BoxFuture<'static, ComponentResult<()>> + Send + Sync>;
