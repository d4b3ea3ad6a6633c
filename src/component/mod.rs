//! Component identity and lifecycle
//!
//! Every receiver, scraper, processor and exporter is identified by a
//! [`ComponentId`] and moves through the same start/shutdown lifecycle.

pub mod error;
pub mod host;
pub mod id;
pub mod lifecycle;

pub use error::{ComponentError, ComponentResult, ConfigError, ConfigResult};
pub use host::{Host, NopHost, ShutdownFn, StartFn};
pub use id::ComponentId;
pub use lifecycle::{LifecycleEvent, LifecycleState, LifecycleStateMachine};
