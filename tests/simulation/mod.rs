//! In-process backend simulation for testing exporters without a network client

pub mod flaky_backend;

pub use flaky_backend::{FlakyBackend, FlakyBackendConfig, MetricBatch, SpanBatch};

#[allow(unused_imports)]
pub use flaky_backend::BackendStats;
