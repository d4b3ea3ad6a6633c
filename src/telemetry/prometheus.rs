//! Prometheus exporter for the pipeline's own counters
//!
//! Exposes obsreport counters via HTTP for Prometheus scraping, or just
//! renders them for callers that serve their own endpoint.

use crate::obsreport::names;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Global prometheus handle
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

static METRICS_DESCRIBED: AtomicBool = AtomicBool::new(false);

/// Metrics server configuration
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics server; `None` only renders on demand.
    pub listen_addr: Option<SocketAddr>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: Some(SocketAddr::from(([0, 0, 0, 0], 8888))),
        }
    }
}

impl MetricsConfig {
    /// Create a new config with custom address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: Some(addr),
        }
    }

    /// Install the recorder without an HTTP listener.
    pub fn render_only() -> Self {
        Self { listen_addr: None }
    }
}

/// Describe every obsreport counter (call once the recorder is installed)
pub fn describe_metrics() {
    if METRICS_DESCRIBED.swap(true, Ordering::SeqCst) {
        return; // Already described
    }

    for (kind, key, help) in names::COUNTER_DESCRIPTIONS {
        describe_counter!(names::metric_name(kind, key), *help);
    }
    describe_gauge!(
        names::metric_name(names::EXPORTER_PREFIX, names::QUEUE_SIZE_KEY),
        "Current number of requests waiting in the sending queue"
    );
}

/// Install the Prometheus recorder as the process-wide `metrics` recorder.
///
/// With a listen address this must run inside a tokio runtime: the HTTP
/// listener is spawned on it. Subsequent calls return the existing handle.
pub fn start_metrics_server(
    config: MetricsConfig,
) -> Result<&'static PrometheusHandle, MetricsError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle);
    }

    let handle = match config.listen_addr {
        Some(addr) => {
            let (recorder, exporter) = PrometheusBuilder::new()
                .with_http_listener(addr)
                .build()
                .map_err(|e| MetricsError::SetupFailed(e.to_string()))?;
            let handle = recorder.handle();
            metrics::set_global_recorder(recorder)
                .map_err(|_| MetricsError::AlreadyInitialized)?;

            tokio::spawn(async move {
                if let Err(e) = exporter.await {
                    tracing::error!(error = ?e, "prometheus exporter stopped");
                }
            });
            tracing::info!(%addr, "prometheus metrics endpoint listening");
            handle
        }
        None => PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| MetricsError::SetupFailed(e.to_string()))?,
    };

    describe_metrics();

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle))
}

/// Render metrics as a string (for custom endpoints)
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Errors that can occur during metrics setup
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to setup metrics: {0}")]
    SetupFailed(String),

    #[error("Metrics already initialized")]
    AlreadyInitialized,
}
