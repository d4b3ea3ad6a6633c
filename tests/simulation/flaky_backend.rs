//! Simulated telemetry backend for in-process testing
//!
//! Fails pushes transiently, permanently or partially according to a config,
//! with optional latency, so the whole exporter chain can be exercised
//! without a real network client.

#![allow(dead_code)]

use async_trait::async_trait;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use telemetry_relay::{Context, ExportError, ExportResult, Pusher, Signal, SignalData};
use tokio::time::sleep;

/// A batch of span ids.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanBatch(pub Vec<u64>);

impl SpanBatch {
    pub fn with_len(len: usize) -> Self {
        Self((0..len as u64).collect())
    }
}

impl SignalData for SpanBatch {
    const SIGNAL: Signal = Signal::Traces;

    fn item_count(&self) -> usize {
        self.0.len()
    }
}

/// A batch of metric point values.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricBatch(pub Vec<f64>);

impl SignalData for MetricBatch {
    const SIGNAL: Signal = Signal::Metrics;

    fn item_count(&self) -> usize {
        self.0.len()
    }
}

/// Configuration for the flaky backend
#[derive(Debug, Clone, Default)]
pub struct FlakyBackendConfig {
    /// The first `fail_first` pushes fail transiently
    pub fail_first: u64,
    /// Chance of a transient failure after that (0.0 - 1.0)
    pub failure_rate: f32,
    /// Chance that half of a batch is rejected (0.0 - 1.0)
    pub partial_rate: f32,
    /// Every push fails with a permanent error
    pub reject_all: bool,
    /// Base latency in milliseconds
    pub latency_ms: u64,
    /// Jitter (variance in latency) in milliseconds
    pub jitter_ms: u64,
}

impl FlakyBackendConfig {
    /// A backend that never fails
    pub fn healthy() -> Self {
        Self::default()
    }

    /// Fails the first `n` pushes, then recovers
    pub fn recovering_after(n: u64) -> Self {
        Self {
            fail_first: n,
            ..Default::default()
        }
    }

    /// Fails transiently at the given rate
    pub fn with_failure_rate(failure_rate: f32) -> Self {
        Self {
            failure_rate,
            ..Default::default()
        }
    }

    pub fn down() -> Self {
        Self {
            failure_rate: 1.0,
            ..Default::default()
        }
    }

    pub fn slow(latency_ms: u64) -> Self {
        Self {
            latency_ms,
            ..Default::default()
        }
    }
}

/// Statistics collected by the flaky backend
#[derive(Debug, Default)]
pub struct BackendStats {
    pub pushes: AtomicU64,
    pub failures: AtomicU64,
    pub partials: AtomicU64,
    pub items_delivered: AtomicU64,
}

impl BackendStats {
    pub fn pushes(&self) -> u64 {
        self.pushes.load(Ordering::Relaxed)
    }

    pub fn items_delivered(&self) -> u64 {
        self.items_delivered.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> String {
        format!(
            "Pushes: {}, Failures: {}, Partial: {}, Items delivered: {}",
            self.pushes(),
            self.failures.load(Ordering::Relaxed),
            self.partials.load(Ordering::Relaxed),
            self.items_delivered()
        )
    }
}

/// A simulated backend; clones share their statistics
#[derive(Clone)]
pub struct FlakyBackend {
    config: FlakyBackendConfig,
    stats: Arc<BackendStats>,
}

impl FlakyBackend {
    pub fn new(config: FlakyBackendConfig) -> Self {
        Self {
            config,
            stats: Arc::new(BackendStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<BackendStats> {
        self.stats.clone()
    }

    async fn deliver(&self, items: usize) -> Result<Option<usize>, ExportError> {
        let push = self.stats.pushes.fetch_add(1, Ordering::Relaxed) + 1;

        let (latency, transient, partial) = {
            let mut rng = rand::thread_rng();
            let jitter = if self.config.jitter_ms > 0 {
                rng.gen_range(0..self.config.jitter_ms)
            } else {
                0
            };
            (
                self.config.latency_ms + jitter,
                rng.gen::<f32>() < self.config.failure_rate,
                rng.gen::<f32>() < self.config.partial_rate,
            )
        };

        if latency > 0 {
            sleep(Duration::from_millis(latency)).await;
        }

        if self.config.reject_all {
            self.stats.failures.fetch_add(1, Ordering::Relaxed);
            return Err(ExportError::permanent("backend rejected the batch"));
        }
        if push <= self.config.fail_first || transient {
            self.stats.failures.fetch_add(1, Ordering::Relaxed);
            return Err(ExportError::transport("backend unavailable"));
        }
        if partial && items > 1 {
            self.stats.partials.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(items / 2));
        }
        Ok(None)
    }
}

#[async_trait]
impl Pusher<SpanBatch> for FlakyBackend {
    async fn push(&self, _ctx: &Context, data: &SpanBatch) -> ExportResult<()> {
        match self.deliver(data.0.len()).await? {
            None => {
                self.stats
                    .items_delivered
                    .fetch_add(data.0.len() as u64, Ordering::Relaxed);
                Ok(())
            }
            Some(accepted) => {
                self.stats
                    .items_delivered
                    .fetch_add(accepted as u64, Ordering::Relaxed);
                let rejected = SpanBatch(data.0[accepted..].to_vec());
                Err(ExportError::partial_with_retry_data(
                    ExportError::transport("backend rejected part of the batch"),
                    rejected.0.len(),
                    rejected,
                ))
            }
        }
    }
}

#[async_trait]
impl Pusher<MetricBatch> for FlakyBackend {
    async fn push(&self, _ctx: &Context, data: &MetricBatch) -> ExportResult<()> {
        match self.deliver(data.0.len()).await? {
            None => {
                self.stats
                    .items_delivered
                    .fetch_add(data.0.len() as u64, Ordering::Relaxed);
                Ok(())
            }
            Some(accepted) => {
                self.stats
                    .items_delivered
                    .fetch_add(accepted as u64, Ordering::Relaxed);
                let rejected = MetricBatch(data.0[accepted..].to_vec());
                Err(ExportError::partial_with_retry_data(
                    ExportError::transport("backend rejected part of the batch"),
                    rejected.0.len(),
                    rejected,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_healthy_backend() {
        let backend = FlakyBackend::new(FlakyBackendConfig::healthy());
        backend
            .push(&Context::background(), &SpanBatch::with_len(5))
            .await
            .unwrap();

        let stats = backend.stats();
        assert_eq!(stats.pushes(), 1);
        assert_eq!(stats.items_delivered(), 5);
    }

    #[tokio::test]
    async fn test_recovering_backend() {
        let backend = FlakyBackend::new(FlakyBackendConfig::recovering_after(2));
        let batch = SpanBatch::with_len(3);

        assert!(backend.push(&Context::background(), &batch).await.is_err());
        assert!(backend.push(&Context::background(), &batch).await.is_err());
        assert!(backend.push(&Context::background(), &batch).await.is_ok());
    }

    #[tokio::test]
    async fn test_partial_rejection_returns_remaining_items() {
        let backend = FlakyBackend::new(FlakyBackendConfig {
            partial_rate: 1.0,
            ..Default::default()
        });

        let err = backend
            .push(&Context::background(), &SpanBatch(vec![1, 2, 3, 4]))
            .await
            .unwrap_err();
        assert_eq!(err.retry_data::<SpanBatch>(), Some(&SpanBatch(vec![3, 4])));
        assert_eq!(backend.stats().items_delivered(), 2);
    }
}
