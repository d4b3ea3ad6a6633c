//! End-to-end tests of the exporter sender chain against a simulated backend

#[path = "simulation/mod.rs"]
mod simulation;

use simulation::{FlakyBackend, FlakyBackendConfig, MetricBatch, SpanBatch};
use std::sync::Arc;
use std::time::Duration;
use telemetry_relay::component::{ComponentId, LifecycleState, NopHost};
use telemetry_relay::exporter::{
    ExportError, ExporterOptions, QueueSettings, RetrySettings, SignalExporter, TimeoutSettings,
};
use telemetry_relay::obsreport::testing::{SpanStatus, TestTelemetry};
use telemetry_relay::obsreport::ExporterSettings;
use telemetry_relay::Context;

fn fast_retry() -> RetrySettings {
    RetrySettings {
        initial_interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(80),
        max_elapsed_time: Duration::ZERO,
        randomization_factor: 0.0,
        multiplier: 2.0,
        ..RetrySettings::default_enabled()
    }
}

fn span_exporter(
    tt: &TestTelemetry,
    options: ExporterOptions,
    backend: FlakyBackend,
) -> SignalExporter<SpanBatch> {
    SignalExporter::new(
        ExporterSettings {
            exporter_id: ComponentId::new("flaky"),
            telemetry: tt.settings(),
        },
        options,
        backend,
    )
    .unwrap()
}

const LABELS: [(&str, &str); 1] = [("exporter", "flaky")];

#[tokio::test]
async fn test_sync_send_without_queue_or_retry() {
    let tt = TestTelemetry::new();
    let backend = FlakyBackend::new(FlakyBackendConfig::down());
    let stats = backend.stats();
    let exporter = span_exporter(&tt, ExporterOptions::new(), backend);

    let err = exporter
        .consume(&Context::background(), SpanBatch::with_len(7))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "backend unavailable");
    assert!(err.is_retryable());
    assert_eq!(stats.pushes(), 1);
    assert_eq!(tt.counter("exporter/send_failed_spans", &LABELS), 7);
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_transient_failures() {
    let tt = TestTelemetry::new();
    let backend = FlakyBackend::new(FlakyBackendConfig::recovering_after(3));
    let stats = backend.stats();
    let exporter = span_exporter(&tt, ExporterOptions::new().with_retry(fast_retry()), backend);

    exporter
        .consume(&Context::background(), SpanBatch::with_len(5))
        .await
        .unwrap();

    assert_eq!(stats.pushes(), 4);
    assert_eq!(stats.items_delivered(), 5);

    // Every attempt is observable
    let spans = tt.finished_spans_named("exporter/flaky/traces");
    assert_eq!(spans.len(), 4);
    assert!(spans[..3].iter().all(|s| matches!(s.status(), SpanStatus::Error(_))));
    assert_eq!(spans[3].status(), SpanStatus::Unset);
    assert_eq!(tt.counter("exporter/sent_spans", &LABELS), 5);
    assert_eq!(tt.counter("exporter/send_failed_spans", &LABELS), 15);
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_max_attempts() {
    let tt = TestTelemetry::new();
    let backend = FlakyBackend::new(FlakyBackendConfig::down());
    let stats = backend.stats();
    let retry = RetrySettings {
        max_attempts: 5,
        ..fast_retry()
    };
    let exporter = span_exporter(&tt, ExporterOptions::new().with_retry(retry), backend);

    let err = exporter
        .consume(&Context::background(), SpanBatch::with_len(2))
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::MaxAttempts { attempts: 5, .. }));
    assert_eq!(stats.pushes(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_max_elapsed_time() {
    let tt = TestTelemetry::new();
    let backend = FlakyBackend::new(FlakyBackendConfig::down());
    let stats = backend.stats();
    let retry = RetrySettings {
        max_elapsed_time: Duration::from_millis(500),
        ..fast_retry()
    };
    let exporter = span_exporter(&tt, ExporterOptions::new().with_retry(retry), backend);

    let started = tokio::time::Instant::now();
    let err = exporter
        .consume(&Context::background(), SpanBatch::with_len(2))
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::MaxElapsedTime { .. }));
    assert!(started.elapsed() <= Duration::from_millis(500));
    assert!(stats.pushes() > 2);
}

#[tokio::test(start_paused = true)]
async fn test_permanent_rejection_is_not_retried() {
    let tt = TestTelemetry::new();
    let backend = FlakyBackend::new(FlakyBackendConfig {
        reject_all: true,
        ..Default::default()
    });
    let stats = backend.stats();
    let exporter = span_exporter(&tt, ExporterOptions::new().with_retry(fast_retry()), backend);

    let err = exporter
        .consume(&Context::background(), SpanBatch::with_len(3))
        .await
        .unwrap_err();

    assert!(err.is_permanent());
    assert_eq!(stats.pushes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_each_attempt_gets_a_fresh_deadline() {
    let tt = TestTelemetry::new();
    let backend = FlakyBackend::new(FlakyBackendConfig::slow(200));
    let stats = backend.stats();
    let options = ExporterOptions::new()
        .with_timeout(TimeoutSettings::new(Duration::from_millis(50)))
        .with_retry(RetrySettings {
            max_attempts: 3,
            ..fast_retry()
        });
    let exporter = span_exporter(&tt, options, backend);

    let err = exporter
        .consume(&Context::background(), SpanBatch::with_len(1))
        .await
        .unwrap_err();

    match err {
        ExportError::MaxAttempts { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, ExportError::DeadlineExceeded));
        }
        other => panic!("unexpected error: {other}"),
    }
    // Every attempt reached the backend before timing out
    assert_eq!(stats.pushes(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_partial_failures_deliver_everything_once() {
    let tt = TestTelemetry::new();
    let backend = FlakyBackend::new(FlakyBackendConfig {
        partial_rate: 1.0,
        ..Default::default()
    });
    let stats = backend.stats();
    let exporter = SignalExporter::<MetricBatch>::new(
        ExporterSettings {
            exporter_id: ComponentId::new("flaky"),
            telemetry: tt.settings(),
        },
        ExporterOptions::new().with_retry(fast_retry()),
        backend,
    )
    .unwrap();

    exporter
        .consume(&Context::background(), MetricBatch(vec![1.0; 8]))
        .await
        .unwrap();

    // 8 -> 4 -> 2 -> 1: each retry resends only the rejected half
    assert_eq!(stats.pushes(), 4);
    assert_eq!(stats.items_delivered(), 8);
    assert_eq!(tt.counter("exporter/sent_metric_points", &LABELS), 8);
    assert_eq!(tt.counter("exporter/send_failed_metric_points", &LABELS), 7);
}

#[tokio::test]
async fn test_concurrent_producers_through_queue() {
    let tt = TestTelemetry::new();
    let backend = FlakyBackend::new(FlakyBackendConfig::healthy());
    let stats = backend.stats();
    let options = ExporterOptions::new()
        .with_queue(QueueSettings {
            enabled: true,
            num_consumers: 4,
            queue_size: 1000,
        })
        .with_retry(fast_retry());
    let exporter = Arc::new(span_exporter(&tt, options, backend));
    exporter.start(&Context::background(), Arc::new(NopHost)).await.unwrap();

    let mut producers = Vec::new();
    for _ in 0..8 {
        let exporter = exporter.clone();
        producers.push(tokio::spawn(async move {
            for _ in 0..25 {
                exporter
                    .consume(&Context::background(), SpanBatch::with_len(4))
                    .await
                    .unwrap();
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }

    exporter.shutdown(&Context::background()).await.unwrap();

    assert_eq!(stats.pushes(), 200);
    assert_eq!(stats.items_delivered(), 800);
    assert_eq!(tt.counter("exporter/sent_spans", &LABELS), 800);
    assert_eq!(exporter.queue_size(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_queued_requests_survive_flaky_backend() {
    let tt = TestTelemetry::new();
    let backend = FlakyBackend::new(FlakyBackendConfig {
        failure_rate: 0.3,
        partial_rate: 0.2,
        latency_ms: 5,
        jitter_ms: 5,
        ..Default::default()
    });
    let stats = backend.stats();
    let options = ExporterOptions::new()
        .with_queue(QueueSettings {
            enabled: true,
            num_consumers: 4,
            queue_size: 100,
        })
        .with_retry(fast_retry());
    let exporter = span_exporter(&tt, options, backend);
    exporter.start(&Context::background(), Arc::new(NopHost)).await.unwrap();

    for _ in 0..50 {
        exporter
            .consume(&Context::background(), SpanBatch::with_len(10))
            .await
            .unwrap();
    }

    tokio::time::timeout(Duration::from_secs(600), async {
        while stats.items_delivered() < 500 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("all items delivered");

    exporter.shutdown(&Context::background()).await.unwrap();
    assert_eq!(stats.items_delivered(), 500);
    assert_eq!(tt.counter("exporter/sent_spans", &LABELS), 500);
}

#[tokio::test]
async fn test_queue_full_is_reported_to_producer() {
    let tt = TestTelemetry::new();
    let options = ExporterOptions::new().with_queue(QueueSettings {
        enabled: true,
        num_consumers: 1,
        queue_size: 3,
    });
    let exporter = span_exporter(&tt, options, FlakyBackend::new(FlakyBackendConfig::healthy()));

    // Not started yet, so nothing drains the queue
    for _ in 0..3 {
        exporter
            .consume(&Context::background(), SpanBatch::with_len(1))
            .await
            .unwrap();
    }
    let err = exporter
        .consume(&Context::background(), SpanBatch::with_len(6))
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::QueueFull));
    assert_eq!(exporter.queue_size(), 3);
    assert_eq!(tt.counter("exporter/enqueue_failed_spans", &LABELS), 6);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_deadline_bounds_draining() {
    let tt = TestTelemetry::new();
    let backend = FlakyBackend::new(FlakyBackendConfig::slow(60_000));
    let options = ExporterOptions::new()
        .with_timeout(TimeoutSettings::new(Duration::ZERO))
        .with_queue(QueueSettings {
            enabled: true,
            num_consumers: 1,
            queue_size: 10,
        });
    let exporter = span_exporter(&tt, options, backend);
    exporter.start(&Context::background(), Arc::new(NopHost)).await.unwrap();

    for _ in 0..3 {
        exporter
            .consume(&Context::background(), SpanBatch::with_len(1))
            .await
            .unwrap();
    }
    tokio::time::sleep(Duration::from_millis(10)).await;

    let started = tokio::time::Instant::now();
    let ctx = Context::background();
    let shutdown_ctx = ctx.with_timeout(Duration::from_millis(100));
    exporter.shutdown(&shutdown_ctx).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(exporter.state(), LifecycleState::Stopped);
    assert_eq!(exporter.queue_size(), 0);
}

#[tokio::test]
async fn test_shutdown_twice_and_send_after_shutdown() {
    let tt = TestTelemetry::new();
    let exporter = span_exporter(
        &tt,
        ExporterOptions::new().with_queue(QueueSettings::default_enabled()),
        FlakyBackend::new(FlakyBackendConfig::healthy()),
    );
    exporter.start(&Context::background(), Arc::new(NopHost)).await.unwrap();

    exporter.shutdown(&Context::background()).await.unwrap();
    exporter.shutdown(&Context::background()).await.unwrap();

    let err = exporter
        .consume(&Context::background(), SpanBatch::with_len(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::NotRunning));
}
