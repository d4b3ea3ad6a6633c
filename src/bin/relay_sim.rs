//! Drives a queued, retrying log exporter against a simulated unreliable
//! backend and prints the resulting Prometheus metrics.
//!
//! Usage: `relay-sim [batches] [failure_rate]`

use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry_relay::component::ComponentId;
use telemetry_relay::obsreport::ExporterSettings;
use telemetry_relay::telemetry::prometheus::render_metrics;
use telemetry_relay::telemetry::{init_logging, start_metrics_server, LoggingConfig, MetricsConfig};
use telemetry_relay::{
    Context, ExportError, ExportResult, ExporterOptions, MetricsLevel, NopHost, Pusher, QueueSettings, RetrySettings,
    Signal, SignalData, SignalExporter, TelemetrySettings,
};

const RECORDS_PER_BATCH: usize = 50;

#[derive(Debug, Clone)]
struct LogBatch(Vec<String>);

impl SignalData for LogBatch {
    const SIGNAL: Signal = Signal::Logs;

    fn item_count(&self) -> usize {
        self.0.len()
    }
}

struct SimulatedBackend {
    failure_rate: f64,
    pushes: AtomicU64,
    records: AtomicU64,
}

#[async_trait]
impl Pusher<LogBatch> for SimulatedBackend {
    async fn push(&self, _ctx: &Context, data: &LogBatch) -> ExportResult<()> {
        self.pushes.fetch_add(1, Ordering::Relaxed);
        let (latency, fail) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(1..20), rng.gen_bool(self.failure_rate))
        };
        tokio::time::sleep(Duration::from_millis(latency)).await;

        if fail {
            return Err(ExportError::transport("simulated backend unavailable"));
        }
        self.records.fetch_add(data.0.len() as u64, Ordering::Relaxed);
        Ok(())
    }
}

fn parse_args() -> Result<(usize, f64)> {
    let mut args = std::env::args().skip(1);
    let batches = match args.next() {
        Some(arg) => arg.parse().with_context(|| format!("invalid batch count: {arg}"))?,
        None => 200,
    };
    let failure_rate: f64 = match args.next() {
        Some(arg) => arg.parse().with_context(|| format!("invalid failure rate: {arg}"))?,
        None => 0.3,
    };
    if !(0.0..=1.0).contains(&failure_rate) {
        bail!("failure rate must be between 0 and 1, got {failure_rate}");
    }
    Ok((batches, failure_rate))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&LoggingConfig::default())?;
    start_metrics_server(MetricsConfig::render_only())?;

    let (batches, failure_rate) = parse_args()?;

    println!("\n📡 Telemetry relay simulation");
    println!("   Batches:       {batches} x {RECORDS_PER_BATCH} log records");
    println!("   Failure rate:  {:.0}%\n", failure_rate * 100.0);

    let backend = Arc::new(SimulatedBackend {
        failure_rate,
        pushes: AtomicU64::new(0),
        records: AtomicU64::new(0),
    });

    let settings = ExporterSettings {
        exporter_id: ComponentId::with_name("otlp", "simulated"),
        telemetry: TelemetrySettings::from_current().with_level(MetricsLevel::Detailed),
    };
    let options = ExporterOptions::new()
        .with_queue(QueueSettings::default_enabled())
        .with_retry(RetrySettings {
            initial_interval: Duration::from_millis(20),
            max_interval: Duration::from_millis(500),
            max_elapsed_time: Duration::from_secs(30),
            ..RetrySettings::default_enabled()
        });
    let exporter = SignalExporter::new(settings, options, ForwardingPusher(backend.clone()))?;

    let root = Context::background();
    exporter.start(&root, Arc::new(NopHost)).await?;

    let started = Instant::now();
    let mut rejected = 0usize;
    for batch in 0..batches {
        let records = (0..RECORDS_PER_BATCH)
            .map(|i| format!("batch {batch} record {i}"))
            .collect();
        if let Err(e) = exporter.consume(&root, LogBatch(records)).await {
            tracing::warn!(batch, error = %e, "batch not accepted");
            rejected += 1;
        }
    }

    let shutdown_ctx = root.with_timeout(Duration::from_secs(60));
    exporter.shutdown(&shutdown_ctx).await?;

    println!("✅ Finished in {:.2?}", started.elapsed());
    println!("   Pushes:            {}", backend.pushes.load(Ordering::Relaxed));
    println!("   Records delivered: {}", backend.records.load(Ordering::Relaxed));
    println!("   Batches rejected:  {rejected}\n");

    if let Some(rendered) = render_metrics() {
        println!("{rendered}");
    }
    Ok(())
}

/// Lets the backend's counters stay readable after the exporter takes
/// ownership of its pusher.
struct ForwardingPusher(Arc<SimulatedBackend>);

#[async_trait]
impl Pusher<LogBatch> for ForwardingPusher {
    async fn push(&self, ctx: &Context, data: &LogBatch) -> ExportResult<()> {
        self.0.push(ctx, data).await
    }
}
