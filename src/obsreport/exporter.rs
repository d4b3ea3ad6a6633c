use crate::component::ComponentId;
use crate::context::Context;
use crate::obsreport::names::{self, metric_name, EXPORTER_PREFIX};
use crate::obsreport::{record_status, split_items, ReportableError, Signal};
use crate::telemetry::TelemetrySettings;
use metrics::Label;
use tracing::field::Empty;

#[derive(Debug, Clone)]
pub struct ExporterSettings {
    pub exporter_id: ComponentId,
    pub telemetry: TelemetrySettings,
}

/// Reports what an exporter sent, failed to send, or could not enqueue.
#[derive(Debug, Clone)]
pub struct ObsExporter {
    exporter_id: ComponentId,
    span_name_prefix: String,
    labels: Vec<Label>,
    telemetry: TelemetrySettings,
}

impl ObsExporter {
    pub fn new(settings: ExporterSettings) -> Self {
        Self {
            span_name_prefix: format!("{EXPORTER_PREFIX}/{}", settings.exporter_id),
            labels: vec![Label::new(names::EXPORTER_KEY, settings.exporter_id.to_string())],
            exporter_id: settings.exporter_id,
            telemetry: settings.telemetry,
        }
    }

    pub fn exporter_id(&self) -> &ComponentId {
        &self.exporter_id
    }

    pub fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub fn start_traces_op(&self, ctx: &Context) -> Context {
        self.start_op(ctx, Signal::Traces)
    }

    pub fn end_traces_op(&self, ctx: Context, num_spans: usize, err: Option<&dyn ReportableError>) {
        self.end_op(ctx, Signal::Traces, num_spans, err)
    }

    pub fn start_metrics_op(&self, ctx: &Context) -> Context {
        self.start_op(ctx, Signal::Metrics)
    }

    pub fn end_metrics_op(&self, ctx: Context, num_points: usize, err: Option<&dyn ReportableError>) {
        self.end_op(ctx, Signal::Metrics, num_points, err)
    }

    pub fn start_logs_op(&self, ctx: &Context) -> Context {
        self.start_op(ctx, Signal::Logs)
    }

    pub fn end_logs_op(&self, ctx: Context, num_records: usize, err: Option<&dyn ReportableError>) {
        self.end_op(ctx, Signal::Logs, num_records, err)
    }

    /// Opens the `"exporter/<id>/<signal>"` span as a child of `ctx`'s span.
    pub fn start_op(&self, ctx: &Context, signal: Signal) -> Context {
        let name = format!("{}/{}", self.span_name_prefix, signal);
        let span = self.telemetry.in_tracer(|| {
            tracing::info_span!(
                parent: ctx.span(),
                "exporter",
                otel.name = %name,
                otel.status_code = Empty,
                otel.status_message = Empty,
                sent_spans = Empty,
                send_failed_spans = Empty,
                sent_metric_points = Empty,
                send_failed_metric_points = Empty,
                sent_log_records = Empty,
                send_failed_log_records = Empty,
            )
        });
        ctx.with_span(span)
    }

    pub fn end_op(&self, ctx: Context, signal: Signal, num_items: usize, err: Option<&dyn ReportableError>) {
        let (sent, failed) = split_items(num_items, err);

        let span = ctx.span();
        span.record(signal.sent_key(), sent as i64);
        span.record(signal.send_failed_key(), failed as i64);
        record_status(span, err);

        self.telemetry.add_to_counter(
            metric_name(EXPORTER_PREFIX, signal.sent_key()),
            self.labels.clone(),
            sent as u64,
        );
        self.telemetry.add_to_counter(
            metric_name(EXPORTER_PREFIX, signal.send_failed_key()),
            self.labels.clone(),
            failed as u64,
        );
    }

    /// Counts items the sending queue refused to take.
    pub fn record_enqueue_failure(&self, signal: Signal, num_items: usize) {
        self.telemetry.add_to_counter(
            metric_name(EXPORTER_PREFIX, signal.enqueue_failed_key()),
            self.labels.clone(),
            num_items as u64,
        );
    }

    /// Current number of requests in the sending queue (detailed level only).
    pub fn record_queue_size(&self, size: usize) {
        self.telemetry.set_gauge(
            metric_name(EXPORTER_PREFIX, names::QUEUE_SIZE_KEY),
            self.labels.clone(),
            size as f64,
        );
    }
}
