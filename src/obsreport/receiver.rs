use crate::component::ComponentId;
use crate::context::Context;
use crate::obsreport::names::{self, metric_name, RECEIVER_PREFIX};
use crate::obsreport::{record_status, split_items, ReportableError, Signal};
use crate::telemetry::TelemetrySettings;
use metrics::Label;
use tracing::field::Empty;
use tracing::Span;

macro_rules! receiver_span {
    ($parent:expr, $name:expr, $transport:expr) => {
        tracing::info_span!(
            parent: $parent,
            "receiver",
            otel.name = %$name,
            otel.status_code = Empty,
            otel.status_message = Empty,
            transport = %$transport,
            format = Empty,
            accepted_spans = Empty,
            refused_spans = Empty,
            accepted_metric_points = Empty,
            refused_metric_points = Empty,
            accepted_log_records = Empty,
            refused_log_records = Empty,
        )
    };
}

#[derive(Debug, Clone)]
pub struct ReceiverSettings {
    pub receiver_id: ComponentId,
    /// How the data arrived, e.g. `"grpc"` or `"http"`.
    pub transport: String,
    /// The receiver's operations outlive the request that carried the data,
    /// so spans start a new trace linked to the incoming one.
    pub long_lived_ctx: bool,
    pub telemetry: TelemetrySettings,
}

impl ReceiverSettings {
    pub fn new(receiver_id: ComponentId, transport: impl Into<String>, telemetry: TelemetrySettings) -> Self {
        Self {
            receiver_id,
            transport: transport.into(),
            long_lived_ctx: false,
            telemetry,
        }
    }

    pub fn with_long_lived_ctx(mut self, long_lived_ctx: bool) -> Self {
        self.long_lived_ctx = long_lived_ctx;
        self
    }
}

/// Reports what a receiver accepted and refused.
#[derive(Debug, Clone)]
pub struct ObsReceiver {
    span_name_prefix: String,
    transport: String,
    long_lived_ctx: bool,
    labels: Vec<Label>,
    telemetry: TelemetrySettings,
}

impl ObsReceiver {
    pub fn new(settings: ReceiverSettings) -> Self {
        let labels = vec![
            Label::new(names::RECEIVER_KEY, settings.receiver_id.to_string()),
            Label::new(names::TRANSPORT_KEY, settings.transport.clone()),
        ];
        Self {
            span_name_prefix: format!("{RECEIVER_PREFIX}/{}", settings.receiver_id),
            transport: settings.transport,
            long_lived_ctx: settings.long_lived_ctx,
            labels,
            telemetry: settings.telemetry,
        }
    }

    pub fn start_traces_op(&self, ctx: &Context) -> Context {
        self.start_op(ctx, Signal::Traces)
    }

    pub fn end_traces_op(&self, ctx: Context, format: &str, num_spans: usize, err: Option<&dyn ReportableError>) {
        self.end_op(ctx, Signal::Traces, format, num_spans, err)
    }

    pub fn start_metrics_op(&self, ctx: &Context) -> Context {
        self.start_op(ctx, Signal::Metrics)
    }

    pub fn end_metrics_op(&self, ctx: Context, format: &str, num_points: usize, err: Option<&dyn ReportableError>) {
        self.end_op(ctx, Signal::Metrics, format, num_points, err)
    }

    pub fn start_logs_op(&self, ctx: &Context) -> Context {
        self.start_op(ctx, Signal::Logs)
    }

    pub fn end_logs_op(&self, ctx: Context, format: &str, num_records: usize, err: Option<&dyn ReportableError>) {
        self.end_op(ctx, Signal::Logs, format, num_records, err)
    }

    /// Opens the receive span for `signal` and returns a context carrying it.
    pub fn start_op(&self, ctx: &Context, signal: Signal) -> Context {
        let name = format!("{}/{}", self.span_name_prefix, signal.receive_operation());
        let span = self.telemetry.in_tracer(|| {
            if self.long_lived_ctx {
                let root: Option<tracing::Id> = None;
                let span: Span = receiver_span!(root, name, self.transport);
                span.follows_from(ctx.span());
                span
            } else {
                receiver_span!(ctx.span(), name, self.transport)
            }
        });
        ctx.with_span(span)
    }

    /// Records the outcome of the operation started on `ctx` and ends its span.
    pub fn end_op(
        &self,
        ctx: Context,
        signal: Signal,
        format: &str,
        num_items: usize,
        err: Option<&dyn ReportableError>,
    ) {
        let (accepted, refused) = split_items(num_items, err);

        let span = ctx.span();
        span.record(names::FORMAT_KEY, format);
        span.record(signal.accepted_key(), accepted as i64);
        span.record(signal.refused_key(), refused as i64);
        record_status(span, err);

        self.telemetry.add_to_counter(
            metric_name(RECEIVER_PREFIX, signal.accepted_key()),
            self.labels.clone(),
            accepted as u64,
        );
        self.telemetry.add_to_counter(
            metric_name(RECEIVER_PREFIX, signal.refused_key()),
            self.labels.clone(),
            refused as u64,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::ExportError;
    use crate::obsreport::testing::{SpanStatus, TestTelemetry};
    use crate::telemetry::MetricsLevel;

    fn receiver(tt: &TestTelemetry, long_lived: bool) -> ObsReceiver {
        ObsReceiver::new(
            ReceiverSettings::new(ComponentId::new("fakeReceiver"), "fakeTransport", tt.settings())
                .with_long_lived_ctx(long_lived),
        )
    }

    #[test]
    fn test_receive_traces_op() {
        let tt = TestTelemetry::new();
        let rec = receiver(&tt, false);
        let parent = tt.in_scope(|| Context::background().with_span(tracing::info_span!("parent")));

        let ctx = rec.start_traces_op(&parent);
        rec.end_traces_op(ctx, "fakeFormat", 13, Some(&ExportError::transport("errFake")));
        let ctx = rec.start_traces_op(&parent);
        rec.end_traces_op(ctx, "fakeFormat", 42, None);

        let spans = tt.finished_spans_named("receiver/fakeReceiver/TraceDataReceived");
        assert_eq!(spans.len(), 2);

        assert_eq!(spans[0].status(), SpanStatus::Error("errFake".to_string()));
        assert_eq!(spans[0].int_attr("accepted_spans"), Some(0));
        assert_eq!(spans[0].int_attr("refused_spans"), Some(13));
        assert_eq!(spans[1].status(), SpanStatus::Unset);
        assert_eq!(spans[1].int_attr("accepted_spans"), Some(42));
        assert_eq!(spans[1].str_attr("format").as_deref(), Some("fakeFormat"));
        assert_eq!(spans[1].str_attr("transport").as_deref(), Some("fakeTransport"));

        // Children of the ambient span
        let parent_id = parent.span().id().map(|id| id.into_u64());
        assert!(spans.iter().all(|s| s.parent == parent_id));

        let labels = [("receiver", "fakeReceiver"), ("transport", "fakeTransport")];
        assert_eq!(tt.counter("receiver/accepted_spans", &labels), 42);
        assert_eq!(tt.counter("receiver/refused_spans", &labels), 13);
    }

    #[test]
    fn test_receive_metrics_partial_failure() {
        let tt = TestTelemetry::new();
        let rec = receiver(&tt, false);

        let ctx = rec.start_metrics_op(&Context::background());
        rec.end_metrics_op(ctx, "fakeFormat", 10, Some(&ExportError::partial(ExportError::transport("bad points"), 3)));

        let labels = [("receiver", "fakeReceiver"), ("transport", "fakeTransport")];
        assert_eq!(tt.counter("receiver/accepted_metric_points", &labels), 7);
        assert_eq!(tt.counter("receiver/refused_metric_points", &labels), 3);

        let spans = tt.finished_spans_named("receiver/fakeReceiver/MetricsReceived");
        assert_eq!(spans.len(), 1);
        assert!(matches!(spans[0].status(), SpanStatus::Error(_)));
    }

    #[test]
    fn test_long_lived_ctx_starts_linked_root() {
        let tt = TestTelemetry::new();
        let rec = receiver(&tt, true);
        let parent = tt.in_scope(|| Context::background().with_span(tracing::info_span!("request")));
        let parent_id = parent.span().id().map(|id| id.into_u64());

        for _ in 0..3 {
            let ctx = rec.start_logs_op(&parent);
            rec.end_logs_op(ctx, "fakeFormat", 5, None);
        }

        let spans = tt.finished_spans_named("receiver/fakeReceiver/LogsReceived");
        assert_eq!(spans.len(), 3);
        for span in spans {
            assert_eq!(span.parent, None);
            assert_eq!(span.links.len(), 1);
            assert_eq!(Some(span.links[0]), parent_id);
        }
    }

    #[test]
    fn test_level_none_records_no_counters() {
        let tt = TestTelemetry::new();
        let rec = ObsReceiver::new(ReceiverSettings::new(
            ComponentId::new("fakeReceiver"),
            "fakeTransport",
            tt.settings_with_level(MetricsLevel::None),
        ));

        let ctx = rec.start_traces_op(&Context::background());
        rec.end_traces_op(ctx, "fakeFormat", 42, None);

        assert!(tt.meter().is_empty());
        // Spans are still produced
        assert_eq!(tt.finished_spans_named("receiver/fakeReceiver/TraceDataReceived").len(), 1);
    }
}
