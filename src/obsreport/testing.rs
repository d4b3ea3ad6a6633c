//! In-memory telemetry for tests
//!
//! [`TestTelemetry`] bundles a [`TestMeter`] and a [`SpanRecorder`] behind a
//! [`TelemetrySettings`] so tests can hand it to any reporter and then
//! inspect the counters and the finished spans.

use crate::telemetry::{MetricsLevel, TelemetrySettings};
use dashmap::DashMap;
use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{span, Dispatch, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, Registry};

/// A `metrics` recorder that keeps every counter and gauge in memory.
#[derive(Debug, Default)]
pub struct TestMeter {
    counters: DashMap<Key, Arc<AtomicU64>>,
    gauges: DashMap<Key, Arc<AtomicU64>>,
}

fn matches_key(key: &Key, name: &str, labels: &[(&str, &str)]) -> bool {
    key.name() == name
        && key.labels().count() == labels.len()
        && labels
            .iter()
            .all(|(k, v)| key.labels().any(|l| l.key() == *k && l.value() == *v))
}

fn register(map: &DashMap<Key, Arc<AtomicU64>>, key: &Key) -> Arc<AtomicU64> {
    map.entry(key.clone())
        .or_insert_with(|| Arc::new(AtomicU64::new(0)))
        .clone()
}

impl TestMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the counter with exactly these labels (in any order), 0 if
    /// it was never recorded.
    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.counters
            .iter()
            .filter(|e| matches_key(e.key(), name, labels))
            .map(|e| e.value().load(Ordering::Acquire))
            .sum()
    }

    pub fn gauge_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.gauges
            .iter()
            .find(|e| matches_key(e.key(), name, labels))
            .map(|e| f64::from_bits(e.value().load(Ordering::Acquire)))
    }

    /// True when nothing was ever registered.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.gauges.is_empty()
    }
}

impl Recorder for TestMeter {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::from_arc(register(&self.counters, key))
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::from_arc(register(&self.gauges, key))
    }

    fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanStatus {
    Unset,
    Error(String),
}

/// A span that has been closed.
#[derive(Debug, Clone)]
pub struct RecordedSpan {
    pub id: u64,
    /// `otel.name` when set, the span's static name otherwise
    pub name: String,
    pub parent: Option<u64>,
    /// Spans this one follows from
    pub links: Vec<u64>,
    pub attributes: HashMap<String, AttrValue>,
}

impl RecordedSpan {
    pub fn int_attr(&self, key: &str) -> Option<i64> {
        match self.attributes.get(key)? {
            AttrValue::I64(v) => Some(*v),
            AttrValue::U64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn str_attr(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            AttrValue::Str(v) => Some(v.clone()),
            _ => None,
        }
    }

    pub fn status(&self) -> SpanStatus {
        match self.str_attr("otel.status_code").as_deref() {
            Some("ERROR") => SpanStatus::Error(self.str_attr("otel.status_message").unwrap_or_default()),
            _ => SpanStatus::Unset,
        }
    }
}

struct PendingSpan {
    name: String,
    parent: Option<u64>,
    links: Vec<u64>,
    attributes: HashMap<String, AttrValue>,
}

struct AttrVisitor<'a>(&'a mut HashMap<String, AttrValue>);

impl Visit for AttrVisitor<'_> {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), AttrValue::I64(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), AttrValue::U64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), AttrValue::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), AttrValue::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), AttrValue::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0
            .insert(field.name().to_string(), AttrValue::Str(format!("{value:?}")));
    }
}

/// A `tracing-subscriber` layer that keeps every closed span.
#[derive(Clone, Default)]
pub struct SpanRecorder {
    finished: Arc<Mutex<Vec<RecordedSpan>>>,
}

impl SpanRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed spans, in the order they closed.
    pub fn finished_spans(&self) -> Vec<RecordedSpan> {
        self.finished.lock().clone()
    }
}

impl<S> Layer<S> for SpanRecorder
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: LayerContext<'_, S>) {
        let mut attributes = HashMap::new();
        attrs.record(&mut AttrVisitor(&mut attributes));

        let parent = if let Some(parent) = attrs.parent() {
            Some(parent.into_u64())
        } else if attrs.is_contextual() {
            ctx.lookup_current().map(|s| s.id().into_u64())
        } else {
            None
        };

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(PendingSpan {
                name: attrs.metadata().name().to_string(),
                parent,
                links: Vec::new(),
                attributes,
            });
        }
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: LayerContext<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let mut extensions = span.extensions_mut();
            if let Some(pending) = extensions.get_mut::<PendingSpan>() {
                values.record(&mut AttrVisitor(&mut pending.attributes));
            }
        }
    }

    fn on_follows_from(&self, id: &span::Id, follows: &span::Id, ctx: LayerContext<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let mut extensions = span.extensions_mut();
            if let Some(pending) = extensions.get_mut::<PendingSpan>() {
                pending.links.push(follows.into_u64());
            }
        }
    }

    fn on_close(&self, id: span::Id, ctx: LayerContext<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        let Some(pending) = span.extensions_mut().remove::<PendingSpan>() else {
            return;
        };

        let name = match pending.attributes.get("otel.name") {
            Some(AttrValue::Str(name)) => name.clone(),
            _ => pending.name,
        };
        self.finished.lock().push(RecordedSpan {
            id: id.into_u64(),
            name,
            parent: pending.parent,
            links: pending.links,
            attributes: pending.attributes,
        });
    }
}

/// Telemetry settings backed by an in-memory meter and span recorder.
#[derive(Clone)]
pub struct TestTelemetry {
    meter: Arc<TestMeter>,
    spans: SpanRecorder,
    dispatch: Dispatch,
}

impl Default for TestTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTelemetry {
    pub fn new() -> Self {
        let spans = SpanRecorder::new();
        let dispatch = Dispatch::new(Registry::default().with(spans.clone()));
        Self {
            meter: Arc::new(TestMeter::new()),
            spans,
            dispatch,
        }
    }

    /// Settings at the default metrics level.
    pub fn settings(&self) -> TelemetrySettings {
        self.settings_with_level(MetricsLevel::default())
    }

    pub fn settings_with_level(&self, level: MetricsLevel) -> TelemetrySettings {
        TelemetrySettings::new(self.dispatch.clone(), self.meter.clone(), level)
    }

    pub fn meter(&self) -> &TestMeter {
        &self.meter
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Runs `f` with the test tracer as the default, e.g. to create the
    /// ambient span of a test request.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    pub fn finished_spans(&self) -> Vec<RecordedSpan> {
        self.spans.finished_spans()
    }

    pub fn finished_spans_named(&self, name: &str) -> Vec<RecordedSpan> {
        self.finished_spans()
            .into_iter()
            .filter(|s| s.name == name)
            .collect()
    }

    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.meter.counter_value(name, labels)
    }

    pub fn gauge(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.meter.gauge_value(name, labels)
    }
}
