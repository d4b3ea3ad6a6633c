use crate::component::ComponentId;
use crate::context::Context;
use crate::obsreport::names::{self, metric_name, SCRAPER_PREFIX};
use crate::obsreport::{record_status, ReportableError};
use crate::telemetry::TelemetrySettings;
use metrics::Label;
use tracing::field::Empty;

#[derive(Debug, Clone)]
pub struct ScraperSettings {
    /// The receiver the scraper runs inside.
    pub receiver_id: ComponentId,
    pub scraper: ComponentId,
    pub telemetry: TelemetrySettings,
}

/// Reports how many metric points a scraper collected.
#[derive(Debug, Clone)]
pub struct ObsScraper {
    span_name: String,
    labels: Vec<Label>,
    telemetry: TelemetrySettings,
}

impl ObsScraper {
    pub fn new(settings: ScraperSettings) -> Self {
        Self {
            span_name: format!(
                "{SCRAPER_PREFIX}/{}/{}/{}",
                settings.receiver_id,
                settings.scraper,
                names::SCRAPE_METRICS_OPERATION
            ),
            labels: vec![
                Label::new(names::RECEIVER_KEY, settings.receiver_id.to_string()),
                Label::new(names::SCRAPER_KEY, settings.scraper.to_string()),
            ],
            telemetry: settings.telemetry,
        }
    }

    pub fn start_metrics_op(&self, ctx: &Context) -> Context {
        let span = self.telemetry.in_tracer(|| {
            tracing::info_span!(
                parent: ctx.span(),
                "scraper",
                otel.name = %self.span_name,
                otel.status_code = Empty,
                otel.status_message = Empty,
                scraped_metric_points = Empty,
                errored_metric_points = Empty,
            )
        });
        ctx.with_span(span)
    }

    /// Records a finished scrape of `num_scraped_points` points.
    ///
    /// A partial failure keeps the full scraped count and reports its failed
    /// count as errored. Any other error reports every point as errored.
    pub fn end_metrics_op(&self, ctx: Context, num_scraped_points: usize, err: Option<&dyn ReportableError>) {
        let (scraped, errored) = match err {
            None => (num_scraped_points, 0),
            Some(err) => match err.failed_items() {
                Some(failed) => (num_scraped_points, failed),
                None => (0, num_scraped_points),
            },
        };

        let span = ctx.span();
        span.record(names::SCRAPED_METRIC_POINTS_KEY, scraped as i64);
        span.record(names::ERRORED_METRIC_POINTS_KEY, errored as i64);
        record_status(span, err);

        self.telemetry.add_to_counter(
            metric_name(SCRAPER_PREFIX, names::SCRAPED_METRIC_POINTS_KEY),
            self.labels.clone(),
            scraped as u64,
        );
        self.telemetry.add_to_counter(
            metric_name(SCRAPER_PREFIX, names::ERRORED_METRIC_POINTS_KEY),
            self.labels.clone(),
            errored as u64,
        );
    }
}
