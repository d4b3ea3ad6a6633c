//! Names of the counters, labels and span attributes obsreport emits.

/// Label keys
pub const RECEIVER_KEY: &str = "receiver";
pub const SCRAPER_KEY: &str = "scraper";
pub const TRANSPORT_KEY: &str = "transport";
pub const FORMAT_KEY: &str = "format";
pub const EXPORTER_KEY: &str = "exporter";
pub const PROCESSOR_KEY: &str = "processor";

/// Counter name prefixes, one per component kind
pub const RECEIVER_PREFIX: &str = "receiver";
pub const SCRAPER_PREFIX: &str = "scraper";
pub const EXPORTER_PREFIX: &str = "exporter";
pub const PROCESSOR_PREFIX: &str = "processor";

// Receiver
pub const ACCEPTED_SPANS_KEY: &str = "accepted_spans";
pub const REFUSED_SPANS_KEY: &str = "refused_spans";
pub const ACCEPTED_METRIC_POINTS_KEY: &str = "accepted_metric_points";
pub const REFUSED_METRIC_POINTS_KEY: &str = "refused_metric_points";
pub const ACCEPTED_LOG_RECORDS_KEY: &str = "accepted_log_records";
pub const REFUSED_LOG_RECORDS_KEY: &str = "refused_log_records";

// Processor (reuses the accepted/refused keys above)
pub const DROPPED_SPANS_KEY: &str = "dropped_spans";
pub const DROPPED_METRIC_POINTS_KEY: &str = "dropped_metric_points";
pub const DROPPED_LOG_RECORDS_KEY: &str = "dropped_log_records";

// Scraper
pub const SCRAPED_METRIC_POINTS_KEY: &str = "scraped_metric_points";
pub const ERRORED_METRIC_POINTS_KEY: &str = "errored_metric_points";

// Exporter
pub const SENT_SPANS_KEY: &str = "sent_spans";
pub const FAILED_TO_SEND_SPANS_KEY: &str = "send_failed_spans";
pub const FAILED_TO_ENQUEUE_SPANS_KEY: &str = "enqueue_failed_spans";
pub const SENT_METRIC_POINTS_KEY: &str = "sent_metric_points";
pub const FAILED_TO_SEND_METRIC_POINTS_KEY: &str = "send_failed_metric_points";
pub const FAILED_TO_ENQUEUE_METRIC_POINTS_KEY: &str = "enqueue_failed_metric_points";
pub const SENT_LOG_RECORDS_KEY: &str = "sent_log_records";
pub const FAILED_TO_SEND_LOG_RECORDS_KEY: &str = "send_failed_log_records";
pub const FAILED_TO_ENQUEUE_LOG_RECORDS_KEY: &str = "enqueue_failed_log_records";
pub const QUEUE_SIZE_KEY: &str = "queue_size";

/// Operation names that end receiver and scraper span names
pub const RECEIVE_TRACE_DATA_OPERATION: &str = "TraceDataReceived";
pub const RECEIVE_METRICS_OPERATION: &str = "MetricsReceived";
pub const RECEIVE_LOGS_OPERATION: &str = "LogsReceived";
pub const SCRAPE_METRICS_OPERATION: &str = "MetricsScraped";

/// `"<prefix>/<measure>"`
pub fn metric_name(prefix: &str, measure: &str) -> String {
    format!("{prefix}/{measure}")
}

/// Name for a metric a processor defines for itself:
/// `"processor/<config type>/<metric>"`.
pub fn build_processor_custom_metric_name(config_type: &str, metric: &str) -> String {
    format!("{PROCESSOR_PREFIX}/{config_type}/{metric}")
}

/// (prefix, measure, help) for every counter obsreport records.
pub const COUNTER_DESCRIPTIONS: &[(&str, &str, &str)] = &[
    (RECEIVER_PREFIX, ACCEPTED_SPANS_KEY, "Number of spans successfully pushed into the pipeline."),
    (RECEIVER_PREFIX, REFUSED_SPANS_KEY, "Number of spans that could not be pushed into the pipeline."),
    (RECEIVER_PREFIX, ACCEPTED_METRIC_POINTS_KEY, "Number of metric points successfully pushed into the pipeline."),
    (RECEIVER_PREFIX, REFUSED_METRIC_POINTS_KEY, "Number of metric points that could not be pushed into the pipeline."),
    (RECEIVER_PREFIX, ACCEPTED_LOG_RECORDS_KEY, "Number of log records successfully pushed into the pipeline."),
    (RECEIVER_PREFIX, REFUSED_LOG_RECORDS_KEY, "Number of log records that could not be pushed into the pipeline."),
    (SCRAPER_PREFIX, SCRAPED_METRIC_POINTS_KEY, "Number of metric points successfully scraped."),
    (SCRAPER_PREFIX, ERRORED_METRIC_POINTS_KEY, "Number of metric points that were unable to be scraped."),
    (PROCESSOR_PREFIX, ACCEPTED_SPANS_KEY, "Number of spans successfully pushed into the next component."),
    (PROCESSOR_PREFIX, REFUSED_SPANS_KEY, "Number of spans that were rejected by the next component."),
    (PROCESSOR_PREFIX, DROPPED_SPANS_KEY, "Number of spans that were dropped."),
    (PROCESSOR_PREFIX, ACCEPTED_METRIC_POINTS_KEY, "Number of metric points successfully pushed into the next component."),
    (PROCESSOR_PREFIX, REFUSED_METRIC_POINTS_KEY, "Number of metric points that were rejected by the next component."),
    (PROCESSOR_PREFIX, DROPPED_METRIC_POINTS_KEY, "Number of metric points that were dropped."),
    (PROCESSOR_PREFIX, ACCEPTED_LOG_RECORDS_KEY, "Number of log records successfully pushed into the next component."),
    (PROCESSOR_PREFIX, REFUSED_LOG_RECORDS_KEY, "Number of log records that were rejected by the next component."),
    (PROCESSOR_PREFIX, DROPPED_LOG_RECORDS_KEY, "Number of log records that were dropped."),
    (EXPORTER_PREFIX, SENT_SPANS_KEY, "Number of spans successfully sent to destination."),
    (EXPORTER_PREFIX, FAILED_TO_SEND_SPANS_KEY, "Number of spans in failed attempts to send to destination."),
    (EXPORTER_PREFIX, FAILED_TO_ENQUEUE_SPANS_KEY, "Number of spans failed to be added to the sending queue."),
    (EXPORTER_PREFIX, SENT_METRIC_POINTS_KEY, "Number of metric points successfully sent to destination."),
    (EXPORTER_PREFIX, FAILED_TO_SEND_METRIC_POINTS_KEY, "Number of metric points in failed attempts to send to destination."),
    (EXPORTER_PREFIX, FAILED_TO_ENQUEUE_METRIC_POINTS_KEY, "Number of metric points failed to be added to the sending queue."),
    (EXPORTER_PREFIX, SENT_LOG_RECORDS_KEY, "Number of log records successfully sent to destination."),
    (EXPORTER_PREFIX, FAILED_TO_SEND_LOG_RECORDS_KEY, "Number of log records in failed attempts to send to destination."),
    (EXPORTER_PREFIX, FAILED_TO_ENQUEUE_LOG_RECORDS_KEY, "Number of log records failed to be added to the sending queue."),
];
