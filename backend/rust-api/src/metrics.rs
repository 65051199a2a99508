use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Upstream Metrics (Kidemia API)
    pub static ref UPSTREAM_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "kidemia_upstream_request_duration_seconds",
        "Kidemia API call duration in seconds",
        &["operation", "outcome"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0]
    )
    .unwrap();

    // Business Metrics
    pub static ref AUTHORING_SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "authoring_sessions_active",
        "Number of authoring sessions currently held in memory"
    )
    .unwrap();

    pub static ref QUESTIONS_IMPORTED_TOTAL: IntCounter = register_int_counter!(
        "questions_imported_total",
        "Total number of draft questions imported from CSV"
    )
    .unwrap();

    pub static ref IMPORT_WARNINGS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "import_warnings_total",
        "Lenient fallbacks applied while importing CSV rows",
        &["field"]
    )
    .unwrap();

    pub static ref QUESTION_VALIDATION_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "question_validation_failures_total",
        "Pre-submission validation failures",
        &["rule"]
    )
    .unwrap();

    pub static ref SUBMISSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "question_submissions_total",
        "Bulk question submissions",
        &["outcome"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

pub fn record_submission(outcome: &str) {
    SUBMISSIONS_TOTAL.with_label_values(&[outcome]).inc();
}
