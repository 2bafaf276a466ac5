/// Metrics and telemetry for the results proxy
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Result cache hit/miss rates
/// - Upstream calls, retries and resolution outcomes

use lazy_static::lazy_static;
use prometheus::{
    register_gauge, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    Encoder, Gauge, HistogramVec, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .unwrap();

    // ========== Cache Metrics ==========

    /// Result cache lookups by outcome ("hit" / "miss")
    pub static ref RESULT_CACHE_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "result_cache_lookups_total",
        "Total number of result cache lookups",
        &["outcome"]
    )
    .unwrap();

    /// Stored result cache entries, expired included
    pub static ref RESULT_CACHE_ENTRIES: IntGauge = register_int_gauge!(
        "result_cache_entries",
        "Number of entries in the result cache"
    )
    .unwrap();

    // ========== Upstream Metrics ==========

    /// Upstream calls by call and outcome (HTTP status or "error")
    pub static ref UPSTREAM_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "upstream_calls_total",
        "Total number of completed upstream calls",
        &["call", "outcome"]
    )
    .unwrap();

    /// Upstream retries by call
    pub static ref UPSTREAM_RETRIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "upstream_retries_total",
        "Total number of upstream call retries",
        &["call"]
    )
    .unwrap();

    /// Resolutions by outcome ("found" / "not_found" / "error")
    pub static ref RESOLUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "resolutions_total",
        "Total number of scholar number resolutions",
        &["outcome"]
    )
    .unwrap();

    // ========== System Metrics ==========

    /// Application uptime in seconds
    pub static ref UPTIME_SECONDS: Gauge = register_gauge!(
        "uptime_seconds",
        "Application uptime in seconds"
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a result cache access
pub fn record_cache_access(hit: bool) {
    RESULT_CACHE_LOOKUPS_TOTAL
        .with_label_values(&[if hit { "hit" } else { "miss" }])
        .inc();
}

/// Record a completed upstream call
pub fn record_upstream_call(call: &str, outcome: &str) {
    UPSTREAM_CALLS_TOTAL
        .with_label_values(&[call, outcome])
        .inc();
}

/// Record an upstream retry
pub fn record_upstream_retry(call: &str) {
    UPSTREAM_RETRIES_TOTAL.with_label_values(&[call]).inc();
}

/// Record a resolution outcome
pub fn record_resolution(outcome: &str) {
    RESOLUTIONS_TOTAL.with_label_values(&[outcome]).inc();
}
