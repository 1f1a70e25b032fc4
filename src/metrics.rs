/// Metrics and telemetry for the Triple Fun persistence API
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - JSON document writes and read fallbacks
/// - Image uploads, uploaded bytes and deletions

use lazy_static::lazy_static;
use prometheus::{
    register_gauge, register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    Gauge, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
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
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    // ========== Document Metrics ==========

    /// JSON document writes by document and outcome
    pub static ref DOCUMENT_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "document_writes_total",
        "Total number of JSON document writes",
        &["document", "outcome"]
    )
    .unwrap();

    /// Translation reads that fell back to a placeholder
    pub static ref DOCUMENT_READ_FALLBACKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "document_read_fallbacks_total",
        "Total number of translation reads replaced by a placeholder",
        &["language"]
    )
    .unwrap();

    // ========== Upload Metrics ==========

    /// Uploaded files by outcome
    pub static ref UPLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "uploads_total",
        "Total number of uploaded files by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Bytes written to the upload directory
    pub static ref UPLOAD_BYTES_TOTAL: IntCounter = register_int_counter!(
        "upload_bytes_total",
        "Total number of bytes stored by uploads"
    )
    .unwrap();

    /// Upload deletions by outcome
    pub static ref UPLOAD_DELETES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "upload_deletes_total",
        "Total number of upload deletions by outcome",
        &["outcome"]
    )
    .unwrap();

    // ========== Process Metrics ==========

    /// Seconds since the server started
    pub static ref UPTIME_SECONDS: Gauge = register_gauge!(
        "uptime_seconds",
        "Seconds since the server started"
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
        return String::new();
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

/// Record a JSON document write
pub fn record_document_write(document: &str, success: bool) {
    DOCUMENT_WRITES_TOTAL
        .with_label_values(&[document, if success { "success" } else { "failure" }])
        .inc();
}

/// Record a translation read that fell back to a placeholder
pub fn record_read_fallback(language: &str) {
    DOCUMENT_READ_FALLBACKS_TOTAL
        .with_label_values(&[language])
        .inc();
}

/// Record the outcome of one uploaded file
pub fn record_upload(outcome: &str, bytes: u64) {
    UPLOADS_TOTAL.with_label_values(&[outcome]).inc();
    if outcome == "stored" {
        UPLOAD_BYTES_TOTAL.inc_by(bytes);
    }
}

/// Record an upload deletion
pub fn record_upload_delete(outcome: &str) {
    UPLOAD_DELETES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Update the uptime gauge
pub fn set_uptime(seconds: f64) {
    UPTIME_SECONDS.set(seconds);
}
