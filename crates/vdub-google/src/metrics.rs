//! Google API metrics collection.
//!
//! - Request counters by operation and status
//! - Latency histograms
//! - Retry counters

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total Google API requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "google_requests_total";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "google_retries_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "google_latency_seconds";
}

/// Service half of an operation name (`sheets.get_values` -> `sheets`).
fn service_of(operation: &str) -> &str {
    operation.split('.').next().unwrap_or(operation)
}

/// Record metrics for a completed request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "service" => service_of(operation).to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "service" => service_of(operation).to_string(),
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}
