//! Metrics and observability utilities
//!
//! Prometheus metrics through the `metrics` facade with
//! standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all pdfsum metrics
pub const METRICS_PREFIX: &str = "pdfsum";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Buckets for summarization latency (model inference, much slower)
pub const SUMMARIZATION_BUCKETS: &[f64] = &[
    0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0,
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Upload metrics
    describe_counter!(
        format!("{}_uploads_total", METRICS_PREFIX),
        Unit::Count,
        "Total PDF uploads by outcome"
    );

    describe_counter!(
        format!("{}_upload_bytes_total", METRICS_PREFIX),
        Unit::Bytes,
        "Total bytes of accepted PDF uploads"
    );

    // Summarization metrics
    describe_counter!(
        format!("{}_summarizations_total", METRICS_PREFIX),
        Unit::Count,
        "Total summarization requests by outcome"
    );

    describe_histogram!(
        format!("{}_summarization_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Summarization service latency in seconds"
    );

    // Audit log metrics
    describe_counter!(
        format!("{}_request_log_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Request audit rows that could not be written"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record upload metrics
pub fn record_upload(size_bytes: u64, success: bool) {
    let outcome = if success { "success" } else { "rejected" };

    counter!(
        format!("{}_uploads_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);

    if success {
        counter!(format!("{}_upload_bytes_total", METRICS_PREFIX)).increment(size_bytes);
    }
}

/// Helper to record summarization metrics
pub fn record_summarization(duration_secs: f64, style: &str, success: bool) {
    let outcome = if success { "success" } else { "error" };

    counter!(
        format!("{}_summarizations_total", METRICS_PREFIX),
        "style" => style.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        format!("{}_summarization_duration_seconds", METRICS_PREFIX),
        "outcome" => outcome
    )
    .record(duration_secs);
}

pub fn record_request_log_failure() {
    counter!(format!("{}_request_log_failures_total", METRICS_PREFIX)).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_are_sorted() {
        for buckets in [LATENCY_BUCKETS, SUMMARIZATION_BUCKETS] {
            let mut prev = 0.0;
            for &bucket in buckets {
                assert!(bucket > prev);
                prev = bucket;
            }
        }
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: all calls are no-ops
        let metrics = RequestMetrics::start("GET", "/pdf");
        metrics.finish(200);
        record_upload(1024, true);
        record_summarization(1.5, "short", false);
        record_request_log_failure();
    }
}
