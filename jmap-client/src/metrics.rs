//! Client metrics definitions
//!
//! OpenTelemetry instruments describing how the client talks to the server.
//! They are exported by whatever meter provider is installed globally, which
//! `jmap_core::init_observability` does when an OTLP endpoint is configured.
//!
//! # Metrics Collected
//!
//! - **requests_total**: HTTP exchanges by kind (`session`, `api`, `upload`,
//!   `download`) and outcome (counter)
//! - **request_duration**: exchange latency in seconds (histogram)
//! - **calls_total**: method calls sent inside API requests (counter)
//! - **errors_total**: failures by error type (counter)
//! - **session_refresh**: session objects fetched (counter)
//!
//! # Examples
//!
//! ```rust,no_run
//! use jmap_client::ClientMetrics;
//!
//! let metrics = ClientMetrics::new("mail-sync");
//! metrics.record_request("api", "success", 0.042);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    InstrumentationScope, KeyValue,
};

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Total number of HTTP exchanges
    pub requests_total: Counter<u64>,
    /// Exchange duration in seconds
    pub request_duration: Histogram<f64>,
    /// Total number of method calls sent
    pub calls_total: Counter<u64>,
    /// Total number of errors
    pub errors_total: Counter<u64>,
    /// Total number of session fetches
    pub session_refresh: Counter<u64>,
}

impl ClientMetrics {
    /// Create metrics on the global meter provider
    pub fn new(service_name: impl Into<String>) -> Self {
        let scope = InstrumentationScope::builder(service_name.into()).build();
        let meter = global::meter_with_scope(scope);
        Self::new_with_meter(&meter)
    }

    /// Create metrics with a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("jmap.client.requests.total")
                .with_description("Total number of HTTP exchanges with the server")
                .build(),
            request_duration: meter
                .f64_histogram("jmap.client.request.duration")
                .with_description("HTTP exchange duration in seconds")
                .build(),
            calls_total: meter
                .u64_counter("jmap.client.calls.total")
                .with_description("Total number of method calls sent")
                .build(),
            errors_total: meter
                .u64_counter("jmap.client.errors.total")
                .with_description("Total number of errors encountered")
                .build(),
            session_refresh: meter
                .u64_counter("jmap.client.session.refresh")
                .with_description("Total number of session objects fetched")
                .build(),
        }
    }

    /// Record one HTTP exchange
    pub fn record_request(&self, kind: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("kind", kind.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record the method calls of one API request
    pub fn record_calls(&self, count: u64) {
        self.calls_total.add(count, &[]);
    }

    /// Record an error
    pub fn record_error(&self, error_type: &str) {
        let attributes = &[KeyValue::new("error_type", error_type.to_string())];
        self.errors_total.add(1, attributes);
    }

    /// Record a session fetch
    pub fn record_session_refresh(&self) {
        self.session_refresh.add(1, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = ClientMetrics::new("test-client");

        // no meter provider is installed, so this only checks nothing panics
        metrics.record_request("api", "success", 0.05);
        metrics.record_calls(3);
        metrics.record_error("limit");
        metrics.record_session_refresh();
    }

    #[test]
    fn test_request_metrics() {
        let metrics = ClientMetrics::new("test-client-req");

        metrics.record_request("session", "success", 0.01);
        metrics.record_request("upload", "success", 0.20);
        metrics.record_request("api", "error", 0.03);
        metrics.record_error("http");
    }
}
