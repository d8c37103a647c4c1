//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, tenant
//! - `gateway_request_duration_seconds` (histogram): latency until response headers
//! - `gateway_upstream_errors_total` (counter): failures by kind
//! - `gateway_sanitized_headers_total` (counter): headers removed by the sanitizer

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Label used for requests without a tenant.
pub const ROOT_TENANT: &str = "_root";

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, tenant: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("tenant", tenant.to_string()),
    ];
    metrics::counter!("gateway_requests_total", &labels).increment(1);
    metrics::histogram!("gateway_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(kind: &'static str) {
    metrics::counter!("gateway_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn record_sanitized(header: &'static str, count: usize) {
    if count > 0 {
        metrics::counter!("gateway_sanitized_headers_total", "header" => header)
            .increment(count as u64);
    }
}
