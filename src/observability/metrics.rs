//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by mode and outcome
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `proxy_rejections_total` (counter): client rejections by reason
//! - `proxy_schema_refresh_total` (counter): schema loads by result
//! - `proxy_schema_tables` (gauge): tables in the current snapshot
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(mode: &str, outcome: &str, start: Instant) {
    counter!(
        "proxy_requests_total",
        "mode" => mode.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "mode" => mode.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: &str) {
    counter!("proxy_rejections_total", "reason" => reason.to_string()).increment(1);
}

pub fn record_schema_refresh(result: &str) {
    counter!("proxy_schema_refresh_total", "result" => result.to_string()).increment(1);
}

pub fn record_schema_tables(count: usize) {
    gauge!("proxy_schema_tables").set(count as f64);
}
