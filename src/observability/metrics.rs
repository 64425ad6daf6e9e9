//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_submissions_total` (counter): terminal submission outcomes
//! - `gateway_pending_submissions` (gauge): hashes currently in flight
//! - `gateway_stream_events_total` (counter): events delivered to stream handlers
//! - `gateway_stream_reconnects_total` (counter): stream reconnect attempts
//! - `gateway_core_synced` (gauge): 1=synced, 0=not synced
//!
//! Every helper is a cheap no-op until a recorder is installed.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder with its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// `outcome` is one of success, failed, timeout, canceled, error.
pub fn record_submission(outcome: &'static str) {
    counter!("gateway_submissions_total", "outcome" => outcome).increment(1);
}

pub fn set_pending_submissions(count: usize) {
    gauge!("gateway_pending_submissions").set(count as f64);
}

pub fn record_stream_event() {
    counter!("gateway_stream_events_total").increment(1);
}

pub fn record_stream_reconnect() {
    counter!("gateway_stream_reconnects_total").increment(1);
}

pub fn record_core_synced(synced: bool) {
    gauge!("gateway_core_synced").set(if synced { 1.0 } else { 0.0 });
}
