//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shell_resolutions_total` (counter): resolutions by provider and outcome
//! - `shell_content_cache_total` (counter): content cache hits and misses
//! - `shell_filtered_bytes_total` (counter): bytes relayed by rewrite filters
//! - `shell_injections_total` (counter): injections posted by kind
//! - `shell_rule_errors_total` (counter): invalid rules skipped by kind
//! - `shell_http_requests_total` (counter): dev host requests by source and status
//! - `shell_http_request_duration_seconds` (histogram): dev host latency by source

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// A provider claimed a request, or the chain declined it (`provider = "none"`).
pub fn record_resolution(provider: &'static str, claimed: bool) {
    let outcome = if claimed { "claimed" } else { "declined" };
    counter!("shell_resolutions_total", "provider" => provider, "outcome" => outcome).increment(1);
}

pub fn record_cache(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("shell_content_cache_total", "result" => result).increment(1);
}

pub fn record_filtered_bytes(bytes: usize) {
    counter!("shell_filtered_bytes_total").increment(bytes as u64);
}

pub fn record_injection(kind: &'static str) {
    counter!("shell_injections_total", "kind" => kind).increment(1);
}

pub fn record_rule_error(kind: &'static str) {
    counter!("shell_rule_errors_total", "kind" => kind).increment(1);
}

/// A dev host request finished. `source` is "provider", "upstream" or "none".
pub fn record_request(source: &'static str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!("shell_http_requests_total", "source" => source, "status" => status).increment(1);
    histogram!("shell_http_request_duration_seconds", "source" => source)
        .record(start.elapsed().as_secs_f64());
}
