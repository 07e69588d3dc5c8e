//! Metrics collection and exposition.
//!
//! # Metrics
//! - `visor_passes_total` (counter): reconciliation passes by outcome
//! - `visor_lookup_duration_seconds` (histogram): registry lookup latency
//! - `visor_lookup_errors_total` (counter): failed registry lookups
//! - `visor_renders_total` (counter): config renders by service, result
//! - `visor_reloads_total` (counter): reload attempts by result
//! - `visor_tracked_services` (gauge): services with a committed fingerprint
//!
//! Without an installed recorder every call here is a no-op.

use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Metrics recorder installed");
    Ok(handle)
}

pub fn record_pass(outcome: &'static str) {
    counter!("visor_passes_total", "outcome" => outcome).increment(1);
}

pub fn record_lookup(elapsed: Duration, ok: bool) {
    histogram!("visor_lookup_duration_seconds").record(elapsed.as_secs_f64());
    if !ok {
        counter!("visor_lookup_errors_total").increment(1);
    }
}

pub fn record_render(service: &str, result: &'static str) {
    counter!(
        "visor_renders_total",
        "service" => service.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_reload(ok: bool) {
    let result = if ok { "ok" } else { "error" };
    counter!("visor_reloads_total", "result" => result).increment(1);
}

pub fn record_tracked_services(count: usize) {
    gauge!("visor_tracked_services").set(count as f64);
}
