//! Prometheus metrics bootstrap
//!
//! Counters are emitted unconditionally via the `metrics` facade; installing
//! the exporter is opt-in through the CLI. Without an exporter the facade
//! drops emissions, so extraction never depends on metrics being up.

use metrics::{describe_counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use tracing::info;

static METRICS_INSTALLED: OnceCell<()> = OnceCell::new();

/// Install the Prometheus exporter on `addr` and register metric
/// descriptions. Idempotent; later calls are no-ops.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    if METRICS_INSTALLED.get().is_some() {
        return Ok(());
    }

    info!(%addr, "installing Prometheus metrics exporter");
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install Prometheus exporter: {e}"))?;
    describe_metrics();

    let _ = METRICS_INSTALLED.set(());
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "extractor_http_requests_total",
        Unit::Count,
        "HTTP requests issued against the source API"
    );
    describe_counter!(
        "extractor_fetch_retries_total",
        Unit::Count,
        "Retries of transient fetch failures"
    );
    describe_counter!(
        "extractor_windows_committed_total",
        Unit::Count,
        "Windows fetched, emitted, and checkpointed"
    );
    describe_counter!(
        "extractor_records_emitted_total",
        Unit::Count,
        "Records made visible to downstream consumers"
    );
}
