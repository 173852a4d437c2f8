//! Metrics collection and exposition.
//!
//! # Metrics
//! - `apollo_fetch_total` (counter): namespace fetches by namespace, outcome
//! - `apollo_failover_total` (counter): failover attempts by result
//! - `apollo_disk_writes_total` (counter): cache files written by namespace
//! - `apollo_disk_fallback_total` (counter): reads served from disk by namespace
//! - `apollo_cached_namespaces` (gauge): namespaces held in memory
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and expose it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_fetch(namespace: &str, outcome: &'static str) {
    metrics::counter!(
        "apollo_fetch_total",
        "namespace" => namespace.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_failover(success: bool) {
    let result = if success { "switched" } else { "failed" };
    metrics::counter!("apollo_failover_total", "result" => result).increment(1);
}

pub fn record_disk_write(namespace: &str) {
    metrics::counter!("apollo_disk_writes_total", "namespace" => namespace.to_string())
        .increment(1);
}

pub fn record_disk_fallback(namespace: &str) {
    metrics::counter!("apollo_disk_fallback_total", "namespace" => namespace.to_string())
        .increment(1);
}

pub fn record_cached_namespaces(count: usize) {
    metrics::gauge!("apollo_cached_namespaces").set(count as f64);
}
