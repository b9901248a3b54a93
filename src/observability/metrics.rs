//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_trust_policy_selected_total` (counter): policy selections by source
//! - `proxy_trust_header_overrides_total` (counter): override actions by header
//! - `proxy_trust_trusted_proxies` (histogram): size of the trusted proxy list

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_policy_selected(source: &'static str) {
    counter!("proxy_trust_policy_selected_total", "source" => source).increment(1);
}

pub fn record_header_override(header: &'static str, action: &'static str) {
    counter!("proxy_trust_header_overrides_total", "header" => header, "action" => action).increment(1);
}

pub fn record_trusted_proxies(count: usize) {
    histogram!("proxy_trust_trusted_proxies").record(count as f64);
}
