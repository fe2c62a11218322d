//! Metrics collection and exposition.
//!
//! # Metrics
//! - `routeplane_reconfigure_total` (counter): engine operations by operation, outcome
//! - `routeplane_reload_duration_seconds` (histogram): proxy reload latency by status
//! - `routeplane_propagation_total` (counter): peer calls by target, status
//! - `routeplane_known_services` (gauge): services in the known set
//!
//! Recording without an installed exporter is a no-op, so library code and
//! tests call these freely.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid metrics address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to install metrics exporter: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),
}

/// Install the Prometheus exporter listening on `address`.
pub fn init_metrics(address: &str) -> Result<(), MetricsError> {
    let addr: SocketAddr = address.parse().map_err(|source| MetricsError::Address {
        address: address.to_string(),
        source,
    })?;

    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!(
        "routeplane_reconfigure_total",
        "Engine operations by operation and outcome"
    );
    describe_histogram!(
        "routeplane_reload_duration_seconds",
        Unit::Seconds,
        "Time spent reloading the proxy"
    );
    describe_counter!(
        "routeplane_propagation_total",
        "Peer notifications by target and status"
    );
    describe_gauge!("routeplane_known_services", "Services currently routed");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn status(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

pub fn record_reconfigure(operation: &'static str, outcome: &'static str) {
    counter!("routeplane_reconfigure_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

pub fn record_reload(duration: Duration, success: bool) {
    histogram!("routeplane_reload_duration_seconds", "status" => status(success))
        .record(duration.as_secs_f64());
}

pub fn record_propagation(target: &'static str, success: bool) {
    counter!("routeplane_propagation_total", "target" => target, "status" => status(success))
        .increment(1);
}

pub fn set_known_services(count: usize) {
    gauge!("routeplane_known_services").set(count as f64);
}
