//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_connect_total` (counter): outbound connect attempts by outcome
//! - `bridge_rejected_total` (counter): requests refused before relaying, by reason
//! - `bridge_sessions_active` (gauge): admitted sessions
//! - `bridge_session_duration_seconds` (histogram): relay lifetime
//! - `bridge_bytes_total` (counter): relayed bytes by direction
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_connect(outcome: &'static str) {
    counter!("bridge_connect_total", "outcome" => outcome).increment(1);
}

pub fn record_rejected(reason: &'static str) {
    counter!("bridge_rejected_total", "reason" => reason).increment(1);
}

pub fn set_active_sessions(count: u64) {
    gauge!("bridge_sessions_active").set(count as f64);
}

pub fn record_session(duration: Duration, inbound_bytes: u64, outbound_bytes: u64) {
    histogram!("bridge_session_duration_seconds").record(duration.as_secs_f64());
    counter!("bridge_bytes_total", "direction" => "inbound").increment(inbound_bytes);
    counter!("bridge_bytes_total", "direction" => "outbound").increment(outbound_bytes);
}
