//! Metrics collection and exposition.
//!
//! # Metrics
//! - `transfer_runs_total` (counter): finished runs by outcome
//! - `transfer_state_transitions_total` (counter): entries into each state
//! - `signing_polls_total` (counter): status polls by observed status
//! - `signing_wait_seconds` (histogram): submit to terminal status
//! - `broadcasts_total` (counter): broadcast attempts by result
//!
//! Without an installed recorder every call here is a no-op. The scrape
//! endpoint dies with the process, so [`linger`] holds it open for a final
//! scrape after the run.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(address: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(address)
        .install()?;
    tracing::info!(address = %address, "Metrics endpoint listening");
    Ok(())
}

/// Keep the scrape endpoint up for `window`, or until Ctrl-C.
pub async fn linger(window: Duration) {
    if window.is_zero() {
        return;
    }
    tracing::info!(seconds = window.as_secs(), "Serving final metrics before exit");
    tokio::select! {
        _ = tokio::time::sleep(window) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Metrics linger interrupted");
        }
    }
}

/// Record entry into a state.
pub fn record_transition(state: &'static str) {
    counter!("transfer_state_transitions_total", "state" => state).increment(1);
}

/// Record one status poll.
pub fn record_poll(status: &'static str) {
    counter!("signing_polls_total", "status" => status).increment(1);
}

/// Record time spent waiting for a terminal signing status.
pub fn record_signing_wait(elapsed: Duration) {
    histogram!("signing_wait_seconds").record(elapsed.as_secs_f64());
}

/// Record a broadcast attempt (`accepted`, `rejected`, `unknown`).
pub fn record_broadcast(result: &'static str) {
    counter!("broadcasts_total", "result" => result).increment(1);
}

/// Record the end of a run (`broadcast` or an error kind).
pub fn record_run(outcome: &'static str) {
    counter!("transfer_runs_total", "outcome" => outcome).increment(1);
}
