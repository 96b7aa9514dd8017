//! Prometheus metrics for the watcher.
//!
//! All metrics are aggregated in the [`Metrics`] struct for easy tracking and management.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;
use transfer::TransferKind;

/// Aggregated metrics for the watcher.
///
/// Metrics are registered with the global metrics registry on creation. Without
/// an installed exporter every call is a no-op.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        // Cycle metrics
        describe_counter!("watcher_cycles_total", "Total number of polling cycles executed");
        describe_counter!(
            "watcher_cycles_skipped_total",
            "Polling cycles skipped, by reason (inactive, busy)"
        );
        describe_histogram!(
            "watcher_cycle_duration_seconds",
            "Duration of each polling cycle in seconds"
        );

        // Explorer metrics
        describe_counter!(
            "watcher_transfers_fetched_total",
            "Transfer records returned by the explorer, by kind"
        );
        describe_counter!(
            "watcher_fetch_failures_total",
            "Failed explorer fetches, by kind"
        );
        describe_counter!(
            "watcher_malformed_records_total",
            "Records skipped because they could not be classified or rendered"
        );

        // Alert metrics
        describe_counter!("watcher_alerts_sent_total", "Alerts delivered, by kind");
        describe_counter!(
            "watcher_dispatch_failures_total",
            "Alerts the messaging API did not accept"
        );

        // State gauges
        describe_gauge!(
            "watcher_cursor_block",
            "Last handled block per wallet and transfer kind"
        );
        describe_gauge!("watcher_active", "1 while monitoring is active, 0 when paused");
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Cycle metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Record a completed cycle.
    pub fn record_cycle(&self, duration: Duration) {
        counter!("watcher_cycles_total").increment(1);
        histogram!("watcher_cycle_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a cycle that did not run.
    pub fn record_cycle_skipped(&self, reason: &'static str) {
        counter!("watcher_cycles_skipped_total", "reason" => reason).increment(1);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Explorer metrics
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn record_fetched(&self, kind: TransferKind, count: usize) {
        counter!("watcher_transfers_fetched_total", "kind" => kind.as_str()).increment(count as u64);
    }

    pub fn record_fetch_failure(&self, kind: TransferKind) {
        counter!("watcher_fetch_failures_total", "kind" => kind.as_str()).increment(1);
    }

    pub fn record_malformed(&self, kind: TransferKind) {
        counter!("watcher_malformed_records_total", "kind" => kind.as_str()).increment(1);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Alert metrics
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn record_alert_sent(&self, kind: TransferKind) {
        counter!("watcher_alerts_sent_total", "kind" => kind.as_str()).increment(1);
    }

    pub fn record_dispatch_failure(&self) {
        counter!("watcher_dispatch_failures_total").increment(1);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // State gauges
    // ─────────────────────────────────────────────────────────────────────────────

    /// Set the cursor position for a wallet lane.
    pub fn set_cursor(&self, wallet: &str, kind: TransferKind, block: u64) {
        gauge!(
            "watcher_cursor_block",
            "wallet" => wallet.to_string(),
            "kind" => kind.as_str()
        )
        .set(block as f64);
    }

    pub fn set_active(&self, active: bool) {
        gauge!("watcher_active").set(if active { 1.0 } else { 0.0 });
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
