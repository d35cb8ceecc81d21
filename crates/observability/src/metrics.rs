//! Prometheus metrics infrastructure
//!
//! This module provides utilities for initializing Prometheus metrics
//! and creating the engine's metric set.

use metrics::{counter, Counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize the Prometheus metrics exporter
///
/// This starts an HTTP server on the specified port that exposes metrics
/// at the `/metrics` endpoint.
///
/// # Example
///
/// ```ignore
/// observability::metrics::init_metrics(9090)?;
/// // Metrics available at http://localhost:9090/metrics
/// ```
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Engine-wide counters for the matching core, ledger and broadcaster.
///
/// # Example
///
/// ```ignore
/// let metrics = EngineMetrics::new();
/// metrics.order_submitted();
/// metrics.fill_executed();
/// ```
#[derive(Clone)]
pub struct EngineMetrics {
    orders_submitted: Counter,
    fills_executed: Counter,
    settlement_aborts: Counter,
    broadcast_drops: Counter,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            orders_submitted: counter!("donutx_orders_submitted_total"),
            fills_executed: counter!("donutx_fills_executed_total"),
            settlement_aborts: counter!("donutx_settlement_aborts_total"),
            broadcast_drops: counter!("donutx_broadcast_drops_total"),
        }
    }

    pub fn order_submitted(&self) {
        self.orders_submitted.increment(1);
    }

    pub fn fill_executed(&self) {
        self.fills_executed.increment(1);
    }

    pub fn settlement_abort(&self) {
        self.settlement_aborts.increment(1);
    }

    pub fn broadcast_drop(&self) {
        self.broadcast_drops.increment(1);
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_metrics_creation() {
        // Just verify it doesn't panic
        let metrics = EngineMetrics::new();
        metrics.order_submitted();
        metrics.fill_executed();
    }
}
