//! The PurchasingAgent (§4.5): each open retail outlet autonomously bids
//! for stock against the current best ask, bounded by its own cash.

use crate::config::PurchasingConfig;
use crate::error::AgentResult;
use common::{OrderSide, ProductId};
use ledger::Ledger;
use matching_engine::Exchange;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Bids into each product's book on behalf of every open, non-sentinel
/// outlet. Outlets with insufficient balance are skipped for that product.
pub struct PurchasingAgent {
    exchange: Arc<Exchange>,
    ledger: Arc<Ledger>,
    products: Vec<ProductId>,
    config: PurchasingConfig,
    running: AtomicBool,
}

impl PurchasingAgent {
    pub fn new(exchange: Arc<Exchange>, ledger: Arc<Ledger>, products: Vec<ProductId>, config: PurchasingConfig) -> Self {
        Self {
            exchange,
            ledger,
            products,
            config,
            running: AtomicBool::new(false),
        }
    }

    pub async fn run(&self, shutdown: CancellationToken) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("purchasing agent already running, ignoring duplicate start");
            return;
        }

        tracing::info!(tick_ms = ?self.config.tick_interval, "purchasing agent starting");
        let mut timer = tokio::time::interval(self.config.tick_interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("purchasing agent shutting down");
                    break;
                }
                _ = timer.tick() => {
                    if let Err(err) = self.tick().await {
                        tracing::warn!(error = %err, "purchasing agent tick failed");
                    }
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
    }

    async fn tick(&self) -> AgentResult<()> {
        let outlets: Vec<_> = self
            .ledger
            .all_outlets()
            .await
            .into_iter()
            .filter(|o| o.is_open && o.outlet_id != self.config.supplier_outlet_id)
            .collect();

        for product_id in &self.products {
            let Some(snapshot) = self.exchange.snapshot(product_id).await else {
                continue;
            };
            let Some(best_ask) = snapshot.asks.first() else {
                continue;
            };
            let aggression = rand::thread_rng().gen_range(0.0..=2.0);
            let price = best_ask.price_per_unit * (1.0 + aggression / 100.0);

            for outlet in &outlets {
                let affordable = (outlet.balance / price).floor() as i64;
                if affordable <= 0 {
                    continue;
                }
                let quantity = self.config.order_quantity.draw().min(affordable);
                if quantity <= 0 {
                    continue;
                }

                self.exchange
                    .submit_order(OrderSide::Buy, product_id, &outlet.outlet_id, quantity, price)
                    .await?;
            }
        }

        Ok(())
    }
}
