//! The Supplier agent (§4.5): periodically restocks the book with SELL
//! orders from the sentinel `supplier-factory` outlet.

use crate::config::SupplierConfig;
use crate::error::AgentResult;
use common::ProductId;
use ledger::Ledger;
use matching_engine::Exchange;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Injects sell-side liquidity on a timer. Pauses for the duration the
/// sentinel outlet is closed rather than failing ticks.
pub struct Supplier {
    exchange: Arc<Exchange>,
    ledger: Arc<Ledger>,
    products: Vec<ProductId>,
    config: SupplierConfig,
    running: AtomicBool,
}

impl Supplier {
    pub fn new(exchange: Arc<Exchange>, ledger: Arc<Ledger>, products: Vec<ProductId>, config: SupplierConfig) -> Self {
        Self {
            exchange,
            ledger,
            products,
            config,
            running: AtomicBool::new(false),
        }
    }

    /// Runs the ticker until `shutdown` is cancelled. Idempotent: a second
    /// concurrent call returns immediately rather than running two loops.
    pub async fn run(&self, shutdown: CancellationToken) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("supplier already running, ignoring duplicate start");
            return;
        }

        tracing::info!(tick_ms = ?self.config.tick_interval, "supplier starting");
        let mut timer = tokio::time::interval(self.config.tick_interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("supplier shutting down");
                    break;
                }
                _ = timer.tick() => {
                    if let Err(err) = self.tick().await {
                        tracing::warn!(error = %err, "supplier tick failed");
                    }
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
    }

    async fn tick(&self) -> AgentResult<()> {
        let Some(outlet) = self.ledger.find_outlet(&self.config.supplier_outlet_id).await else {
            tracing::warn!(outlet_id = %self.config.supplier_outlet_id, "supplier outlet not found, skipping tick");
            return Ok(());
        };
        if !outlet.is_open {
            tracing::debug!("supplier outlet closed, pausing");
            return Ok(());
        }

        for product_id in &self.products {
            let quantity = self.config.order_quantity.draw();
            let variance = rand::thread_rng().gen_range(-self.config.price_variance_percent..=self.config.price_variance_percent);
            let price = self.config.base_donut_price * (1.0 + variance / 100.0);

            self.exchange
                .submit_order(common::OrderSide::Sell, product_id, &self.config.supplier_outlet_id, quantity, price)
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuantityRange;
    use broadcaster::Broadcaster;
    use common::Outlet;
    use std::collections::HashSet;
    use std::time::Duration;
    use storage::Store;
    use storage::InMemoryStore;

    async fn make_supplier(products: &[&str], is_open: bool) -> (Supplier, Arc<Exchange>) {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_outlet(Outlet {
                outlet_id: "supplier-factory".to_string(),
                name: "Factory".to_string(),
                location: "depot".to_string(),
                balance: 0.0,
                margin_percent: 0.0,
                is_open,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        let broadcaster = Arc::new(Broadcaster::new());
        let ledger = Arc::new(Ledger::new(store.clone(), broadcaster.clone(), ledger::LedgerConfig::default()));
        ledger.rehydrate().await.unwrap();

        let known_products: HashSet<ProductId> = products.iter().map(|p| p.to_string()).collect();
        let exchange = Arc::new(Exchange::new(
            known_products,
            ledger.clone(),
            ledger.clone(),
            store,
            broadcaster,
        ));

        let config = SupplierConfig {
            supplier_outlet_id: "supplier-factory".to_string(),
            base_donut_price: 2.0,
            price_variance_percent: 5.0,
            order_quantity: QuantityRange::new(5, 20),
            tick_interval: Duration::from_millis(10),
        };
        let products = products.iter().map(|p| p.to_string()).collect();
        (Supplier::new(exchange.clone(), ledger, products, config), exchange)
    }

    #[tokio::test]
    async fn tick_submits_a_sell_order_per_product() {
        let (supplier, exchange) = make_supplier(&["glazed", "sprinkled"], true).await;

        supplier.tick().await.unwrap();

        let glazed = exchange.snapshot("glazed").await.unwrap();
        let sprinkled = exchange.snapshot("sprinkled").await.unwrap();
        assert_eq!(glazed.asks.len(), 1);
        assert_eq!(sprinkled.asks.len(), 1);
    }

    #[tokio::test]
    async fn tick_pauses_when_sentinel_outlet_is_closed() {
        let (supplier, exchange) = make_supplier(&["glazed"], false).await;

        supplier.tick().await.unwrap();

        assert!(exchange.snapshot("glazed").await.is_none());
    }

    #[tokio::test]
    async fn double_start_is_a_no_op() {
        let (supplier, _exchange) = make_supplier(&["glazed"], true).await;
        let supplier = Arc::new(supplier);
        let token = CancellationToken::new();

        let first = tokio::spawn({
            let supplier = supplier.clone();
            let token = token.clone();
            async move { supplier.run(token).await }
        });
        tokio::time::sleep(Duration::from_millis(5)).await;

        // second run should bail out immediately rather than racing the first
        supplier.run(token.clone()).await;

        token.cancel();
        first.await.unwrap();
    }
}
