//! The CustomerSimulator (§4.5): each tick spawns one simulated customer
//! with a short shopping list, who buys directly from an outlet's retail
//! stock via [`Ledger::sell_to_customer`] rather than through the book.

use crate::config::CustomerConfig;
use crate::error::AgentResult;
use common::{Outlet, ProductId};
use ledger::Ledger;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CustomerType {
    FirstFind,
    PriceHunter,
}

/// Generates synthetic retail demand on a timer.
pub struct CustomerSimulator {
    ledger: Arc<Ledger>,
    products: Vec<ProductId>,
    config: CustomerConfig,
    running: AtomicBool,
}

impl CustomerSimulator {
    pub fn new(ledger: Arc<Ledger>, products: Vec<ProductId>, config: CustomerConfig) -> Self {
        Self {
            ledger,
            products,
            config,
            running: AtomicBool::new(false),
        }
    }

    pub async fn run(&self, shutdown: CancellationToken) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("customer simulator already running, ignoring duplicate start");
            return;
        }

        tracing::info!(tick_ms = ?self.config.tick_interval, "customer simulator starting");
        let mut timer = tokio::time::interval(self.config.tick_interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("customer simulator shutting down");
                    break;
                }
                _ = timer.tick() => {
                    if let Err(err) = self.tick().await {
                        tracing::warn!(error = %err, "customer simulator tick failed");
                    }
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
    }

    async fn tick(&self) -> AgentResult<()> {
        let (shopping_list, customer_type) = {
            let mut rng = rand::thread_rng();
            let mut shopping_list = self.products.clone();
            shopping_list.shuffle(&mut rng);
            let list_size = self.config.shopping_list_size.draw().max(0) as usize;
            shopping_list.truncate(list_size.min(shopping_list.len()));

            let customer_type = if rng.gen_bool(0.5) {
                CustomerType::FirstFind
            } else {
                CustomerType::PriceHunter
            };
            (shopping_list, customer_type)
        };

        let mut open_outlets: Vec<Outlet> = self
            .ledger
            .all_outlets()
            .await
            .into_iter()
            .filter(|o| o.is_open && o.outlet_id != self.config.supplier_outlet_id)
            .collect();
        if open_outlets.is_empty() {
            return Ok(());
        }

        match customer_type {
            CustomerType::FirstFind => {
                {
                    let mut rng = rand::thread_rng();
                    open_outlets.shuffle(&mut rng);
                }
                for product_id in &shopping_list {
                    self.buy_first_find(product_id, &open_outlets).await?;
                }
            }
            CustomerType::PriceHunter => {
                for product_id in &shopping_list {
                    self.buy_price_hunter(product_id, &open_outlets).await?;
                }
            }
        }

        Ok(())
    }

    async fn buy_first_find(&self, product_id: &str, outlets: &[Outlet]) -> AgentResult<()> {
        for outlet in outlets {
            let stock = self.ledger.inventory_of(&outlet.outlet_id, product_id).await;
            if stock <= 0 {
                continue;
            }
            let quantity = self.config.purchase_quantity.draw().min(stock);
            if quantity <= 0 {
                continue;
            }
            self.ledger.sell_to_customer(&outlet.outlet_id, product_id, quantity).await?;
            return Ok(());
        }
        Ok(())
    }

    async fn buy_price_hunter(&self, product_id: &str, outlets: &[Outlet]) -> AgentResult<()> {
        let mut best: Option<(&Outlet, f64, i64)> = None;
        for outlet in outlets {
            let stock = self.ledger.inventory_of(&outlet.outlet_id, product_id).await;
            if stock <= 0 {
                continue;
            }
            let price = self.config.base_donut_price * (1.0 + outlet.margin_percent / 100.0);
            if best.as_ref().map(|(_, best_price, _)| price < *best_price).unwrap_or(true) {
                best = Some((outlet, price, stock));
            }
        }

        let Some((outlet, _, stock)) = best else {
            return Ok(());
        };
        let quantity = self.config.purchase_quantity.draw().min(stock);
        if quantity <= 0 {
            return Ok(());
        }
        self.ledger.sell_to_customer(&outlet.outlet_id, product_id, quantity).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuantityRange;
    use broadcaster::Broadcaster;
    use std::time::Duration;
    use storage::{InMemoryStore, Store};

    async fn setup() -> (CustomerSimulator, Arc<Ledger>) {
        let store = Arc::new(InMemoryStore::new());
        for (id, margin) in [("supplier-factory", 0.0), ("hut-a", 50.0), ("hut-b", 10.0)] {
            store
                .insert_outlet(Outlet {
                    outlet_id: id.to_string(),
                    name: id.to_string(),
                    location: "main st".to_string(),
                    balance: 10_000.0,
                    margin_percent: margin,
                    is_open: true,
                    created_at: chrono::Utc::now(),
                })
                .await
                .unwrap();
        }

        let broadcaster = Arc::new(Broadcaster::new());
        let ledger = Arc::new(Ledger::new(store, broadcaster, ledger::LedgerConfig::default()));
        ledger.rehydrate().await.unwrap();
        ledger.set_inventory("hut-a", "glazed", 10).await.unwrap();
        ledger.set_inventory("hut-b", "glazed", 10).await.unwrap();

        let config = CustomerConfig {
            supplier_outlet_id: "supplier-factory".to_string(),
            base_donut_price: 2.0,
            purchase_quantity: QuantityRange::new(1, 3),
            shopping_list_size: QuantityRange::new(1, 1),
            tick_interval: Duration::from_millis(10),
        };
        (CustomerSimulator::new(ledger.clone(), vec!["glazed".to_string()], config), ledger)
    }

    #[tokio::test]
    async fn price_hunter_buys_from_the_lowest_margin_outlet() {
        let (sim, ledger) = setup().await;

        sim.buy_price_hunter("glazed", &ledger.all_outlets().await.into_iter().filter(|o| o.is_open).collect::<Vec<_>>())
            .await
            .unwrap();

        assert!(ledger.inventory_of("hut-b", "glazed").await < 10);
        assert_eq!(ledger.inventory_of("hut-a", "glazed").await, 10);
    }

    #[tokio::test]
    async fn first_find_buys_from_whichever_outlet_is_first_in_the_shuffled_order() {
        let (sim, ledger) = setup().await;
        let outlets = ledger.all_outlets().await.into_iter().filter(|o| o.is_open).collect::<Vec<_>>();

        sim.buy_first_find("glazed", &outlets).await.unwrap();

        let total_remaining = ledger.inventory_of("hut-a", "glazed").await + ledger.inventory_of("hut-b", "glazed").await;
        assert!(total_remaining < 20);
    }

    #[tokio::test]
    async fn tick_skips_products_with_no_stock_anywhere() {
        let (sim, ledger) = setup().await;
        ledger.set_inventory("hut-a", "glazed", 0).await.unwrap();
        ledger.set_inventory("hut-b", "glazed", 0).await.unwrap();

        sim.tick().await.unwrap();

        assert_eq!(ledger.inventory_of("hut-a", "glazed").await, 0);
        assert_eq!(ledger.inventory_of("hut-b", "glazed").await, 0);
    }
}
