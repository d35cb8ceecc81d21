//! The Ledger: sole authority for outlet balance and inventory mutations
//! (§4.3). Maintains a write-through in-memory view over a [`Store`] and
//! exposes [`common::SettlementHandle`] so the matching engine can command
//! settlement without depending on how balances are actually persisted.

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::stats::{LeaderboardEntry, OutletStats};
use async_trait::async_trait;
use broadcaster::{Broadcaster, Event};
use common::{
    CustomerSale, OutletDirectory, OutletId, ProductId, SalesStats, SequenceGenerator, SettlementError,
    SettlementHandle,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use storage::Store;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    outlets: HashMap<OutletId, common::Outlet>,
    inventory: HashMap<(OutletId, ProductId), i64>,
    stats: HashMap<OutletId, SalesStats>,
}

pub struct Ledger {
    state: RwLock<LedgerState>,
    store: Arc<dyn Store>,
    broadcaster: Arc<Broadcaster>,
    sequence: SequenceGenerator,
    config: LedgerConfig,
}

impl Ledger {
    pub fn new(store: Arc<dyn Store>, broadcaster: Arc<Broadcaster>, config: LedgerConfig) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            store,
            broadcaster,
            sequence: SequenceGenerator::new(),
            config,
        }
    }

    /// Loads outlets, inventory and derived sales stats from the store
    /// (§4.3, §7 error kind 5: rehydration failure aborts boot — callers
    /// should propagate this error straight into process startup failure).
    pub async fn rehydrate(&self) -> LedgerResult<()> {
        let outlets = self.store.find_all_outlets().await?;
        let inventory = self.store.load_all_inventory().await?;
        let stats = self.store.aggregate_customer_sales_by_outlet().await?;

        let mut state = self.state.write().await;
        state.outlets = outlets.into_iter().map(|o| (o.outlet_id.clone(), o)).collect();
        state.inventory = inventory
            .into_iter()
            .map(|cell| ((cell.outlet_id, cell.product_id), cell.quantity))
            .collect();
        state.stats = stats;
        Ok(())
    }

    /// Retries a persistence write once after a short delay; on repeated
    /// failure emits an `Error` event and otherwise continues (§7 error
    /// kind 4). The in-memory state is never rolled back.
    async fn write_through<F, Fut>(&self, label: &str, mut op: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = storage::StoreResult<()>>,
    {
        if op().await.is_ok() {
            return;
        }
        tracing::warn!(op = label, "ledger store write failed, retrying once");
        tokio::time::sleep(Duration::from_millis(50)).await;
        if let Err(err) = op().await {
            tracing::error!(op = label, error = %err, "ledger store write failed after retry");
            self.broadcaster
                .publish(Event::error("ledger", format!("persistence failure in {label}: {err}")))
                .await;
        }
    }

    pub async fn find_outlet(&self, outlet_id: &str) -> Option<common::Outlet> {
        self.state.read().await.outlets.get(outlet_id).cloned()
    }

    /// Snapshot of every known outlet, sentinel included. Callers that need
    /// to walk the roster (agents, leaderboards) filter it themselves.
    pub async fn all_outlets(&self) -> Vec<common::Outlet> {
        self.state.read().await.outlets.values().cloned().collect()
    }

    pub async fn inventory_of(&self, outlet_id: &str, product_id: &str) -> i64 {
        *self
            .state
            .read()
            .await
            .inventory
            .get(&(outlet_id.to_string(), product_id.to_string()))
            .unwrap_or(&0)
    }

    pub async fn add_inventory(&self, outlet_id: &str, product_id: &str, qty: i64) -> LedgerResult<()> {
        if qty <= 0 {
            return Err(LedgerError::InvalidQuantity(qty));
        }
        self.ensure_outlet_exists(outlet_id).await?;
        let new_qty = {
            let mut state = self.state.write().await;
            let entry = state
                .inventory
                .entry((outlet_id.to_string(), product_id.to_string()))
                .or_insert(0);
            *entry += qty;
            *entry
        };
        let (outlet_id, product_id) = (outlet_id.to_string(), product_id.to_string());
        self.write_through("set_inventory", || self.store.set_inventory(&outlet_id, &product_id, new_qty))
            .await;
        Ok(())
    }

    pub async fn remove_inventory(&self, outlet_id: &str, product_id: &str, qty: i64) -> LedgerResult<()> {
        if qty <= 0 {
            return Err(LedgerError::InvalidQuantity(qty));
        }
        self.ensure_outlet_exists(outlet_id).await?;
        let new_qty = {
            let mut state = self.state.write().await;
            let key = (outlet_id.to_string(), product_id.to_string());
            let have = *state.inventory.get(&key).unwrap_or(&0);
            if have < qty {
                return Err(LedgerError::InsufficientInventory {
                    outlet_id: outlet_id.to_string(),
                    product_id: product_id.to_string(),
                    have,
                    need: qty,
                });
            }
            let remaining = have - qty;
            state.inventory.insert(key, remaining);
            remaining
        };
        let (outlet_id, product_id) = (outlet_id.to_string(), product_id.to_string());
        self.write_through("set_inventory", || self.store.set_inventory(&outlet_id, &product_id, new_qty))
            .await;
        Ok(())
    }

    pub async fn set_inventory(&self, outlet_id: &str, product_id: &str, qty: i64) -> LedgerResult<()> {
        if qty < 0 {
            return Err(LedgerError::InvalidQuantity(qty));
        }
        self.ensure_outlet_exists(outlet_id).await?;
        {
            let mut state = self.state.write().await;
            state
                .inventory
                .insert((outlet_id.to_string(), product_id.to_string()), qty);
        }
        let (outlet_id, product_id) = (outlet_id.to_string(), product_id.to_string());
        self.write_through("set_inventory", || self.store.set_inventory(&outlet_id, &product_id, qty))
            .await;
        Ok(())
    }

    pub async fn set_margin(&self, outlet_id: &str, margin_percent: f64) -> LedgerResult<()> {
        {
            let mut state = self.state.write().await;
            let outlet = state
                .outlets
                .get_mut(outlet_id)
                .ok_or_else(|| LedgerError::UnknownOutlet(outlet_id.to_string()))?;
            outlet.margin_percent = margin_percent;
        }
        let outlet_id = outlet_id.to_string();
        self.write_through("update_margin", || self.store.update_margin(&outlet_id, margin_percent))
            .await;
        Ok(())
    }

    pub async fn set_open(&self, outlet_id: &str, is_open: bool) -> LedgerResult<()> {
        {
            let mut state = self.state.write().await;
            let outlet = state
                .outlets
                .get_mut(outlet_id)
                .ok_or_else(|| LedgerError::UnknownOutlet(outlet_id.to_string()))?;
            outlet.is_open = is_open;
        }
        let outlet_id = outlet_id.to_string();
        self.write_through("set_open", || self.store.set_open(&outlet_id, is_open)).await;
        Ok(())
    }

    pub async fn set_all_open(&self, is_open: bool) -> LedgerResult<()> {
        {
            let mut state = self.state.write().await;
            for outlet in state.outlets.values_mut() {
                outlet.is_open = is_open;
            }
        }
        self.write_through("set_all_open", || self.store.set_all_open(is_open)).await;
        Ok(())
    }

    /// Sells `qty` units of `product_id` from `outlet_id`'s retail stock to
    /// a simulated customer (§4.3, §4.5 step 3). Fire-and-forget on the
    /// persistence side per §7: cash and inventory move regardless of
    /// whether the sale record itself lands in the store.
    pub async fn sell_to_customer(&self, outlet_id: &str, product_id: &str, qty: i64) -> LedgerResult<CustomerSale> {
        if qty <= 0 {
            return Err(LedgerError::InvalidQuantity(qty));
        }

        let cost_basis = self.config.base_donut_price * qty as f64;

        let (revenue, new_balance, new_inventory) = {
            let mut state = self.state.write().await;
            let margin_percent = state
                .outlets
                .get(outlet_id)
                .ok_or_else(|| LedgerError::UnknownOutlet(outlet_id.to_string()))?
                .margin_percent;

            let key = (outlet_id.to_string(), product_id.to_string());
            let have = *state.inventory.get(&key).unwrap_or(&0);
            if have < qty {
                return Err(LedgerError::InsufficientInventory {
                    outlet_id: outlet_id.to_string(),
                    product_id: product_id.to_string(),
                    have,
                    need: qty,
                });
            }

            let revenue = cost_basis * (1.0 + margin_percent / 100.0);
            let new_inventory = have - qty;
            state.inventory.insert(key, new_inventory);

            let outlet = state.outlets.get_mut(outlet_id).expect("checked above");
            outlet.balance += revenue;
            let new_balance = outlet.balance;

            let stats = state.stats.entry(outlet_id.to_string()).or_default();
            stats.customer_sales_revenue += revenue;
            stats.customer_sales_count += 1;

            (revenue, new_balance, new_inventory)
        };

        self.write_through("update_balance", {
            let store = self.store.clone();
            let outlet_id = outlet_id.to_string();
            move || {
                let store = store.clone();
                let outlet_id = outlet_id.clone();
                async move { store.update_balance(&outlet_id, new_balance).await }
            }
        })
        .await;
        self.write_through("set_inventory", {
            let store = self.store.clone();
            let outlet_id = outlet_id.to_string();
            let product_id = product_id.to_string();
            move || {
                let store = store.clone();
                let outlet_id = outlet_id.clone();
                let product_id = product_id.clone();
                async move { store.set_inventory(&outlet_id, &product_id, new_inventory).await }
            }
        })
        .await;

        let profit = revenue - cost_basis;
        let (sale_id, _) = self.sequence.next_id("sale");
        let sale = CustomerSale {
            sale_id,
            outlet_id: outlet_id.to_string(),
            product_id: product_id.to_string(),
            quantity: qty,
            cost_basis,
            revenue,
            profit,
            executed_at: chrono::Utc::now(),
        };

        let store = self.store.clone();
        let sale_for_store = sale.clone();
        let broadcaster = self.broadcaster.clone();
        let outlet_id_owned = outlet_id.to_string();
        let product_id_owned = product_id.to_string();
        tokio::spawn(async move {
            if let Err(err) = store.insert_customer_sale(sale_for_store).await {
                tracing::warn!(
                    outlet_id = %outlet_id_owned,
                    product_id = %product_id_owned,
                    error = %err,
                    "customer sale persistence failed (fire-and-forget)"
                );
                broadcaster
                    .publish(Event::error("ledger", format!("customer sale persistence failed: {err}")))
                    .await;
            }
        });

        self.broadcaster
            .publish(Event::CustomerPurchased { sale: sale.clone() })
            .await;

        Ok(sale)
    }

    pub async fn stats(&self, outlet_id: &str) -> LedgerResult<OutletStats> {
        let state = self.state.read().await;
        let outlet = state
            .outlets
            .get(outlet_id)
            .ok_or_else(|| LedgerError::UnknownOutlet(outlet_id.to_string()))?;
        let sales = state.stats.get(outlet_id).copied().unwrap_or_default();
        Ok(OutletStats {
            sales,
            balance: outlet.balance,
            net_profit: outlet.balance - self.config.initial_outlet_balance,
        })
    }

    /// Non-sentinel outlets sorted by `net_profit` descending (§4.3, §9).
    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let state = self.state.read().await;
        let mut entries: Vec<LeaderboardEntry> = state
            .outlets
            .values()
            .filter(|o| !o.is_sentinel(&self.config.supplier_outlet_id))
            .map(|o| LeaderboardEntry {
                outlet_id: o.outlet_id.clone(),
                net_profit: o.balance - self.config.initial_outlet_balance,
            })
            .collect();
        entries.sort_by(|a, b| b.net_profit.partial_cmp(&a.net_profit).unwrap_or(std::cmp::Ordering::Equal));
        entries
    }

    async fn ensure_outlet_exists(&self, outlet_id: &str) -> LedgerResult<()> {
        if self.state.read().await.outlets.contains_key(outlet_id) {
            Ok(())
        } else {
            Err(LedgerError::UnknownOutlet(outlet_id.to_string()))
        }
    }
}

#[async_trait]
impl SettlementHandle for Ledger {
    /// Moves cash from buyer to seller and credits buyer inventory for one
    /// fill (§4.2). Seller inventory is intentionally left untouched — see
    /// the open question on uncovered sell orders in the design notes.
    /// Aborts the whole transfer with [`SettlementError::Overdraw`] if the
    /// buyer cannot afford it; no partial settlement.
    async fn settle_fill(
        &self,
        buyer_outlet_id: &str,
        seller_outlet_id: &str,
        product_id: &str,
        quantity: i64,
        price_per_unit: f64,
    ) -> Result<(), SettlementError> {
        let total = quantity as f64 * price_per_unit;

        let (buyer_balance, seller_balance, buyer_inventory) = {
            let mut state = self.state.write().await;

            let buyer_balance_before = state
                .outlets
                .get(buyer_outlet_id)
                .ok_or_else(|| SettlementError::UnknownOutlet(buyer_outlet_id.to_string()))?
                .balance;
            if state.outlets.get(seller_outlet_id).is_none() {
                return Err(SettlementError::UnknownOutlet(seller_outlet_id.to_string()));
            }

            if buyer_balance_before < total {
                return Err(SettlementError::Overdraw {
                    outlet_id: buyer_outlet_id.to_string(),
                    quantity,
                    price: price_per_unit,
                });
            }

            let buyer = state.outlets.get_mut(buyer_outlet_id).expect("checked above");
            buyer.balance -= total;
            let buyer_balance = buyer.balance;

            let seller = state.outlets.get_mut(seller_outlet_id).expect("checked above");
            seller.balance += total;
            let seller_balance = seller.balance;

            let key = (buyer_outlet_id.to_string(), product_id.to_string());
            let buyer_inventory = state.inventory.entry(key).or_insert(0);
            *buyer_inventory += quantity;
            let buyer_inventory = *buyer_inventory;

            for (outlet_id, amount) in [(buyer_outlet_id, total), (seller_outlet_id, total)] {
                let stats = state.stats.entry(outlet_id.to_string()).or_default();
                stats.exchange_sales_revenue += amount;
                stats.exchange_sales_count += 1;
            }

            (buyer_balance, seller_balance, buyer_inventory)
        };

        let store = self.store.clone();
        let buyer_outlet_id = buyer_outlet_id.to_string();
        let seller_outlet_id = seller_outlet_id.to_string();
        let product_id = product_id.to_string();
        self.write_through("update_balance(buyer)", {
            let store = store.clone();
            let buyer_outlet_id = buyer_outlet_id.clone();
            move || {
                let store = store.clone();
                let buyer_outlet_id = buyer_outlet_id.clone();
                async move { store.update_balance(&buyer_outlet_id, buyer_balance).await }
            }
        })
        .await;
        self.write_through("update_balance(seller)", {
            let store = store.clone();
            let seller_outlet_id = seller_outlet_id.clone();
            move || {
                let store = store.clone();
                let seller_outlet_id = seller_outlet_id.clone();
                async move { store.update_balance(&seller_outlet_id, seller_balance).await }
            }
        })
        .await;
        self.write_through("set_inventory(buyer)", {
            let store = store.clone();
            let buyer_outlet_id = buyer_outlet_id.clone();
            let product_id = product_id.clone();
            move || {
                let store = store.clone();
                let buyer_outlet_id = buyer_outlet_id.clone();
                let product_id = product_id.clone();
                async move {
                    store.set_inventory(&buyer_outlet_id, &product_id, buyer_inventory).await
                }
            }
        })
        .await;

        Ok(())
    }
}

#[async_trait]
impl OutletDirectory for Ledger {
    async fn outlet_status(&self, outlet_id: &str) -> Option<bool> {
        self.state.read().await.outlets.get(outlet_id).map(|o| o.is_open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Outlet;
    use storage::InMemoryStore;

    async fn ledger_with_outlets(outlets: &[(&str, f64, f64)]) -> Ledger {
        let store = Arc::new(InMemoryStore::new());
        for (id, balance, margin) in outlets {
            store
                .insert_outlet(Outlet {
                    outlet_id: id.to_string(),
                    name: id.to_string(),
                    location: "main st".to_string(),
                    balance: *balance,
                    margin_percent: *margin,
                    is_open: true,
                    created_at: chrono::Utc::now(),
                })
                .await
                .unwrap();
        }
        let ledger = Ledger::new(store, Arc::new(Broadcaster::new()), LedgerConfig::default());
        ledger.rehydrate().await.unwrap();
        ledger
    }

    #[tokio::test]
    async fn settle_fill_moves_cash_and_credits_buyer_inventory() {
        let ledger = ledger_with_outlets(&[("buyer", 100.0, 25.0), ("seller", 0.0, 25.0)]).await;

        ledger
            .settle_fill("buyer", "seller", "glazed", 4, 3.0)
            .await
            .unwrap();

        assert_eq!(ledger.find_outlet("buyer").await.unwrap().balance, 88.0);
        assert_eq!(ledger.find_outlet("seller").await.unwrap().balance, 12.0);
        assert_eq!(ledger.inventory_of("buyer", "glazed").await, 4);
        assert_eq!(ledger.inventory_of("seller", "glazed").await, 0);
    }

    #[tokio::test]
    async fn settle_fill_aborts_on_overdraw() {
        let ledger = ledger_with_outlets(&[("buyer", 5.0, 25.0), ("seller", 0.0, 25.0)]).await;

        let result = ledger.settle_fill("buyer", "seller", "glazed", 1, 10.0).await;

        assert_matches::assert_matches!(result, Err(SettlementError::Overdraw { .. }));
        assert_eq!(ledger.find_outlet("buyer").await.unwrap().balance, 5.0);
        assert_eq!(ledger.inventory_of("buyer", "glazed").await, 0);
    }

    #[tokio::test]
    async fn sell_to_customer_computes_margin_math() {
        let ledger = ledger_with_outlets(&[("hut", 10_000.0, 25.0)]).await;
        ledger.set_inventory("hut", "glazed", 10).await.unwrap();

        let sale = ledger.sell_to_customer("hut", "glazed", 4).await.unwrap();

        assert_eq!(sale.cost_basis, 8.0);
        assert_eq!(sale.revenue, 10.0);
        assert_eq!(sale.profit, 2.0);
        assert_eq!(ledger.find_outlet("hut").await.unwrap().balance, 10_010.0);
        assert_eq!(ledger.inventory_of("hut", "glazed").await, 6);
    }

    #[tokio::test]
    async fn sell_to_customer_rejects_insufficient_inventory() {
        let ledger = ledger_with_outlets(&[("hut", 10_000.0, 25.0)]).await;
        ledger.set_inventory("hut", "glazed", 2).await.unwrap();

        let result = ledger.sell_to_customer("hut", "glazed", 4).await;

        assert_matches::assert_matches!(result, Err(LedgerError::InsufficientInventory { .. }));
    }

    #[tokio::test]
    async fn all_outlets_returns_every_outlet_including_sentinel() {
        let ledger = ledger_with_outlets(&[("supplier-factory", 0.0, 0.0), ("hut-a", 1_000.0, 25.0)]).await;

        let outlets = ledger.all_outlets().await;

        assert_eq!(outlets.len(), 2);
        assert!(outlets.iter().any(|o| o.outlet_id == "supplier-factory"));
        assert!(outlets.iter().any(|o| o.outlet_id == "hut-a"));
    }

    #[tokio::test]
    async fn leaderboard_excludes_sentinel_and_sorts_descending() {
        let ledger = ledger_with_outlets(&[
            ("supplier-factory", 1_000_000.0, 0.0),
            ("hut-a", 12_000.0, 25.0),
            ("hut-b", 8_000.0, 25.0),
        ])
        .await;

        let board = ledger.leaderboard().await;

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].outlet_id, "hut-a");
        assert_eq!(board[1].outlet_id, "hut-b");
    }
}
