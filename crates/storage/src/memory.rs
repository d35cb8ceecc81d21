//! An in-memory `Store` implementation. Data does not survive a restart;
//! useful for tests and for running the exchange without wiring up a real
//! durable backend.

use crate::error::{StoreError, StoreResult};
use crate::traits::Store;
use async_trait::async_trait;
use common::{CustomerSale, Fill, InventoryCell, Order, OrderStatus, Outlet, SalesStats};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    outlets: HashMap<String, Outlet>,
    inventory: HashMap<(String, String), i64>,
    orders: HashMap<String, Order>,
    transactions: Vec<Fill>,
    customer_sales: Vec<CustomerSale>,
}

pub struct InMemoryStore {
    state: RwLock<State>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn load_all_inventory(&self) -> StoreResult<Vec<InventoryCell>> {
        let state = self.state.read().await;
        Ok(state
            .inventory
            .iter()
            .map(|((outlet_id, product_id), qty)| InventoryCell {
                outlet_id: outlet_id.clone(),
                product_id: product_id.clone(),
                quantity: *qty,
            })
            .collect())
    }

    async fn set_inventory(&self, outlet_id: &str, product_id: &str, qty: i64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .inventory
            .insert((outlet_id.to_string(), product_id.to_string()), qty);
        Ok(())
    }

    async fn insert_outlet(&self, outlet: Outlet) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.outlets.insert(outlet.outlet_id.clone(), outlet);
        Ok(())
    }

    async fn find_outlet(&self, outlet_id: &str) -> StoreResult<Option<Outlet>> {
        let state = self.state.read().await;
        Ok(state.outlets.get(outlet_id).cloned())
    }

    async fn find_all_outlets(&self) -> StoreResult<Vec<Outlet>> {
        let state = self.state.read().await;
        Ok(state.outlets.values().cloned().collect())
    }

    async fn update_balance(&self, outlet_id: &str, balance: f64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let outlet = state
            .outlets
            .get_mut(outlet_id)
            .ok_or_else(|| StoreError::NotFound(outlet_id.to_string()))?;
        outlet.balance = balance;
        Ok(())
    }

    async fn update_margin(&self, outlet_id: &str, margin_percent: f64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let outlet = state
            .outlets
            .get_mut(outlet_id)
            .ok_or_else(|| StoreError::NotFound(outlet_id.to_string()))?;
        outlet.margin_percent = margin_percent;
        Ok(())
    }

    async fn set_open(&self, outlet_id: &str, is_open: bool) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let outlet = state
            .outlets
            .get_mut(outlet_id)
            .ok_or_else(|| StoreError::NotFound(outlet_id.to_string()))?;
        outlet.is_open = is_open;
        Ok(())
    }

    async fn set_all_open(&self, is_open: bool) -> StoreResult<()> {
        let mut state = self.state.write().await;
        for outlet in state.outlets.values_mut() {
            outlet.is_open = is_open;
        }
        Ok(())
    }

    async fn insert_order(&self, order: Order) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.orders.insert(order.order_id.clone(), order);
        Ok(())
    }

    async fn find_order_by_id(&self, order_id: &str) -> StoreResult<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(order_id).cloned())
    }

    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| StoreError::NotFound(order_id.to_string()))?;
        order.status = status;
        Ok(())
    }

    async fn update_order_quantity(&self, order_id: &str, filled_quantity: i64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| StoreError::NotFound(order_id.to_string()))?;
        order.filled_quantity = filled_quantity;
        Ok(())
    }

    async fn order_book(&self, product_id: &str, include_terminal: bool) -> StoreResult<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|o| o.product_id == product_id)
            .filter(|o| include_terminal || o.status.is_resident())
            .cloned()
            .collect())
    }

    async fn insert_transaction(&self, fill: Fill) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.transactions.push(fill);
        Ok(())
    }

    async fn find_transactions_by_product(&self, product_id: &str, limit: usize) -> StoreResult<Vec<Fill>> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.product_id == product_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_recent_transactions(&self, limit: usize) -> StoreResult<Vec<Fill>> {
        let state = self.state.read().await;
        Ok(state.transactions.iter().rev().take(limit).cloned().collect())
    }

    async fn insert_customer_sale(&self, sale: CustomerSale) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.customer_sales.push(sale);
        Ok(())
    }

    async fn aggregate_customer_sales_by_outlet(&self) -> StoreResult<HashMap<String, SalesStats>> {
        let state = self.state.read().await;
        let mut out: HashMap<String, SalesStats> = HashMap::new();
        for sale in &state.customer_sales {
            let stats = out.entry(sale.outlet_id.clone()).or_default();
            stats.customer_sales_revenue += sale.revenue;
            stats.customer_sales_count += 1;
        }
        for fill in &state.transactions {
            for outlet_id in [&fill.buyer_outlet_id, &fill.seller_outlet_id] {
                let stats = out.entry(outlet_id.clone()).or_default();
                stats.exchange_sales_revenue += fill.total_amount;
                stats.exchange_sales_count += 1;
            }
        }
        Ok(out)
    }
}
