//! The `Store` trait: the engine's only dependency on durable persistence.
//!
//! Everything on the other side of this trait — the embedded graph database
//! dialect the original system used, its schema, its query language — is a
//! collaborator this engine does not implement (§1, §6). Any backend that
//! can satisfy these methods is a valid Store.

use crate::error::StoreResult;
use async_trait::async_trait;
use common::{CustomerSale, Fill, InventoryCell, Order, OrderStatus, Outlet, SalesStats};

#[async_trait]
pub trait Store: Send + Sync {
    // -- Inventory -----------------------------------------------------
    async fn load_all_inventory(&self) -> StoreResult<Vec<InventoryCell>>;
    async fn set_inventory(&self, outlet_id: &str, product_id: &str, qty: i64) -> StoreResult<()>;

    // -- Outlets ---------------------------------------------------------
    async fn insert_outlet(&self, outlet: Outlet) -> StoreResult<()>;
    async fn find_outlet(&self, outlet_id: &str) -> StoreResult<Option<Outlet>>;
    async fn find_all_outlets(&self) -> StoreResult<Vec<Outlet>>;
    async fn update_balance(&self, outlet_id: &str, balance: f64) -> StoreResult<()>;
    async fn update_margin(&self, outlet_id: &str, margin_percent: f64) -> StoreResult<()>;
    async fn set_open(&self, outlet_id: &str, is_open: bool) -> StoreResult<()>;
    async fn set_all_open(&self, is_open: bool) -> StoreResult<()>;

    // -- Orders ------------------------------------------------------------
    async fn insert_order(&self, order: Order) -> StoreResult<()>;
    async fn find_order_by_id(&self, order_id: &str) -> StoreResult<Option<Order>>;
    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<()>;
    async fn update_order_quantity(&self, order_id: &str, filled_quantity: i64) -> StoreResult<()>;
    async fn order_book(&self, product_id: &str, include_terminal: bool) -> StoreResult<Vec<Order>>;

    // -- Transactions --------------------------------------------------
    async fn insert_transaction(&self, fill: Fill) -> StoreResult<()>;
    async fn find_transactions_by_product(&self, product_id: &str, limit: usize) -> StoreResult<Vec<Fill>>;
    async fn find_recent_transactions(&self, limit: usize) -> StoreResult<Vec<Fill>>;

    // -- Customer sales --------------------------------------------------
    async fn insert_customer_sale(&self, sale: CustomerSale) -> StoreResult<()>;
    async fn aggregate_customer_sales_by_outlet(&self) -> StoreResult<std::collections::HashMap<String, SalesStats>>;
}
