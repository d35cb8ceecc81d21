//! Engine configuration: one flat struct layered over built-in defaults,
//! following the workspace's serde + serde_yaml pattern (§6).

use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod validator;

pub use parser::*;
pub use validator::*;

/// An inclusive `[min, max]` range used for agent random-quantity draws.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct QuantityRange {
    pub min: i64,
    pub max: i64,
}

impl QuantityRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "defaults::default_base_donut_price")]
    pub base_donut_price: f64,

    #[serde(default = "defaults::default_initial_outlet_balance")]
    pub initial_outlet_balance: f64,

    #[serde(default = "defaults::default_supplier_outlet_id")]
    pub supplier_outlet_id: String,

    #[serde(default = "defaults::default_supplier_tick_ms")]
    pub supplier_tick_ms: u64,

    #[serde(default = "defaults::default_purchaser_tick_ms")]
    pub purchaser_tick_ms: u64,

    #[serde(default = "defaults::default_customer_tick_ms")]
    pub customer_tick_ms: u64,

    #[serde(default = "defaults::default_margin_percent")]
    pub default_margin_percent: f64,

    /// Bounded range for the Supplier's per-tick, per-product SELL quantity.
    #[serde(default = "defaults::default_supplier_order_quantity")]
    pub supplier_order_quantity: QuantityRange,

    /// Percent variance applied either way to a product's base price when
    /// the Supplier quotes its SELL order.
    #[serde(default = "defaults::default_supplier_price_variance_percent")]
    pub supplier_price_variance_percent: f64,

    /// Bounded range for the PurchasingAgent's per-tick BUY quantity,
    /// before the available-cash cap is applied.
    #[serde(default = "defaults::default_purchaser_order_quantity")]
    pub purchaser_order_quantity: QuantityRange,

    /// Bounded range for a simulated customer's single purchase quantity.
    #[serde(default = "defaults::default_customer_purchase_quantity")]
    pub customer_purchase_quantity: QuantityRange,

    /// Bounded range for the number of products on a customer's shopping list.
    #[serde(default = "defaults::default_customer_shopping_list_size")]
    pub customer_shopping_list_size: QuantityRange,

    /// Port the Prometheus exporter listens on (`observability::init_metrics`).
    #[serde(default = "defaults::default_metrics_port")]
    pub metrics_port: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        parser::generate_default_config()
    }
}
