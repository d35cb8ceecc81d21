//! Agent-relevant configuration. The full `EngineConfig` lives in the
//! `config` crate; these are the narrow slices each agent needs, so this
//! crate (like `ledger`) carries no dependency on `config` itself.

use rand::Rng;
use std::time::Duration;

/// An inclusive `[min, max]` range a quantity is drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantityRange {
    pub min: i64,
    pub max: i64,
}

impl QuantityRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn draw(&self) -> i64 {
        if self.min >= self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

#[derive(Debug, Clone)]
pub struct SupplierConfig {
    pub supplier_outlet_id: String,
    pub base_donut_price: f64,
    pub price_variance_percent: f64,
    pub order_quantity: QuantityRange,
    pub tick_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct PurchasingConfig {
    pub supplier_outlet_id: String,
    pub order_quantity: QuantityRange,
    pub tick_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct CustomerConfig {
    pub supplier_outlet_id: String,
    pub base_donut_price: f64,
    pub purchase_quantity: QuantityRange,
    pub shopping_list_size: QuantityRange,
    pub tick_interval: Duration,
}
