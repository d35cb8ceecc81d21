use crate::QuantityRange;

pub fn default_base_donut_price() -> f64 {
    2.0
}

pub fn default_initial_outlet_balance() -> f64 {
    10_000.0
}

pub fn default_supplier_outlet_id() -> String {
    "supplier-factory".to_string()
}

pub fn default_supplier_tick_ms() -> u64 {
    5_000
}

pub fn default_purchaser_tick_ms() -> u64 {
    4_000
}

pub fn default_customer_tick_ms() -> u64 {
    2_000
}

pub fn default_margin_percent() -> f64 {
    25.0
}

pub fn default_supplier_order_quantity() -> QuantityRange {
    QuantityRange::new(5, 20)
}

pub fn default_supplier_price_variance_percent() -> f64 {
    5.0
}

pub fn default_purchaser_order_quantity() -> QuantityRange {
    QuantityRange::new(1, 5)
}

pub fn default_customer_purchase_quantity() -> QuantityRange {
    QuantityRange::new(1, 3)
}

pub fn default_customer_shopping_list_size() -> QuantityRange {
    QuantityRange::new(1, 3)
}

pub fn default_metrics_port() -> u16 {
    9090
}
