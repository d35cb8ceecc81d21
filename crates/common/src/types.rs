//! Domain types shared across the exchange engine
//!
//! These are the entities of §3 of the engine design: outlets, donut
//! products, orders, fills, inventory, and customer sales. Datetimes are
//! serialised without a timezone suffix (ISO-8601 local) since the Store
//! boundary this crate talks to expects that format.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an outlet (e.g. `"supplier-factory"`, `"donut-hut-3"`).
pub type OutletId = String;

/// Unique identifier for a donut product (e.g. `"glazed"`).
pub type ProductId = String;

pub fn serialize_local<S: serde::Serializer>(
    dt: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

pub fn deserialize_local<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let s = String::deserialize(deserializer)?;
    let naive = NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(serde::de::Error::custom)?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// A timestamp serialised the way the Store boundary expects: ISO-8601 with
/// no timezone suffix.
pub mod local_time {
    pub use super::{deserialize_local as deserialize, serialize_local as serialize};
}

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, OrderSide::Buy)
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Order lifecycle status. Once in a terminal state ([`Filled`],
/// [`Cancelled`]) an order never returns to [`Active`].
///
/// [`Filled`]: OrderStatus::Filled
/// [`Cancelled`]: OrderStatus::Cancelled
/// [`Active`]: OrderStatus::Active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Active,
    PartiallyFilled,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }

    pub fn is_resident(&self) -> bool {
        matches!(self, OrderStatus::Active | OrderStatus::PartiallyFilled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Active => write!(f, "ACTIVE"),
            OrderStatus::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            OrderStatus::Filled => write!(f, "FILLED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A tradeable donut product. The catalogue is static bootstrap data
/// (outside this crate's concerns) and is passed in at wiring time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonutType {
    pub donut_type_id: ProductId,
    pub name: String,
    pub description: String,
}

/// A resting or historical order in a product's book.
///
/// `quantity` is the original, immutable size of the order; `filled_quantity`
/// accumulates as fills land against it. `remaining()` derives what is left
/// to match. This separation keeps §8's invariant
/// (`Σ fills.quantity ≤ Order.quantity`, equality ⇒ `FILLED`) literal rather
/// than re-deriving the original size from a field that the matcher mutates
/// in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub side: OrderSide,
    pub product_id: ProductId,
    pub outlet_id: OutletId,
    pub quantity: i64,
    pub filled_quantity: i64,
    pub price_per_unit: f64,
    pub status: OrderStatus,
    /// Monotonic tiebreaker for price-time priority; authoritative over
    /// wall-clock `created_at`, which is kept only for display (§9).
    pub sequence: u64,
    #[serde(with = "local_time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "local_time")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn remaining(&self) -> i64 {
        self.quantity - self.filled_quantity
    }

    /// Applies a fill of `qty` units, advancing status to `PartiallyFilled`
    /// or `Filled` as appropriate. Does not touch the book; callers own that.
    pub fn apply_fill(&mut self, qty: i64, now: DateTime<Utc>) {
        self.filled_quantity += qty;
        self.status = if self.remaining() <= 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = now;
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = OrderStatus::Cancelled;
        self.updated_at = now;
    }
}

/// A single quantity match between a buy and sell order at one price.
/// Append-only once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub transaction_id: String,
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub buyer_outlet_id: OutletId,
    pub seller_outlet_id: OutletId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub price_per_unit: f64,
    pub total_amount: f64,
    #[serde(with = "local_time")]
    pub executed_at: DateTime<Utc>,
}

/// Per-(outlet, product) resident inventory count. Never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryCell {
    pub outlet_id: OutletId,
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A retail sale of inventory directly to a simulated customer, outside the
/// book, priced off an outlet's margin rather than a quoted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSale {
    pub sale_id: String,
    pub outlet_id: OutletId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub cost_basis: f64,
    pub revenue: f64,
    pub profit: f64,
    #[serde(with = "local_time")]
    pub executed_at: DateTime<Utc>,
}

/// Derived, cached per-outlet sales aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesStats {
    pub customer_sales_revenue: f64,
    pub customer_sales_count: u64,
    pub exchange_sales_revenue: f64,
    pub exchange_sales_count: u64,
}

/// A participant outlet: a retail shop, or the sentinel supplier factory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outlet {
    pub outlet_id: OutletId,
    pub name: String,
    pub location: String,
    pub balance: f64,
    pub margin_percent: f64,
    pub is_open: bool,
    #[serde(with = "local_time")]
    pub created_at: DateTime<Utc>,
}

impl Outlet {
    /// Whether this is the sentinel supplier outlet, which participates in
    /// the book but is excluded from retail listings and leaderboards (§9).
    pub fn is_sentinel(&self, supplier_outlet_id: &str) -> bool {
        self.outlet_id == supplier_outlet_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_side_opposite() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }

    #[test]
    fn order_apply_fill_transitions_status() {
        let now = Utc::now();
        let mut order = Order {
            order_id: "order-1".into(),
            side: OrderSide::Buy,
            product_id: "glazed".into(),
            outlet_id: "donut-hut-1".into(),
            quantity: 10,
            filled_quantity: 0,
            price_per_unit: 2.0,
            status: OrderStatus::Active,
            sequence: 1,
            created_at: now,
            updated_at: now,
        };

        order.apply_fill(4, now);
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.remaining(), 6);

        order.apply_fill(6, now);
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.remaining(), 0);
    }

    #[test]
    fn order_status_terminal() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Active.is_terminal());
        assert!(!OrderStatus::PartiallyFilled.is_terminal());
    }

    #[test]
    fn local_time_round_trips_without_tz_suffix() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            #[serde(with = "local_time")]
            at: DateTime<Utc>,
        }

        let w = Wrapper { at: Utc::now() };
        let json = serde_json::to_string(&w).unwrap();
        assert!(!json.contains('Z'), "expected no timezone suffix: {json}");
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            w.at.format("%Y-%m-%dT%H:%M:%S").to_string()
        );
    }
}
