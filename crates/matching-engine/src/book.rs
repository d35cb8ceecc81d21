//! The per-product order book (§4.1). Two price-indexed, time-ordered
//! queues; stateless beyond ordering. Only orders with status ∈ {ACTIVE,
//! PARTIALLY_FILLED} are resident — a transition to FILLED/CANCELLED
//! removes the order from the book.

use chrono::{DateTime, Utc};
use common::{Order, OrderSide, OrderStatus};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, VecDeque};

/// One aggregated price level in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price_per_unit: f64,
    pub quantity: i64,
    pub order_count: usize,
}

/// A read-only view of a product's book, safe to hand to observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub product_id: String,
    /// Best bid first.
    pub bids: Vec<PriceLevel>,
    /// Best ask first.
    pub asks: Vec<PriceLevel>,
}

/// A single product's two-sided book.
///
/// Bids are keyed by `Reverse(price)` so the map iterates highest price
/// first; asks are keyed by plain price so the map iterates lowest price
/// first. Within a price level, orders are a FIFO `VecDeque` — time
/// priority falls out of always pushing to the back and scanning from the
/// front.
#[derive(Debug, Default)]
pub struct Book {
    bids: BTreeMap<Reverse<OrderedFloat<f64>>, VecDeque<Order>>,
    asks: BTreeMap<OrderedFloat<f64>, VecDeque<Order>>,
}

impl Book {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, order: Order) {
        match order.side {
            OrderSide::Buy => self
                .bids
                .entry(Reverse(OrderedFloat(order.price_per_unit)))
                .or_default()
                .push_back(order),
            OrderSide::Sell => self
                .asks
                .entry(OrderedFloat(order.price_per_unit))
                .or_default()
                .push_back(order),
        }
    }

    /// Returns a clone of the highest-priority resting order on `side`
    /// belonging to an outlet other than `exclude_outlet_id`, scanning
    /// price levels in priority order and, within a level, in arrival
    /// order (§4.2 self-trade policy: skip, don't remove, the excluded
    /// counterparty).
    pub fn best_counterparty(&self, side: OrderSide, exclude_outlet_id: &str) -> Option<Order> {
        match side {
            OrderSide::Buy => Self::scan(self.bids.values(), exclude_outlet_id),
            OrderSide::Sell => Self::scan(self.asks.values(), exclude_outlet_id),
        }
    }

    fn scan<'a>(
        levels: impl Iterator<Item = &'a VecDeque<Order>>,
        exclude_outlet_id: &str,
    ) -> Option<Order> {
        for level in levels {
            if let Some(order) = level.iter().find(|o| o.outlet_id != exclude_outlet_id) {
                return Some(order.clone());
            }
        }
        None
    }

    /// Applies a fill of `qty` units to the resting order identified by
    /// `(side, price_per_unit, order_id)`. Removes it from the book (and
    /// cleans up an emptied price level) once it reaches a terminal
    /// status. Returns the order's post-fill state.
    pub fn apply_fill(
        &mut self,
        side: OrderSide,
        price_per_unit: f64,
        order_id: &str,
        qty: i64,
        now: DateTime<Utc>,
    ) -> Option<Order> {
        match side {
            OrderSide::Buy => {
                let key = Reverse(OrderedFloat(price_per_unit));
                let result = Self::apply_fill_at(self.bids.get_mut(&key)?, order_id, qty, now);
                self.bids.retain(|_, q| !q.is_empty());
                result
            }
            OrderSide::Sell => {
                let key = OrderedFloat(price_per_unit);
                let result = Self::apply_fill_at(self.asks.get_mut(&key)?, order_id, qty, now);
                self.asks.retain(|_, q| !q.is_empty());
                result
            }
        }
    }

    fn apply_fill_at(
        queue: &mut VecDeque<Order>,
        order_id: &str,
        qty: i64,
        now: DateTime<Utc>,
    ) -> Option<Order> {
        let idx = queue.iter().position(|o| o.order_id == order_id)?;
        queue[idx].apply_fill(qty, now);
        let updated = queue[idx].clone();
        if updated.status.is_terminal() {
            queue.remove(idx);
        }
        Some(updated)
    }

    /// Removes an order outright regardless of remaining quantity, marking
    /// it cancelled. Used for the settlement-abort path (§4.2, §8 scenario 5).
    pub fn cancel(&mut self, side: OrderSide, price_per_unit: f64, order_id: &str, now: DateTime<Utc>) -> Option<Order> {
        let remove_from = |queue: &mut VecDeque<Order>| -> Option<Order> {
            let idx = queue.iter().position(|o| o.order_id == order_id)?;
            let mut order = queue.remove(idx)?;
            order.cancel(now);
            Some(order)
        };
        match side {
            OrderSide::Buy => {
                let key = Reverse(OrderedFloat(price_per_unit));
                let result = remove_from(self.bids.get_mut(&key)?);
                self.bids.retain(|_, q| !q.is_empty());
                result
            }
            OrderSide::Sell => {
                let key = OrderedFloat(price_per_unit);
                let result = remove_from(self.asks.get_mut(&key)?);
                self.asks.retain(|_, q| !q.is_empty());
                result
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn snapshot(&self, product_id: &str) -> OrderBookSnapshot {
        let level = |price: f64, queue: &VecDeque<Order>| PriceLevel {
            price_per_unit: price,
            quantity: queue.iter().map(Order::remaining).sum(),
            order_count: queue.len(),
        };
        OrderBookSnapshot {
            product_id: product_id.to_string(),
            bids: self.bids.iter().map(|(p, q)| level(p.0 .0, q)).collect(),
            asks: self.asks.iter().map(|(p, q)| level(p.0, q)).collect(),
        }
    }
}

/// `BUY at p_b` crosses `ASK at p_a` iff `p_b >= p_a`; symmetric for sells
/// (§4.2 crossing rule). `incoming` and `resting` must be on opposite sides.
pub fn crosses(incoming: &Order, resting: &Order) -> bool {
    match incoming.side {
        OrderSide::Buy => incoming.price_per_unit >= resting.price_per_unit,
        OrderSide::Sell => incoming.price_per_unit <= resting.price_per_unit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(id: &str, side: OrderSide, outlet: &str, price: f64, qty: i64, sequence: u64) -> Order {
        let now = Utc::now();
        Order {
            order_id: id.to_string(),
            side,
            product_id: "glazed".to_string(),
            outlet_id: outlet.to_string(),
            quantity: qty,
            filled_quantity: 0,
            price_per_unit: price,
            status: OrderStatus::Active,
            sequence,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn best_counterparty_prefers_price_then_time() {
        let mut book = Book::new();
        book.insert(order("ask-1", OrderSide::Sell, "hut-a", 2.00, 5, 1));
        book.insert(order("ask-2", OrderSide::Sell, "hut-b", 1.90, 5, 2));

        let best = book.best_counterparty(OrderSide::Sell, "buyer").unwrap();
        assert_eq!(best.order_id, "ask-2");
    }

    #[test]
    fn best_counterparty_skips_same_outlet() {
        let mut book = Book::new();
        book.insert(order("ask-1", OrderSide::Sell, "hut-a", 2.00, 5, 1));

        assert!(book.best_counterparty(OrderSide::Sell, "hut-a").is_none());
    }

    #[test]
    fn apply_fill_removes_order_once_filled() {
        let mut book = Book::new();
        book.insert(order("ask-1", OrderSide::Sell, "hut-a", 2.00, 5, 1));

        let updated = book
            .apply_fill(OrderSide::Sell, 2.00, "ask-1", 5, Utc::now())
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Filled);
        assert!(book.is_empty());
    }

    #[test]
    fn apply_fill_leaves_partial_remainder_resident() {
        let mut book = Book::new();
        book.insert(order("ask-1", OrderSide::Sell, "hut-a", 2.00, 5, 1));

        let updated = book
            .apply_fill(OrderSide::Sell, 2.00, "ask-1", 2, Utc::now())
            .unwrap();
        assert_eq!(updated.status, OrderStatus::PartiallyFilled);
        assert!(!book.is_empty());
        assert_eq!(
            book.best_counterparty(OrderSide::Sell, "buyer").unwrap().remaining(),
            3
        );
    }

    #[test]
    fn crosses_is_symmetric_on_equal_price() {
        let bid = order("b", OrderSide::Buy, "x", 3.00, 1, 1);
        let ask = order("a", OrderSide::Sell, "y", 3.00, 1, 2);
        assert!(crosses(&bid, &ask));
        assert!(crosses(&ask, &bid));
    }
}
