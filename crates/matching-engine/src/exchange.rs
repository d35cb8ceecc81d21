//! The Matcher (§4.2), wired to a per-product [`Book`] and to the ledger's
//! [`SettlementHandle`]/[`OutletDirectory`] seams. `submit_order` is the
//! engine's single entry point: one call per submitted order, returning
//! only once the order has been matched/rested and persisted (§5).

use crate::book::Book;
use crate::error::{MatchError, MatchResult};
use broadcaster::{Broadcaster, Event};
use chrono::Utc;
use common::{Fill, Order, OrderSide, OrderStatus, OutletDirectory, OutletId, ProductId, SequenceGenerator, SettlementError, SettlementHandle};
use observability::EngineMetrics;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use storage::Store;
use tokio::sync::{Mutex, RwLock};

/// The order-matching core. Cheap to share via `Arc`.
pub struct Exchange {
    books: RwLock<HashMap<ProductId, Arc<Mutex<Book>>>>,
    known_products: HashSet<ProductId>,
    settlement: Arc<dyn SettlementHandle>,
    directory: Arc<dyn OutletDirectory>,
    store: Arc<dyn Store>,
    broadcaster: Arc<Broadcaster>,
    sequence: SequenceGenerator,
    metrics: Option<Arc<EngineMetrics>>,
}

impl Exchange {
    pub fn new(
        known_products: HashSet<ProductId>,
        settlement: Arc<dyn SettlementHandle>,
        directory: Arc<dyn OutletDirectory>,
        store: Arc<dyn Store>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            known_products,
            settlement,
            directory,
            store,
            broadcaster,
            sequence: SequenceGenerator::new(),
            metrics: None,
        }
    }

    /// Attaches the engine's counters. Optional: an `Exchange` with no
    /// metrics attached behaves identically, just uncounted.
    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    async fn book_for(&self, product_id: &str) -> Arc<Mutex<Book>> {
        if let Some(book) = self.books.read().await.get(product_id) {
            return book.clone();
        }
        let mut books = self.books.write().await;
        books
            .entry(product_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Book::new())))
            .clone()
    }

    /// Retries a persistence write once after a short delay, then gives up
    /// and reports it as an `Error` event rather than propagating failure
    /// into the match loop (§7 error kind 4).
    async fn write_through<F, Fut>(&self, label: &str, mut op: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = storage::StoreResult<()>>,
    {
        if op().await.is_ok() {
            return;
        }
        tracing::warn!(op = label, "matcher store write failed, retrying once");
        tokio::time::sleep(Duration::from_millis(50)).await;
        if let Err(err) = op().await {
            tracing::error!(op = label, error = %err, "matcher store write failed after retry");
            self.broadcaster
                .publish(Event::error("matcher", format!("persistence failure in {label}: {err}")))
                .await;
        }
    }

    async fn validate(&self, product_id: &str, outlet_id: &str, quantity: i64, price_per_unit: f64) -> MatchResult<()> {
        if quantity <= 0 {
            return Err(MatchError::InvalidQuantity(quantity));
        }
        if price_per_unit <= 0.0 {
            return Err(MatchError::InvalidPrice(price_per_unit));
        }
        if !self.known_products.contains(product_id) {
            return Err(MatchError::UnknownProduct(product_id.to_string()));
        }
        match self.directory.outlet_status(outlet_id).await {
            None => return Err(MatchError::UnknownOutlet(outlet_id.to_string())),
            Some(false) => return Err(MatchError::OutletClosed(outlet_id.to_string())),
            Some(true) => {}
        }
        Ok(())
    }

    /// Submits a new order and runs it through the Matcher (§4.2). Returns
    /// the order in its final status: `FILLED` if fully matched, `CANCELLED`
    /// if aborted by a settlement overdraw, or `ACTIVE`/`PARTIALLY_FILLED`
    /// if it now rests in the book.
    pub async fn submit_order(
        &self,
        side: OrderSide,
        product_id: &str,
        outlet_id: &str,
        quantity: i64,
        price_per_unit: f64,
    ) -> MatchResult<Order> {
        self.validate(product_id, outlet_id, quantity, price_per_unit).await?;
        if let Some(metrics) = &self.metrics {
            metrics.order_submitted();
        }

        let now = Utc::now();
        let (order_id, sequence) = self.sequence.next_id("order");
        let mut incoming = Order {
            order_id,
            side,
            product_id: product_id.to_string(),
            outlet_id: outlet_id.to_string(),
            quantity,
            filled_quantity: 0,
            price_per_unit,
            status: OrderStatus::Active,
            sequence,
            created_at: now,
            updated_at: now,
        };

        let book_handle = self.book_for(product_id).await;
        let mut book = book_handle.lock().await;

        'matching: while incoming.remaining() > 0 {
            let Some(resting) = book.best_counterparty(incoming.side.opposite(), &incoming.outlet_id) else {
                break;
            };
            if !crate::book::crosses(&incoming, &resting) {
                break;
            }

            let fill_qty = incoming.remaining().min(resting.remaining());
            let fill_price = resting.price_per_unit;

            let (buy_order_id, sell_order_id, buyer_outlet_id, seller_outlet_id) = match incoming.side {
                OrderSide::Buy => (
                    incoming.order_id.clone(),
                    resting.order_id.clone(),
                    incoming.outlet_id.clone(),
                    resting.outlet_id.clone(),
                ),
                OrderSide::Sell => (
                    resting.order_id.clone(),
                    incoming.order_id.clone(),
                    resting.outlet_id.clone(),
                    incoming.outlet_id.clone(),
                ),
            };

            match self
                .settlement
                .settle_fill(&buyer_outlet_id, &seller_outlet_id, product_id, fill_qty, fill_price)
                .await
            {
                Ok(()) => {}
                Err(SettlementError::Overdraw { .. }) => {
                    if let Some(metrics) = &self.metrics {
                        metrics.settlement_abort();
                    }
                    tracing::warn!(
                        buyer_outlet_id = %buyer_outlet_id,
                        product_id = %product_id,
                        quantity = fill_qty,
                        price = fill_price,
                        "settlement aborted on overdraw"
                    );
                    self.broadcaster
                        .publish(Event::error(
                            "matcher",
                            format!("settlement aborted: {buyer_outlet_id} would overdraw on {fill_qty}@{fill_price}"),
                        ))
                        .await;

                    if incoming.side == OrderSide::Buy {
                        incoming.cancel(now);
                        break 'matching;
                    } else {
                        book.cancel(resting.side, resting.price_per_unit, &resting.order_id, now);
                        let order_id = resting.order_id.clone();
                        self.write_through("update_order_status(cancel)", || {
                            self.store.update_order_status(&order_id, OrderStatus::Cancelled)
                        })
                        .await;
                        continue 'matching;
                    }
                }
                Err(other) => {
                    tracing::error!(error = %other, "unexpected settlement error");
                    self.broadcaster
                        .publish(Event::error("matcher", format!("settlement error: {other}")))
                        .await;
                    break 'matching;
                }
            }

            incoming.apply_fill(fill_qty, now);
            let resting_after = book.apply_fill(resting.side, resting.price_per_unit, &resting.order_id, fill_qty, now);

            let (transaction_id, _) = self.sequence.next_id("txn");
            let fill = Fill {
                transaction_id,
                buy_order_id: buy_order_id.clone(),
                sell_order_id: sell_order_id.clone(),
                buyer_outlet_id,
                seller_outlet_id,
                product_id: product_id.to_string(),
                quantity: fill_qty,
                price_per_unit: fill_price,
                total_amount: fill_qty as f64 * fill_price,
                executed_at: now,
            };

            self.write_through("insert_transaction", || self.store.insert_transaction(fill.clone()))
                .await;
            let resting_order_id = resting.order_id.clone();
            let resting_filled = resting.filled_quantity + fill_qty;
            self.write_through("update_order_quantity(resting)", || {
                self.store.update_order_quantity(&resting_order_id, resting_filled)
            })
            .await;
            if let Some(resting_after) = resting_after {
                let resting_order_id = resting.order_id.clone();
                self.write_through("update_order_status(resting)", || {
                    self.store.update_order_status(&resting_order_id, resting_after.status)
                })
                .await;
            }

            if let Some(metrics) = &self.metrics {
                metrics.fill_executed();
            }
            self.broadcaster.publish(Event::TradeExecuted { fill }).await;
            self.broadcaster
                .publish(Event::BookUpdated {
                    product_id: product_id.to_string(),
                })
                .await;
        }

        if incoming.status != OrderStatus::Cancelled && incoming.remaining() > 0 {
            book.insert(incoming.clone());
        }
        drop(book);

        let order_for_store = incoming.clone();
        self.write_through("insert_order", || self.store.insert_order(order_for_store.clone()))
            .await;

        Ok(incoming)
    }

    pub async fn snapshot(&self, product_id: &str) -> Option<crate::book::OrderBookSnapshot> {
        let books = self.books.read().await;
        let book = books.get(product_id)?;
        let snapshot = book.lock().await.snapshot(product_id);
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap as Map;
    use std::sync::Mutex as StdMutex;
    use storage::InMemoryStore;

    struct FakeLedger {
        outlets: Map<OutletId, bool>,
        balances: StdMutex<Map<OutletId, f64>>,
    }

    #[async_trait]
    impl OutletDirectory for FakeLedger {
        async fn outlet_status(&self, outlet_id: &str) -> Option<bool> {
            self.outlets.get(outlet_id).copied()
        }
    }

    #[async_trait]
    impl SettlementHandle for FakeLedger {
        async fn settle_fill(
            &self,
            buyer_outlet_id: &str,
            seller_outlet_id: &str,
            _product_id: &str,
            quantity: i64,
            price_per_unit: f64,
        ) -> Result<(), SettlementError> {
            let total = quantity as f64 * price_per_unit;
            let mut balances = self.balances.lock().unwrap();
            let buyer_balance = *balances.get(buyer_outlet_id).unwrap_or(&0.0);
            if buyer_balance < total {
                return Err(SettlementError::Overdraw {
                    outlet_id: buyer_outlet_id.to_string(),
                    quantity,
                    price: price_per_unit,
                });
            }
            *balances.entry(buyer_outlet_id.to_string()).or_insert(0.0) -= total;
            *balances.entry(seller_outlet_id.to_string()).or_insert(0.0) += total;
            Ok(())
        }
    }

    fn make_exchange(outlets: &[(&str, f64)]) -> Exchange {
        let mut open = Map::new();
        let mut balances = Map::new();
        for (id, balance) in outlets {
            open.insert(id.to_string(), true);
            balances.insert(id.to_string(), *balance);
        }
        let ledger = Arc::new(FakeLedger {
            outlets: open,
            balances: StdMutex::new(balances),
        });
        let mut products = HashSet::new();
        products.insert("glazed".to_string());
        Exchange::new(
            products,
            ledger.clone(),
            ledger,
            Arc::new(InMemoryStore::new()),
            Arc::new(Broadcaster::new()),
        )
    }

    #[tokio::test]
    async fn simple_cross_partially_fills_resting_ask() {
        let exchange = make_exchange(&[("hut-a", 1_000.0), ("hut-b", 1_000.0)]);

        let ask = exchange
            .submit_order(OrderSide::Sell, "glazed", "hut-a", 10, 3.00)
            .await
            .unwrap();
        assert_eq!(ask.status, OrderStatus::Active);

        let bid = exchange
            .submit_order(OrderSide::Buy, "glazed", "hut-b", 4, 3.00)
            .await
            .unwrap();

        assert_eq!(bid.status, OrderStatus::Filled);
    }

    #[tokio::test]
    async fn price_improvement_uses_resting_price() {
        let exchange = make_exchange(&[("hut-a", 1_000.0), ("hut-b", 1_000.0)]);
        exchange
            .submit_order(OrderSide::Sell, "glazed", "hut-a", 5, 2.50)
            .await
            .unwrap();

        let bid = exchange
            .submit_order(OrderSide::Buy, "glazed", "hut-b", 5, 3.00)
            .await
            .unwrap();

        assert_eq!(bid.status, OrderStatus::Filled);
    }

    #[tokio::test]
    async fn time_priority_fills_earlier_order_first() {
        let exchange = make_exchange(&[("hut-a", 1_000.0), ("hut-b", 1_000.0), ("hut-c", 1_000.0)]);
        let ask1 = exchange
            .submit_order(OrderSide::Sell, "glazed", "hut-a", 5, 2.00)
            .await
            .unwrap();
        let ask2 = exchange
            .submit_order(OrderSide::Sell, "glazed", "hut-b", 5, 2.00)
            .await
            .unwrap();

        exchange
            .submit_order(OrderSide::Buy, "glazed", "hut-c", 7, 2.00)
            .await
            .unwrap();

        let ask1_final = exchange.snapshot("glazed").await.unwrap();
        assert_eq!(ask1_final.asks.len(), 1);
        assert_eq!(ask1_final.asks[0].quantity, 3);
        let _ = (ask1, ask2);
    }

    #[tokio::test]
    async fn self_trade_is_never_matched() {
        let exchange = make_exchange(&[("hut-a", 1_000.0)]);
        exchange
            .submit_order(OrderSide::Sell, "glazed", "hut-a", 5, 2.00)
            .await
            .unwrap();

        let bid = exchange
            .submit_order(OrderSide::Buy, "glazed", "hut-a", 5, 2.50)
            .await
            .unwrap();

        assert_eq!(bid.status, OrderStatus::Active);
        assert_eq!(bid.price_per_unit, 2.50);
    }

    #[tokio::test]
    async fn overdraw_cancels_incoming_buy_with_no_fill() {
        let exchange = make_exchange(&[("hut-a", 1_000.0), ("hut-b", 5.0)]);
        exchange
            .submit_order(OrderSide::Sell, "glazed", "hut-a", 1, 10.0)
            .await
            .unwrap();

        let bid = exchange
            .submit_order(OrderSide::Buy, "glazed", "hut-b", 1, 10.0)
            .await
            .unwrap();

        assert_eq!(bid.status, OrderStatus::Cancelled);
        assert_eq!(bid.filled_quantity, 0);
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let exchange = make_exchange(&[("hut-a", 1_000.0)]);
        let result = exchange.submit_order(OrderSide::Buy, "sprinkled", "hut-a", 1, 1.0).await;
        assert_matches::assert_matches!(result, Err(MatchError::UnknownProduct(_)));
    }

    #[tokio::test]
    async fn unknown_outlet_is_rejected() {
        let exchange = make_exchange(&[]);
        let result = exchange.submit_order(OrderSide::Buy, "glazed", "ghost", 1, 1.0).await;
        assert_matches::assert_matches!(result, Err(MatchError::UnknownOutlet(_)));
    }

    #[tokio::test]
    async fn closed_outlet_is_rejected() {
        let ledger = Arc::new(FakeLedger {
            outlets: Map::from([("hut-a".to_string(), false)]),
            balances: StdMutex::new(Map::new()),
        });
        let mut products = HashSet::new();
        products.insert("glazed".to_string());
        let exchange = Exchange::new(
            products,
            ledger.clone(),
            ledger,
            Arc::new(InMemoryStore::new()),
            Arc::new(Broadcaster::new()),
        );

        let result = exchange.submit_order(OrderSide::Buy, "glazed", "hut-a", 1, 1.0).await;
        assert_matches::assert_matches!(result, Err(MatchError::OutletClosed(_)));
    }
}
