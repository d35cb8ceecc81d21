//! The EventSink boundary the broadcaster fans events out to (§6).

use crate::event::Event;
use async_trait::async_trait;

/// A registered observer. Sinks may be remote (a websocket fan-out the
/// engine does not implement) or local (a logging sink, below). Delivery
/// to a sink must never block the engine's critical section; the
/// broadcaster enforces that by handing events to sinks over a bounded
/// queue rather than calling this synchronously from the match loop.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// A short name used in logs when this sink lags or is dropped.
    fn name(&self) -> &str;

    async fn handle(&self, event: Event);
}

/// The simplest possible sink: writes every event to the tracing log.
/// Used as the default local sink and in tests.
pub struct LoggingSink {
    name: String,
}

impl LoggingSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl EventSink for LoggingSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: Event) {
        match &event {
            Event::TradeExecuted { fill } => tracing::debug!(
                transaction_id = %fill.transaction_id,
                product_id = %fill.product_id,
                quantity = fill.quantity,
                price = fill.price_per_unit,
                "trade executed"
            ),
            Event::BookUpdated { product_id } => {
                tracing::debug!(product_id = %product_id, "book updated")
            }
            Event::CustomerPurchased { sale } => tracing::debug!(
                sale_id = %sale.sale_id,
                outlet_id = %sale.outlet_id,
                product_id = %sale.product_id,
                "customer purchased"
            ),
            Event::Error { message, source } => {
                tracing::warn!(source = %source, message = %message, "engine error event")
            }
        }
    }
}
