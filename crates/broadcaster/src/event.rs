//! Domain events fanned out to registered observers (§4.4).

use common::{CustomerSale, Fill};
use serde::{Deserialize, Serialize};

/// A fan-out event. `Error` is not a system fault in the Rust-error sense;
/// it is a first-class domain event describing something an operator-facing
/// observer should see (a settlement abort, a dropped broadcast, a
/// persistence retry failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TradeExecuted { fill: Fill },
    BookUpdated { product_id: String },
    CustomerPurchased { sale: CustomerSale },
    Error { message: String, source: String },
}

impl Event {
    pub fn error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Error {
            message: message.into(),
            source: source.into(),
        }
    }
}
