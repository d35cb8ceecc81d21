//! Price-time priority continuous double-auction matching core (§4.1, §4.2).
//!
//! [`Book`] holds one product's resting orders; [`Exchange`] is the Matcher
//! — it serialises all book/ledger mutation for a given product behind a
//! per-product lock (§5) and drives settlement through
//! [`common::SettlementHandle`] rather than depending on the ledger crate
//! directly.

pub mod book;
pub mod error;
pub mod exchange;

pub use book::{Book, OrderBookSnapshot, PriceLevel};
pub use error::{MatchError, MatchResult};
pub use exchange::Exchange;
