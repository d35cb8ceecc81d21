//! Fan-out of exchange domain events to registered observers (§4.4).
//!
//! The broadcaster owns no domain logic; it exists so the Ledger and the
//! Matcher can publish `TradeExecuted`, `BookUpdated`, `CustomerPurchased`
//! and `Error` events without depending on whatever actually observes them
//! (a websocket gateway, a metrics exporter, a log line — see
//! [`EventSink`]).

pub mod broadcaster;
pub mod event;
pub mod queue;
pub mod sink;

pub use broadcaster::{Broadcaster, DEFAULT_QUEUE_CAPACITY};
pub use event::Event;
pub use sink::{EventSink, LoggingSink};
