//! The Ledger: authoritative cash balances per outlet and inventory counts
//! per (outlet, product) (§4.3). Owns every monetary and quantity mutation
//! in the system; the matching engine only ever reaches it through
//! [`common::SettlementHandle`].

pub mod config;
pub mod error;
pub mod ledger;
pub mod stats;

pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};
pub use ledger::Ledger;
pub use stats::{LeaderboardEntry, OutletStats};
