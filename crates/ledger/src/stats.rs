//! Derived, read-only views over ledger state (§4.3).

use common::{OutletId, SalesStats};

/// A single outlet's combined sales aggregates and net profit, as returned
/// by [`crate::Ledger::stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutletStats {
    pub sales: SalesStats,
    pub balance: f64,
    /// `balance - INITIAL_OUTLET_BALANCE`.
    pub net_profit: f64,
}

/// One row of [`crate::Ledger::leaderboard`], sorted by `net_profit` descending.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub outlet_id: OutletId,
    pub net_profit: f64,
}
