//! A second, narrow seam from the matching engine into the ledger: outlet
//! existence and open/closed status. Kept separate from
//! [`crate::SettlementHandle`] because it is a read, not a mutation, and
//! validation (§7 error kind 1) needs it before a submission ever reaches
//! the book.

use async_trait::async_trait;

#[async_trait]
pub trait OutletDirectory: Send + Sync {
    /// `None` if the outlet does not exist; `Some(is_open)` otherwise.
    async fn outlet_status(&self, outlet_id: &str) -> Option<bool>;
}
