//! The seam between the matching engine and the ledger.
//!
//! The matching engine must not know how balances and inventory are stored;
//! it only needs to command a settlement and learn whether it succeeded.
//! This mirrors the way an order manager depends on `Arc<dyn RiskClient>`
//! rather than a concrete risk engine: the ledger crate implements this
//! trait, the matching-engine crate only depends on it.

use crate::types::{OutletId, ProductId};
use async_trait::async_trait;
use thiserror::Error;

/// Errors a settlement attempt can fail with. Only [`Overdraw`] is expected
/// in normal operation (§7, error kind 3); the matcher treats it as an abort
/// signal, not a propagated failure.
///
/// [`Overdraw`]: SettlementError::Overdraw
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettlementError {
    #[error("buyer {outlet_id} would overdraw settling {quantity} @ {price}")]
    Overdraw {
        outlet_id: OutletId,
        quantity: i64,
        price: f64,
    },
    #[error("unknown outlet: {0}")]
    UnknownOutlet(OutletId),
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),
}

/// Implemented by the ledger; consumed by the matching engine's critical
/// section to settle each fill atomically (§4.2, §4.3).
#[async_trait]
pub trait SettlementHandle: Send + Sync {
    /// Moves cash and credits buyer inventory for one fill. Must abort the
    /// whole transfer (no partial settlement) if the buyer would overdraw.
    async fn settle_fill(
        &self,
        buyer_outlet_id: &str,
        seller_outlet_id: &str,
        product_id: &str,
        quantity: i64,
        price_per_unit: f64,
    ) -> Result<(), SettlementError>;
}
