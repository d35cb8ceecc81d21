//! Ledger error kinds (§7, error kind 1: validation).

use common::{OutletId, ProductId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("unknown outlet: {0}")]
    UnknownOutlet(OutletId),

    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("invalid price: {0}")]
    InvalidPrice(f64),

    #[error("outlet {0} is closed")]
    OutletClosed(OutletId),

    #[error("insufficient inventory for {outlet_id}/{product_id}: have {have}, need {need}")]
    InsufficientInventory {
        outlet_id: OutletId,
        product_id: ProductId,
        have: i64,
        need: i64,
    },

    #[error("store error: {0}")]
    Store(#[from] storage::StoreError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
