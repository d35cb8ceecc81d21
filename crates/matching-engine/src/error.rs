//! Matching engine error kinds (§7, error kind 1: validation).

use common::{OutletId, ProductId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("unknown outlet: {0}")]
    UnknownOutlet(OutletId),

    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("outlet {0} is closed")]
    OutletClosed(OutletId),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("invalid price: {0}")]
    InvalidPrice(f64),

    #[error("store error: {0}")]
    Store(#[from] storage::StoreError),
}

pub type MatchResult<T> = Result<T, MatchError>;
