//! Storage error types

use thiserror::Error;

/// Errors that can occur during Store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying connection or backend is unavailable.
    #[error("connection error: {0}")]
    Connection(String),

    /// A read or write against the backend failed.
    #[error("query error: {0}")]
    Query(String),

    /// The referenced record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
