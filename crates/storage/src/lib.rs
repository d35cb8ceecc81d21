//! The Store boundary the exchange engine persists through.
//!
//! This crate deliberately does not implement any particular durable
//! backend. The original system wrote through a write-through cache over
//! an embedded graph database; a reimplementation over a transactional
//! SQL store, a KV store, or nothing at all (the [`InMemoryStore`] here)
//! can all satisfy [`Store`] equally.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use traits::Store;
