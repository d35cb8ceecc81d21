//! Periodic order-flow agents (§4.5): `Supplier`, `PurchasingAgent` and
//! `CustomerSimulator`. Each is a ticker task, individually start/stop-able
//! and idempotent to double-start, driving the matching engine and ledger
//! the same way an external API caller would.

pub mod config;
pub mod customer_simulator;
pub mod error;
pub mod purchasing_agent;
pub mod supplier;

pub use config::{CustomerConfig, PurchasingConfig, QuantityRange, SupplierConfig};
pub use customer_simulator::CustomerSimulator;
pub use error::{AgentError, AgentResult};
pub use purchasing_agent::PurchasingAgent;
pub use supplier::Supplier;
