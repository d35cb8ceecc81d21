//! Observability infrastructure for the donut exchange engine
//!
//! This crate provides:
//! - Structured logging via tracing
//! - Prometheus metrics
//! - The engine's own metric set (orders, fills, settlement aborts, broadcast drops)
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! // Initialize logging
//! init_logging("donutx", LogFormat::Pretty)?;
//!
//! // Initialize metrics (optional)
//! observability::metrics::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, EngineMetrics};
