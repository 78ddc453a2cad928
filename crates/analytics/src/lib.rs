//! Analytics over the transaction ledger.
//!
//! Figures are computed at query time by streaming the ledger:
//! - [`AnalyticsEngine::stats`] for totals, volume and success rate
//! - [`AnalyticsEngine::gateway_performance`] for a per-gateway breakdown

pub mod engine;
pub mod error;
pub mod report;

pub use engine::AnalyticsEngine;
pub use error::{AnalyticsError, Result};
pub use report::{GatewayPerformance, Tally, TransactionStats, success_rate};
