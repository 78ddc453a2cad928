//! Analytics error types.

use thiserror::Error;

/// Errors that can occur while computing analytics.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The ledger scan failed.
    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    /// Summed volume does not fit in a `Decimal`.
    #[error("Transaction volume overflowed after {counted} transactions")]
    VolumeOverflow { counted: u64 },
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
