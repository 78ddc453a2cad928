//! Aggregated views over the ledger.

use domain::{Transaction, TransactionStatus};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{AnalyticsError, Result};

/// Percentage of `successful` over `total`, rounded to two decimal places.
///
/// Zero when there is nothing to measure.
pub fn success_rate(successful: u64, total: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(successful) * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(2)
}

/// Running counters for a set of transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub pending: u64,
    /// Sum of amounts over successful transactions only.
    pub volume: Decimal,
}

impl Tally {
    /// Counts one transaction.
    ///
    /// Leaves the tally untouched if adding the amount would overflow.
    pub fn record(&mut self, txn: &Transaction) -> Result<()> {
        if txn.counts_toward_volume() {
            self.volume = self
                .volume
                .checked_add(txn.amount)
                .ok_or(AnalyticsError::VolumeOverflow {
                    counted: self.total,
                })?;
        }
        self.total += 1;
        match txn.status {
            TransactionStatus::Success => self.successful += 1,
            TransactionStatus::Failed => self.failed += 1,
            TransactionStatus::Pending => self.pending += 1,
        }
        Ok(())
    }

    pub fn success_rate(&self) -> Decimal {
        success_rate(self.successful, self.total)
    }
}

/// Overall transaction statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionStats {
    pub total_transactions: u64,
    pub successful_transactions: u64,
    pub failed_transactions: u64,
    pub pending_transactions: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_volume: Decimal,
    /// Percentage, two decimal places.
    #[serde(with = "rust_decimal::serde::float")]
    pub success_rate: Decimal,
}

impl From<Tally> for TransactionStats {
    fn from(tally: Tally) -> Self {
        Self {
            success_rate: tally.success_rate(),
            total_transactions: tally.total,
            successful_transactions: tally.successful,
            failed_transactions: tally.failed,
            pending_transactions: tally.pending,
            total_volume: tally.volume,
        }
    }
}

/// Per-gateway performance figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayPerformance {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub volume: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub success_rate: Decimal,
}

impl From<Tally> for GatewayPerformance {
    fn from(tally: Tally) -> Self {
        Self {
            success_rate: tally.success_rate(),
            total: tally.total,
            successful: tally.successful,
            failed: tally.failed,
            volume: tally.volume,
        }
    }
}
