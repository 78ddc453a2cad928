//! Transaction status state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of a transaction in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Success
///           └──► Failed
/// ```
/// Both outcomes are terminal; no transition is reversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded, gateway outcome not yet known. The only legal initial status.
    #[default]
    Pending,

    /// Gateway approved the payment (terminal state).
    Success,

    /// Gateway declined or did not answer in time (terminal state).
    Failed,
}

impl TransactionStatus {
    /// Maps a gateway verdict to a terminal status.
    pub fn from_outcome(succeeded: bool) -> Self {
        if succeeded {
            TransactionStatus::Success
        } else {
            TransactionStatus::Failed
        }
    }

    /// Returns true if a transaction may move from `self` to `next`.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (
                TransactionStatus::Pending,
                TransactionStatus::Success | TransactionStatus::Failed
            )
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Success | TransactionStatus::Failed)
    }

    /// Returns the status name as stored in the ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "success" => Ok(TransactionStatus::Success),
            "failed" => Ok(TransactionStatus::Failed),
            _ => Err(DomainError::UnknownStatus(s.to_string())),
        }
    }
}
