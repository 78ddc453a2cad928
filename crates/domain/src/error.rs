//! Domain error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::transaction::TransactionStatus;

/// Errors that can occur during domain operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Amount is zero or negative.
    #[error("Invalid amount: {amount} (must be greater than 0)")]
    InvalidAmount { amount: Decimal },

    /// Currency is not a three-letter code.
    #[error("Invalid currency code: {code:?}")]
    InvalidCurrency { code: String },

    /// A contact email field does not look like an address.
    #[error("Invalid email for {field}: {value:?}")]
    InvalidEmail { field: &'static str, value: String },

    /// Merchant name is empty.
    #[error("Merchant name is required")]
    MerchantNameRequired,

    /// Gateway name does not match any supported gateway.
    #[error("Unknown gateway: {name}")]
    UnknownGateway { name: String },

    /// Transaction status string is not recognised.
    #[error("Unknown transaction status: {0}")]
    UnknownStatus(String),

    /// Status transition is not allowed by the state machine.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    /// Only terminal transactions can be reconciled.
    #[error("Transaction in {status} state cannot be reconciled")]
    NotReconcilable { status: TransactionStatus },
}

impl DomainError {
    /// Returns true if the error describes malformed client input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidAmount { .. }
                | DomainError::InvalidCurrency { .. }
                | DomainError::InvalidEmail { .. }
                | DomainError::MerchantNameRequired
                | DomainError::UnknownGateway { .. }
                | DomainError::UnknownStatus(_)
        )
    }
}
