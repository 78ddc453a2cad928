use common::{MerchantId, TransactionId};
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur when interacting with the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A merchant with this ID already exists.
    #[error("Duplicate merchant id: {0}")]
    DuplicateMerchantId(MerchantId),

    /// A merchant with this email already exists.
    #[error("Merchant with email {0} already exists")]
    DuplicateEmail(String),

    /// The generated API key is already issued to another merchant.
    #[error("Duplicate API key")]
    DuplicateApiKey,

    /// A transaction with this ID already exists.
    #[error("Duplicate transaction id: {0}")]
    DuplicateTransactionId(TransactionId),

    /// The merchant already has a transaction recorded under this key.
    #[error("Idempotency key {key:?} already used by merchant {merchant_id}")]
    DuplicateIdempotencyKey { merchant_id: MerchantId, key: String },

    /// The merchant was not found.
    #[error("Merchant not found: {0}")]
    MerchantNotFound(MerchantId),

    /// The transaction was not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// A state-machine rule rejected the update.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A stored row could not be decoded into a domain value.
    #[error("Corrupt ledger row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl LedgerError {
    /// Returns true for collisions on generated identifiers.
    ///
    /// These are safe to retry with a fresh identity. A duplicate email is a
    /// client error and is never reported here.
    pub fn is_identity_collision(&self) -> bool {
        matches!(
            self,
            LedgerError::DuplicateMerchantId(_)
                | LedgerError::DuplicateApiKey
                | LedgerError::DuplicateTransactionId(_)
        )
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use sqlx::migrate::MigrateError;

    use super::*;

    #[test]
    fn migration_failures_convert_to_ledger_errors() {
        let err: LedgerError = MigrateError::VersionMissing(3).into();
        assert!(matches!(err, LedgerError::Migration(_)));
        assert!(!err.is_identity_collision());
    }
}
