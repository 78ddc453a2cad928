//! Orchestrator error types.

use common::{MerchantId, TransactionId};
use domain::{DomainError, GatewayKind};
use ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur while onboarding merchants or processing payments.
///
/// A declined or timed-out gateway call is not an error: it is recorded as a
/// `failed` transaction and returned normally.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The merchant does not exist.
    #[error("Merchant not found: {0}")]
    MerchantNotFound(MerchantId),

    /// The merchant exists but has been deactivated.
    #[error("Merchant {0} is not active")]
    MerchantInactive(MerchantId),

    /// No merchant holds the presented API key.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// The transaction does not exist.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Another merchant already registered this email.
    #[error("Merchant with email {0} already exists")]
    DuplicateEmail(String),

    /// An idempotency key was reused with different payment details.
    #[error(
        "Idempotency key {key:?} was already used by merchant {merchant_id} for a different request"
    )]
    IdempotencyConflict { merchant_id: MerchantId, key: String },

    /// A request with this idempotency key is still being processed.
    #[error("Request with idempotency key {key:?} for merchant {merchant_id} is still in progress")]
    RequestInProgress { merchant_id: MerchantId, key: String },

    /// The task settling a transaction panicked or was cancelled.
    #[error("Transaction settlement aborted: {0}")]
    SettlementAborted(String),

    /// Every generated identity collided with an existing one.
    #[error("Could not allocate a unique identifier after {attempts} attempts")]
    IdentityExhausted { attempts: usize },

    /// The routed gateway has no registered adapter.
    #[error("No adapter registered for gateway {0}")]
    GatewayUnavailable(GatewayKind),

    /// Invalid input or a rejected state transition.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Any other ledger failure.
    #[error("Ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for OrchestratorError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::MerchantNotFound(id) => OrchestratorError::MerchantNotFound(id),
            LedgerError::TransactionNotFound(id) => OrchestratorError::TransactionNotFound(id),
            LedgerError::DuplicateEmail(email) => OrchestratorError::DuplicateEmail(email),
            LedgerError::DuplicateIdempotencyKey { merchant_id, key } => {
                OrchestratorError::IdempotencyConflict { merchant_id, key }
            }
            LedgerError::Domain(e) => OrchestratorError::Domain(e),
            other => OrchestratorError::Ledger(other),
        }
    }
}

/// Convenience type alias for orchestrator results.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use domain::TransactionStatus;

    use super::*;

    #[test]
    fn ledger_errors_map_to_client_facing_variants() {
        let err: OrchestratorError =
            LedgerError::DuplicateEmail("a@example.com".to_string()).into();
        assert!(matches!(err, OrchestratorError::DuplicateEmail(_)));

        let err: OrchestratorError =
            LedgerError::MerchantNotFound(MerchantId::new("MERCH_0000000000")).into();
        assert!(matches!(err, OrchestratorError::MerchantNotFound(_)));

        let err: OrchestratorError = LedgerError::Domain(DomainError::NotReconcilable {
            status: TransactionStatus::Pending,
        })
        .into();
        assert!(matches!(
            err,
            OrchestratorError::Domain(DomainError::NotReconcilable { .. })
        ));
    }

    #[test]
    fn storage_failures_stay_wrapped() {
        let err: OrchestratorError = LedgerError::Corrupt("status \"?\"".to_string()).into();
        assert!(matches!(err, OrchestratorError::Ledger(LedgerError::Corrupt(_))));
    }
}
