//! Ledger record for a single payment attempt.

use chrono::{DateTime, Utc};
use common::{MerchantId, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::gateway::{GatewayKind, GatewayOutcome};

use super::commands::ValidatedFields;
use super::{Currency, TransactionStatus};

/// A transaction as recorded in the ledger.
///
/// Created `pending`, then moved exactly once to `success` or `failed`.
/// Contact fields, amount, currency, gateway and `created_at` never change
/// after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub merchant_id: MerchantId,
    pub amount: Decimal,
    pub currency: Currency,

    /// The gateway actually used, after routing.
    pub gateway: GatewayKind,

    pub status: TransactionStatus,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub idempotency_key: Option<String>,

    /// Diagnostic record of the gateway call; `None` while pending.
    pub gateway_response: Option<GatewayOutcome>,

    /// Set by reconciliation only.
    pub is_reconciled: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds a new pending transaction with a generated ID.
    pub fn pending(merchant_id: MerchantId, gateway: GatewayKind, fields: ValidatedFields) -> Self {
        let now = Utc::now();
        Self {
            transaction_id: TransactionId::generate(),
            merchant_id,
            amount: fields.amount,
            currency: fields.currency,
            gateway,
            status: TransactionStatus::Pending,
            customer_email: fields.customer_email,
            customer_phone: fields.customer_phone,
            idempotency_key: fields.idempotency_key,
            gateway_response: None,
            is_reconciled: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the generated ID after a collision in the store.
    pub fn with_fresh_id(mut self) -> Self {
        self.transaction_id = TransactionId::generate();
        self
    }

    /// Applies a gateway outcome, moving the transaction to its terminal status.
    pub fn complete(
        &mut self,
        outcome: GatewayOutcome,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let next = TransactionStatus::from_outcome(outcome.succeeded);
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.gateway_response = Some(outcome);
        self.updated_at = at;
        Ok(())
    }

    /// Flags the transaction as reconciled. Idempotent for terminal transactions.
    pub fn mark_reconciled(&mut self) -> Result<(), DomainError> {
        if !self.status.is_terminal() {
            return Err(DomainError::NotReconcilable {
                status: self.status,
            });
        }
        self.is_reconciled = true;
        Ok(())
    }

    /// Returns true if the amount counts toward processed volume.
    pub fn counts_toward_volume(&self) -> bool {
        self.status == TransactionStatus::Success
    }

    /// Returns true if a replayed request carries the same payment details.
    pub fn matches_request(&self, fields: &ValidatedFields, gateway: GatewayKind) -> bool {
        self.amount == fields.amount && self.currency == fields.currency && self.gateway == gateway
    }
}
