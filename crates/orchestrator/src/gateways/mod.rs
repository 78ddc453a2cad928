//! Payment gateway adapters.
//!
//! Each supported gateway is reached through a [`PaymentGateway`]. The
//! orchestrator looks adapters up by [`GatewayKind`] in a [`GatewayRegistry`]
//! and calls the selected one exactly once per transaction.

pub mod registry;
pub mod scripted;
pub mod simulated;

use async_trait::async_trait;
use common::{MerchantId, TransactionId};
use domain::{Currency, GatewayKind, GatewayOutcome, Transaction};
use rust_decimal::Decimal;

pub use registry::GatewayRegistry;
pub use scripted::ScriptedGateway;
pub use simulated::{SimulatedGateway, SimulationConfig};

/// Payment details handed to a gateway.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub transaction_id: TransactionId,
    pub merchant_id: MerchantId,
    pub amount: Decimal,
    pub currency: Currency,
    pub customer_email: String,
}

impl From<&Transaction> for GatewayRequest {
    fn from(txn: &Transaction) -> Self {
        Self {
            transaction_id: txn.transaction_id.clone(),
            merchant_id: txn.merchant_id.clone(),
            amount: txn.amount,
            currency: txn.currency.clone(),
            customer_email: txn.customer_email.clone(),
        }
    }
}

/// A payment gateway adapter.
///
/// `submit` reports declines as a failed [`GatewayOutcome`], never as an
/// error. Adapters do not retry.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// The gateway this adapter talks to.
    fn kind(&self) -> GatewayKind;

    /// Submits a payment and reports how the gateway answered.
    async fn submit(&self, request: &GatewayRequest) -> GatewayOutcome;
}

/// Formats a gateway reference as `<gateway>_` plus 12 lower-case hex digits.
pub(crate) fn gateway_reference(kind: GatewayKind, value: u64) -> String {
    format!("{}_{:012x}", kind.as_str(), value & 0xffff_ffff_ffff)
}
