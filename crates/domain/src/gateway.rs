//! Supported payment gateways and the outcome record they produce.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A payment gateway supported by the orchestrator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    #[default]
    Razorpay,
    Stripe,
    Paytm,
    Phonepe,
}

impl GatewayKind {
    /// Every supported gateway.
    pub const ALL: [GatewayKind; 4] = [
        GatewayKind::Razorpay,
        GatewayKind::Stripe,
        GatewayKind::Paytm,
        GatewayKind::Phonepe,
    ];

    /// Returns the gateway name as stored in the ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayKind::Razorpay => "razorpay",
            GatewayKind::Stripe => "stripe",
            GatewayKind::Paytm => "paytm",
            GatewayKind::Phonepe => "phonepe",
        }
    }

    /// Message reported for an approved payment.
    pub fn success_message(&self) -> &'static str {
        match self {
            GatewayKind::Razorpay => "Payment processed successfully",
            GatewayKind::Stripe => "Payment completed",
            GatewayKind::Paytm => "Transaction successful",
            GatewayKind::Phonepe => "UPI payment successful",
        }
    }

    /// Message reported for a declined payment.
    pub fn failure_message(&self) -> &'static str {
        match self {
            GatewayKind::Razorpay => "Insufficient funds",
            GatewayKind::Stripe => "Card declined",
            GatewayKind::Paytm => "Payment failed",
            GatewayKind::Phonepe => "UPI transaction failed",
        }
    }
}

impl std::fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GatewayKind {
    type Err = DomainError;

    /// Parses a gateway name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        GatewayKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| DomainError::UnknownGateway {
                name: name.to_string(),
            })
    }
}

/// Structured record of a single gateway call.
///
/// Stored alongside the transaction for diagnostics; the transaction's
/// `status` remains the authoritative result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOutcome {
    /// Gateway that handled the call.
    pub gateway: GatewayKind,

    /// Reference assigned by the gateway, e.g. `stripe_4be0c1a9e2f3`.
    /// Absent when the call never completed.
    pub gateway_transaction_ref: Option<String>,

    /// Whether the gateway approved the payment.
    pub succeeded: bool,

    /// Human-readable message from the gateway.
    pub message: String,

    /// Set when the call exceeded the orchestrator's deadline.
    #[serde(default)]
    pub timed_out: bool,
}

impl GatewayOutcome {
    /// An approved payment.
    pub fn approved(gateway: GatewayKind, reference: impl Into<String>) -> Self {
        Self {
            gateway,
            gateway_transaction_ref: Some(reference.into()),
            succeeded: true,
            message: gateway.success_message().to_string(),
            timed_out: false,
        }
    }

    /// A declined payment.
    pub fn declined(gateway: GatewayKind, reference: impl Into<String>) -> Self {
        Self {
            gateway,
            gateway_transaction_ref: Some(reference.into()),
            succeeded: false,
            message: gateway.failure_message().to_string(),
            timed_out: false,
        }
    }

    /// A call abandoned after `timeout_ms` milliseconds.
    pub fn timed_out(gateway: GatewayKind, timeout_ms: u64) -> Self {
        Self {
            gateway,
            gateway_transaction_ref: None,
            succeeded: false,
            message: format!("Gateway did not respond within {timeout_ms}ms"),
            timed_out: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Stripe".parse::<GatewayKind>(), Ok(GatewayKind::Stripe));
        assert_eq!(" PHONEPE ".parse::<GatewayKind>(), Ok(GatewayKind::Phonepe));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "paypal".parse::<GatewayKind>().unwrap_err();
        assert_eq!(
            err,
            DomainError::UnknownGateway {
                name: "paypal".to_string()
            }
        );
    }

    #[test]
    fn default_is_razorpay() {
        assert_eq!(GatewayKind::default(), GatewayKind::Razorpay);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&GatewayKind::Paytm).unwrap();
        assert_eq!(json, "\"paytm\"");
    }

    #[test]
    fn outcome_messages_follow_gateway() {
        let ok = GatewayOutcome::approved(GatewayKind::Stripe, "stripe_000000000001");
        assert!(ok.succeeded);
        assert_eq!(ok.message, "Payment completed");

        let declined = GatewayOutcome::declined(GatewayKind::Stripe, "stripe_000000000002");
        assert!(!declined.succeeded);
        assert_eq!(declined.message, "Card declined");
    }

    #[test]
    fn timed_out_outcome_has_no_reference() {
        let outcome = GatewayOutcome::timed_out(GatewayKind::Paytm, 250);
        assert!(outcome.timed_out);
        assert!(!outcome.succeeded);
        assert!(outcome.gateway_transaction_ref.is_none());
    }
}
