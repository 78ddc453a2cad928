//! Gateway selection and merchant eligibility.

use std::collections::BTreeSet;
use std::str::FromStr;

use common::MerchantId;
use domain::{DomainError, GatewayKind, Merchant};
use ledger::LedgerStore;

use crate::error::{OrchestratorError, Result};

/// What to do with a gateway name that matches no configured adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownGatewayPolicy {
    /// Quietly use the default gateway.
    #[default]
    FallbackToDefault,
    /// Fail the request with a validation error.
    Reject,
}

impl FromStr for UnknownGatewayPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback" | "fallback_to_default" => Ok(Self::FallbackToDefault),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown gateway policy: {other}")),
        }
    }
}

/// Picks the gateway for a request and checks the merchant may transact.
#[derive(Debug, Clone)]
pub struct Router {
    configured: BTreeSet<GatewayKind>,
    default_gateway: GatewayKind,
    policy: UnknownGatewayPolicy,
}

impl Router {
    /// Creates a router over the gateways that have adapters.
    pub fn new(
        configured: impl IntoIterator<Item = GatewayKind>,
        default_gateway: GatewayKind,
        policy: UnknownGatewayPolicy,
    ) -> Self {
        Self {
            configured: configured.into_iter().collect(),
            default_gateway,
            policy,
        }
    }

    pub fn default_gateway(&self) -> GatewayKind {
        self.default_gateway
    }

    pub fn policy(&self) -> UnknownGatewayPolicy {
        self.policy
    }

    /// Resolves a requested gateway name.
    ///
    /// An explicit name wins over `preferred` when it names a configured
    /// gateway. No name means `preferred`. Anything else is handled by the
    /// unknown-gateway policy.
    pub fn resolve_gateway(
        &self,
        requested: Option<&str>,
        preferred: GatewayKind,
    ) -> Result<GatewayKind> {
        let Some(name) = requested else {
            return Ok(preferred);
        };

        match name.parse::<GatewayKind>() {
            Ok(kind) if self.configured.contains(&kind) => Ok(kind),
            _ => match self.policy {
                UnknownGatewayPolicy::FallbackToDefault => {
                    tracing::warn!(
                        requested = name,
                        fallback = %self.default_gateway,
                        "unknown gateway requested, using default"
                    );
                    Ok(self.default_gateway)
                }
                UnknownGatewayPolicy::Reject => Err(DomainError::UnknownGateway {
                    name: name.trim().to_string(),
                }
                .into()),
            },
        }
    }

    /// Resolves a merchant's preferred gateway at registration.
    pub fn resolve_preferred(&self, requested: Option<&str>) -> Result<GatewayKind> {
        self.resolve_gateway(requested, self.default_gateway)
    }

    /// Checks that a looked-up merchant exists and is active.
    pub fn eligible(merchant_id: &MerchantId, merchant: Option<Merchant>) -> Result<Merchant> {
        let merchant =
            merchant.ok_or_else(|| OrchestratorError::MerchantNotFound(merchant_id.clone()))?;
        if !merchant.is_active {
            return Err(OrchestratorError::MerchantInactive(merchant_id.clone()));
        }
        Ok(merchant)
    }

    /// Looks up the merchant and picks the gateway for a new transaction.
    pub async fn route<S: LedgerStore>(
        &self,
        store: &S,
        merchant_id: &MerchantId,
        requested: Option<&str>,
    ) -> Result<(Merchant, GatewayKind)> {
        let merchant = Self::eligible(merchant_id, store.get_merchant(merchant_id).await?)?;
        let gateway = self.resolve_gateway(requested, merchant.preferred_gateway)?;
        Ok((merchant, gateway))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(
            GatewayKind::ALL,
            GatewayKind::default(),
            UnknownGatewayPolicy::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejecting() -> Router {
        Router::new(
            GatewayKind::ALL,
            GatewayKind::Razorpay,
            UnknownGatewayPolicy::Reject,
        )
    }

    #[test]
    fn explicit_gateway_beats_preference() {
        let router = Router::default();
        let kind = router
            .resolve_gateway(Some("Stripe"), GatewayKind::Paytm)
            .unwrap();
        assert_eq!(kind, GatewayKind::Stripe);
    }

    #[test]
    fn missing_gateway_uses_preference() {
        let router = Router::default();
        let kind = router.resolve_gateway(None, GatewayKind::Phonepe).unwrap();
        assert_eq!(kind, GatewayKind::Phonepe);
    }

    #[test]
    fn unknown_gateway_falls_back_by_default() {
        let router = Router::default();
        let kind = router
            .resolve_gateway(Some("paypal"), GatewayKind::Stripe)
            .unwrap();
        assert_eq!(kind, GatewayKind::Razorpay);
    }

    #[test]
    fn unknown_gateway_rejected_under_reject_policy() {
        let err = rejecting()
            .resolve_gateway(Some(" paypal "), GatewayKind::Stripe)
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Domain(DomainError::UnknownGateway { ref name }) if name == "paypal"
        ));
    }

    #[test]
    fn unconfigured_gateway_counts_as_unknown() {
        let router = Router::new(
            [GatewayKind::Razorpay],
            GatewayKind::Razorpay,
            UnknownGatewayPolicy::FallbackToDefault,
        );
        let kind = router
            .resolve_gateway(Some("stripe"), GatewayKind::Razorpay)
            .unwrap();
        assert_eq!(kind, GatewayKind::Razorpay);
    }

    #[test]
    fn preferred_gateway_follows_policy() {
        assert_eq!(
            Router::default().resolve_preferred(None).unwrap(),
            GatewayKind::Razorpay
        );
        assert!(rejecting().resolve_preferred(Some("venmo")).is_err());
    }

    #[test]
    fn eligibility() {
        let id = MerchantId::new("MERCH_0000000001");
        assert!(matches!(
            Router::eligible(&id, None),
            Err(OrchestratorError::MerchantNotFound(_))
        ));

        let mut merchant = Merchant::issue("Shop", "s@example.com", GatewayKind::Stripe);
        assert!(Router::eligible(&id, Some(merchant.clone())).is_ok());

        merchant.deactivate();
        assert!(matches!(
            Router::eligible(&id, Some(merchant)),
            Err(OrchestratorError::MerchantInactive(_))
        ));
    }

    #[test]
    fn policy_parsing() {
        assert_eq!(
            "fallback".parse::<UnknownGatewayPolicy>(),
            Ok(UnknownGatewayPolicy::FallbackToDefault)
        );
        assert_eq!(
            "REJECT".parse::<UnknownGatewayPolicy>(),
            Ok(UnknownGatewayPolicy::Reject)
        );
        assert!("maybe".parse::<UnknownGatewayPolicy>().is_err());
    }
}
