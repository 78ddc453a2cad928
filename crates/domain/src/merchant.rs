//! Merchant accounts.

use chrono::{DateTime, Utc};
use common::{ApiKey, MerchantId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::gateway::GatewayKind;
use crate::transaction::validate_email;

/// A registered merchant.
///
/// Merchants are never deleted; deactivation is the only lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub merchant_id: MerchantId,
    pub merchant_name: String,
    pub email: String,
    pub api_key: ApiKey,
    pub preferred_gateway: GatewayKind,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Merchant {
    /// Issues a new active merchant with freshly generated credentials.
    pub fn issue(
        merchant_name: impl Into<String>,
        email: impl Into<String>,
        preferred_gateway: GatewayKind,
    ) -> Self {
        Self {
            merchant_id: MerchantId::generate(),
            merchant_name: merchant_name.into(),
            email: email.into(),
            api_key: ApiKey::generate(),
            preferred_gateway,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Replaces the generated identity and credential, keeping everything else.
    ///
    /// Used when the store reports an identifier collision.
    pub fn with_fresh_identity(mut self) -> Self {
        self.merchant_id = MerchantId::generate();
        self.api_key = ApiKey::generate();
        self
    }

    /// Marks the merchant inactive. New transactions will be refused.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

/// Command to register a new merchant.
#[derive(Debug, Clone)]
pub struct RegisterMerchant {
    pub merchant_name: String,
    pub email: String,
    /// Requested default gateway; `None` means the system default.
    pub preferred_gateway: Option<String>,
}

impl RegisterMerchant {
    /// Creates a new RegisterMerchant command.
    pub fn new(merchant_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            merchant_name: merchant_name.into(),
            email: email.into(),
            preferred_gateway: None,
        }
    }

    /// Sets the preferred gateway.
    pub fn with_preferred_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.preferred_gateway = Some(gateway.into());
        self
    }

    /// Checks name and email, returning them trimmed. The email is lowercased.
    pub fn validate(&self) -> Result<(String, String), DomainError> {
        let name = self.merchant_name.trim();
        if name.is_empty() {
            return Err(DomainError::MerchantNameRequired);
        }
        let email = validate_email("email", &self.email)?;
        Ok((name.to_string(), email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_creates_active_merchant() {
        let merchant = Merchant::issue("Acme", "ops@acme.test", GatewayKind::Stripe);
        assert!(merchant.is_active);
        assert!(merchant.merchant_id.as_str().starts_with("MERCH_"));
        assert!(merchant.api_key.as_str().starts_with("sk_live_"));
        assert_eq!(merchant.preferred_gateway, GatewayKind::Stripe);
    }

    #[test]
    fn fresh_identity_keeps_profile() {
        let merchant = Merchant::issue("Acme", "ops@acme.test", GatewayKind::Stripe);
        let original_id = merchant.merchant_id.clone();
        let renewed = merchant.clone().with_fresh_identity();
        assert_ne!(renewed.merchant_id, original_id);
        assert_eq!(renewed.email, merchant.email);
        assert_eq!(renewed.created_at, merchant.created_at);
    }

    #[test]
    fn deactivate_clears_flag() {
        let mut merchant = Merchant::issue("Acme", "ops@acme.test", GatewayKind::Razorpay);
        merchant.deactivate();
        assert!(!merchant.is_active);
    }

    #[test]
    fn validate_trims_fields() {
        let cmd = RegisterMerchant::new("  Acme  ", " ops@acme.test ");
        let (name, email) = cmd.validate().unwrap();
        assert_eq!(name, "Acme");
        assert_eq!(email, "ops@acme.test");
    }

    #[test]
    fn validate_lowercases_email() {
        let cmd = RegisterMerchant::new("Acme", "Ops@ACME.test");
        let (_, email) = cmd.validate().unwrap();
        assert_eq!(email, "ops@acme.test");
    }

    #[test]
    fn validate_rejects_blank_name() {
        let cmd = RegisterMerchant::new("   ", "ops@acme.test");
        assert_eq!(cmd.validate(), Err(DomainError::MerchantNameRequired));
    }

    #[test]
    fn validate_rejects_bad_email() {
        let cmd = RegisterMerchant::new("Acme", "not-an-email");
        assert!(matches!(
            cmd.validate(),
            Err(DomainError::InvalidEmail { field: "email", .. })
        ));
    }
}
