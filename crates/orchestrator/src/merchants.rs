//! Merchant onboarding and lookup.

use common::{ApiKey, MerchantId, Page};
use domain::{Merchant, RegisterMerchant};
use ledger::{LedgerStore, LedgerStoreExt};

use crate::error::{OrchestratorError, Result};
use crate::router::Router;

/// Attempts made when a generated identity collides with an existing one.
pub const MAX_IDENTITY_ATTEMPTS: usize = 3;

/// Application service for merchant accounts.
pub struct MerchantService<S: LedgerStore> {
    store: S,
    router: Router,
}

impl<S: LedgerStore> MerchantService<S> {
    pub fn new(store: S, router: Router) -> Self {
        Self { store, router }
    }

    /// Registers a merchant, issuing its ID and API key.
    ///
    /// A duplicate email is reported as-is; ID or key collisions are retried
    /// with fresh credentials.
    #[tracing::instrument(skip(self, command), fields(email = %command.email))]
    pub async fn register(&self, command: RegisterMerchant) -> Result<Merchant> {
        let (name, email) = command.validate()?;
        let preferred = self
            .router
            .resolve_preferred(command.preferred_gateway.as_deref())?;

        let mut merchant = Merchant::issue(name, email, preferred);
        for attempt in 1..=MAX_IDENTITY_ATTEMPTS {
            match self.store.insert_merchant(merchant.clone()).await {
                Ok(stored) => {
                    metrics::counter!("merchants_registered_total").increment(1);
                    tracing::info!(merchant_id = %stored.merchant_id, "merchant registered");
                    return Ok(stored);
                }
                Err(e) if e.is_identity_collision() => {
                    tracing::warn!(attempt, error = %e, "merchant identity collision, regenerating");
                    merchant = merchant.with_fresh_identity();
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(OrchestratorError::IdentityExhausted {
            attempts: MAX_IDENTITY_ATTEMPTS,
        })
    }

    /// Lists merchants in registration order.
    pub async fn list(&self, page: Page) -> Result<Vec<Merchant>> {
        Ok(self.store.list_merchants(page).await?)
    }

    /// Gets a merchant by ID.
    pub async fn get(&self, merchant_id: &MerchantId) -> Result<Merchant> {
        Ok(self.store.require_merchant(merchant_id).await?)
    }

    /// Deactivates a merchant. Idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn deactivate(&self, merchant_id: &MerchantId) -> Result<Merchant> {
        let merchant = self.store.deactivate_merchant(merchant_id).await?;
        tracing::info!("merchant deactivated");
        Ok(merchant)
    }

    /// Finds the merchant holding an API key.
    pub async fn authenticate(&self, api_key: &ApiKey) -> Result<Merchant> {
        self.store
            .get_merchant_by_api_key(api_key)
            .await
            .map_err(OrchestratorError::from)?
            .ok_or(OrchestratorError::InvalidApiKey)
    }
}
