//! Transaction commands.

use common::MerchantId;
use rust_decimal::Decimal;

use crate::error::DomainError;

use super::{Currency, validate_amount, validate_email};

/// Command to charge a customer on behalf of a merchant.
#[derive(Debug, Clone)]
pub struct CreateTransaction {
    /// Merchant the payment is collected for.
    pub merchant_id: MerchantId,

    /// Amount to charge; must be positive.
    pub amount: Decimal,

    /// Currency code; `None` means [`Currency::DEFAULT`].
    pub currency: Option<String>,

    /// Requested gateway name; `None` means the merchant's preferred gateway.
    pub gateway: Option<String>,

    pub customer_email: String,
    pub customer_phone: Option<String>,

    /// Caller-supplied key making retries of this request safe.
    pub idempotency_key: Option<String>,
}

impl CreateTransaction {
    /// Creates a new CreateTransaction command with default currency and gateway.
    pub fn new(
        merchant_id: MerchantId,
        amount: Decimal,
        customer_email: impl Into<String>,
    ) -> Self {
        Self {
            merchant_id,
            amount,
            currency: None,
            gateway: None,
            customer_email: customer_email.into(),
            customer_phone: None,
            idempotency_key: None,
        }
    }

    /// Sets the requested gateway.
    pub fn via(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = Some(gateway.into());
        self
    }

    /// Sets the currency code.
    pub fn in_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Sets the customer phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.customer_phone = Some(phone.into());
        self
    }

    /// Sets the idempotency key.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Validates the amount and contact fields and normalises the currency.
    pub fn validate(&self) -> Result<ValidatedFields, DomainError> {
        let amount = validate_amount(self.amount)?;
        let currency = match &self.currency {
            Some(code) => Currency::parse(code)?,
            None => Currency::default(),
        };
        let customer_email = validate_email("customer_email", &self.customer_email)?;
        let customer_phone = self
            .customer_phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from);
        let idempotency_key = self
            .idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from);

        Ok(ValidatedFields {
            amount,
            currency,
            customer_email,
            customer_phone,
            idempotency_key,
        })
    }
}

/// The normalised fields of a [`CreateTransaction`] that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFields {
    pub amount: Decimal,
    pub currency: Currency,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub idempotency_key: Option<String>,
}
