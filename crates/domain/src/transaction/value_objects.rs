//! Value objects and field validation for transactions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// ISO 4217-style currency code, always three upper-case letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Currency used when a request does not specify one.
    pub const DEFAULT: &'static str = "INR";

    /// Parses a currency code, normalising it to upper case.
    pub fn parse(code: &str) -> Result<Self, DomainError> {
        let code = code.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(DomainError::InvalidCurrency {
                code: code.to_string(),
            })
        }
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

/// Ensures an amount is strictly positive.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, DomainError> {
    if amount > Decimal::ZERO {
        Ok(amount)
    } else {
        Err(DomainError::InvalidAmount { amount })
    }
}

/// Loose structural check for `local@domain.tld`; returns the trimmed,
/// lowercased address.
pub fn validate_email(field: &'static str, value: &str) -> Result<String, DomainError> {
    let email = value.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
        }
        None => false,
    };

    if valid {
        Ok(email.to_ascii_lowercase())
    } else {
        Err(DomainError::InvalidEmail {
            field,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn currency_is_upper_cased() {
        assert_eq!(Currency::parse("usd").unwrap().as_str(), "USD");
    }

    #[test]
    fn currency_rejects_bad_codes() {
        assert!(Currency::parse("US").is_err());
        assert!(Currency::parse("US1").is_err());
        assert!(Currency::parse("EURO").is_err());
    }

    #[test]
    fn currency_default_is_inr() {
        assert_eq!(Currency::default().as_str(), "INR");
    }

    #[test]
    fn currency_deserialization_validates() {
        let ok: Currency = serde_json::from_str("\"eur\"").unwrap();
        assert_eq!(ok.as_str(), "EUR");
        assert!(serde_json::from_str::<Currency>("\"e\"").is_err());
    }

    #[test]
    fn amount_must_be_positive() {
        assert_eq!(validate_amount(dec!(10.50)), Ok(dec!(10.50)));
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(dec!(-1)).is_err());
    }

    #[test]
    fn email_validation() {
        assert_eq!(
            validate_email("customer_email", " a@b.co ").unwrap(),
            "a@b.co"
        );
        assert_eq!(
            validate_email("email", "Ops@Acme.Test").unwrap(),
            "ops@acme.test"
        );
        for bad in ["", "a@", "@b.co", "a@b", "a@b.", "a b@c.io", "a@@b.io"] {
            assert!(validate_email("customer_email", bad).is_err(), "{bad}");
        }
    }
}
