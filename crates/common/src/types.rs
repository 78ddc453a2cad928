use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Returns `len` hex characters drawn from a fresh v4 UUID.
fn random_hex(len: usize) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..len].to_string()
}

/// Unique identifier for a merchant, e.g. `MERCH_3F2A9C01BD`.
///
/// Immutable once issued. The ledger enforces uniqueness; generation only
/// needs to make collisions unlikely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantId(String);

impl MerchantId {
    pub const PREFIX: &'static str = "MERCH_";

    /// Generates a new random merchant ID.
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, random_hex(10).to_uppercase()))
    }

    /// Wraps an existing merchant ID string without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MerchantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MerchantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MerchantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for MerchantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a transaction, e.g. `TXN_9C1E22AB0F4D7A61`.
///
/// Generated once at creation and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub const PREFIX: &'static str = "TXN_";

    /// Generates a new random transaction ID.
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, random_hex(16).to_uppercase()))
    }

    /// Wraps an existing transaction ID string without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TransactionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TransactionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Secret credential issued to a merchant at registration.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub const PREFIX: &'static str = "sk_live_";

    /// Generates a new random API key (`sk_live_` + 32 hex characters).
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, random_hex(32)))
    }

    /// Wraps an existing key string without validation.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keys must not leak into logs through `{:?}`.
impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey({}***)", Self::PREFIX)
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}
