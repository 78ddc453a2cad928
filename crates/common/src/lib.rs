//! Shared types used across the payment orchestration crates.

pub mod pagination;
pub mod types;

pub use pagination::Page;
pub use types::{ApiKey, MerchantId, TransactionId};
