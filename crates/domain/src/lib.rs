//! Domain layer for the payment orchestration engine.
//!
//! This crate provides the core domain model:
//! - [`Merchant`] and the [`RegisterMerchant`] command
//! - [`Transaction`] with its monotonic [`TransactionStatus`] state machine
//! - [`GatewayKind`] and the structured [`GatewayOutcome`] a gateway returns
//! - Value validation for amounts, currencies and contact details

pub mod error;
pub mod gateway;
pub mod merchant;
pub mod transaction;

pub use error::DomainError;
pub use gateway::{GatewayKind, GatewayOutcome};
pub use merchant::{Merchant, RegisterMerchant};
pub use transaction::{
    CreateTransaction, Currency, Transaction, TransactionStatus, ValidatedFields, validate_amount,
    validate_email,
};
