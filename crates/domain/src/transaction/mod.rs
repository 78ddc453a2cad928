//! Transaction record, status state machine and related value objects.

mod commands;
mod record;
mod state;
mod value_objects;

pub use commands::{CreateTransaction, ValidatedFields};
pub use record::Transaction;
pub use state::TransactionStatus;
pub use value_objects::{Currency, validate_amount, validate_email};
