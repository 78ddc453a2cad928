//! Ledger store: the system of record for merchants and transactions.
//!
//! The [`LedgerStore`] trait is the only shared mutable resource in the
//! engine. Its uniqueness guarantees (merchant id, email, API key,
//! transaction id, idempotency key) are the synchronization primitive for
//! concurrent requests.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{LedgerError, Result};
pub use memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use query::TransactionQuery;
pub use store::{LedgerStore, LedgerStoreExt, TransactionStream};
