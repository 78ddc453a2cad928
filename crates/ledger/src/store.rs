use std::pin::Pin;

use async_trait::async_trait;
use common::{ApiKey, MerchantId, Page, TransactionId};
use domain::{GatewayOutcome, Merchant, Transaction};
use futures_core::Stream;

use crate::{LedgerError, Result, TransactionQuery};

/// A stream of transactions.
pub type TransactionStream = Pin<Box<dyn Stream<Item = Result<Transaction>> + Send>>;

/// Core trait for ledger implementations.
///
/// Every uniqueness rule is enforced here rather than by callers:
/// merchant id, merchant email, API key, transaction id, and
/// `(merchant_id, idempotency_key)`. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts a newly registered merchant.
    ///
    /// Fails with `DuplicateEmail`, `DuplicateMerchantId` or `DuplicateApiKey`.
    async fn insert_merchant(&self, merchant: Merchant) -> Result<Merchant>;

    /// Retrieves a merchant by ID.
    async fn get_merchant(&self, merchant_id: &MerchantId) -> Result<Option<Merchant>>;

    /// Retrieves the merchant holding an API key.
    async fn get_merchant_by_api_key(&self, api_key: &ApiKey) -> Result<Option<Merchant>>;

    /// Lists merchants in registration order.
    async fn list_merchants(&self, page: Page) -> Result<Vec<Merchant>>;

    /// Marks a merchant inactive and returns the updated record.
    async fn deactivate_merchant(&self, merchant_id: &MerchantId) -> Result<Merchant>;

    /// Inserts a new transaction. Creation is the only insertion path.
    ///
    /// The owning merchant must exist. Fails with `DuplicateTransactionId`
    /// or `DuplicateIdempotencyKey` on uniqueness violations.
    async fn insert_transaction(&self, transaction: Transaction) -> Result<Transaction>;

    /// Retrieves a transaction by ID.
    async fn get_transaction(&self, transaction_id: &TransactionId)
    -> Result<Option<Transaction>>;

    /// Looks up the transaction a merchant recorded under an idempotency key.
    async fn find_by_idempotency_key(
        &self,
        merchant_id: &MerchantId,
        key: &str,
    ) -> Result<Option<Transaction>>;

    /// Atomically moves a pending transaction to the terminal status implied
    /// by `outcome`.
    ///
    /// Applies only while the stored status is still pending; otherwise fails
    /// with an invalid-transition error and leaves the row untouched.
    async fn complete_transaction(
        &self,
        transaction_id: &TransactionId,
        outcome: GatewayOutcome,
    ) -> Result<Transaction>;

    /// Sets `is_reconciled` on a terminal transaction.
    async fn mark_reconciled(&self, transaction_id: &TransactionId) -> Result<Transaction>;

    /// Lists transactions matching a query, newest first.
    ///
    /// Ties on `created_at` are broken by insertion order, later insert first.
    async fn list_transactions(&self, query: TransactionQuery) -> Result<Vec<Transaction>>;

    /// Streams every transaction matching the query's filters.
    ///
    /// Pagination fields are ignored. Transactions are yielded in insertion
    /// order; rows committed while the stream is open may or may not appear.
    async fn stream_transactions(&self, query: TransactionQuery) -> Result<TransactionStream>;
}

/// Extension trait providing convenience methods for ledger stores.
#[async_trait]
pub trait LedgerStoreExt: LedgerStore {
    /// Retrieves a merchant, failing with `MerchantNotFound` if absent.
    async fn require_merchant(&self, merchant_id: &MerchantId) -> Result<Merchant> {
        self.get_merchant(merchant_id)
            .await?
            .ok_or_else(|| LedgerError::MerchantNotFound(merchant_id.clone()))
    }

    /// Retrieves a transaction, failing with `TransactionNotFound` if absent.
    async fn require_transaction(&self, transaction_id: &TransactionId) -> Result<Transaction> {
        self.get_transaction(transaction_id)
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.clone()))
    }

    /// Counts transactions matching a query's filters.
    async fn count_transactions(&self, query: TransactionQuery) -> Result<usize> {
        use futures_util::TryStreamExt;

        self.stream_transactions(query)
            .await?
            .try_fold(0usize, |count, _| async move { Ok(count + 1) })
            .await
    }
}

// Blanket implementation for all LedgerStore implementations
impl<T: LedgerStore + ?Sized> LedgerStoreExt for T {}
