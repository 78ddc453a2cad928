use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{ApiKey, MerchantId, Page, TransactionId};
use domain::{GatewayOutcome, Merchant, Transaction};
use tokio::sync::RwLock;

use crate::{
    LedgerError, Result, TransactionQuery,
    store::{LedgerStore, TransactionStream},
};

/// Rows and unique indexes, guarded by a single lock so that every
/// uniqueness check and its insert happen atomically.
#[derive(Default)]
struct Tables {
    merchants: Vec<Merchant>,
    merchants_by_id: HashMap<MerchantId, usize>,
    merchants_by_email: HashMap<String, usize>,
    merchants_by_api_key: HashMap<ApiKey, usize>,
    transactions: Vec<Transaction>,
    transactions_by_id: HashMap<TransactionId, usize>,
    idempotency_keys: HashMap<(MerchantId, String), usize>,
}

/// In-memory ledger implementation.
///
/// Provides the same interface and uniqueness guarantees as the PostgreSQL
/// implementation. Used by tests and by the server when no database is
/// configured.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryLedgerStore {
    /// Creates a new empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of merchants stored.
    pub async fn merchant_count(&self) -> usize {
        self.tables.read().await.merchants.len()
    }

    /// Returns the total number of transactions stored.
    pub async fn transaction_count(&self) -> usize {
        self.tables.read().await.transactions.len()
    }

    fn matching(tables: &Tables, query: &TransactionQuery) -> Vec<Transaction> {
        tables
            .transactions
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_merchant(&self, merchant: Merchant) -> Result<Merchant> {
        let mut tables = self.tables.write().await;

        if tables.merchants_by_email.contains_key(&merchant.email) {
            return Err(LedgerError::DuplicateEmail(merchant.email));
        }
        if tables.merchants_by_id.contains_key(&merchant.merchant_id) {
            return Err(LedgerError::DuplicateMerchantId(merchant.merchant_id));
        }
        if tables.merchants_by_api_key.contains_key(&merchant.api_key) {
            return Err(LedgerError::DuplicateApiKey);
        }

        let idx = tables.merchants.len();
        tables
            .merchants_by_id
            .insert(merchant.merchant_id.clone(), idx);
        tables
            .merchants_by_email
            .insert(merchant.email.clone(), idx);
        tables
            .merchants_by_api_key
            .insert(merchant.api_key.clone(), idx);
        tables.merchants.push(merchant.clone());

        Ok(merchant)
    }

    async fn get_merchant(&self, merchant_id: &MerchantId) -> Result<Option<Merchant>> {
        let tables = self.tables.read().await;
        Ok(tables
            .merchants_by_id
            .get(merchant_id)
            .map(|&idx| tables.merchants[idx].clone()))
    }

    async fn get_merchant_by_api_key(&self, api_key: &ApiKey) -> Result<Option<Merchant>> {
        let tables = self.tables.read().await;
        Ok(tables
            .merchants_by_api_key
            .get(api_key)
            .map(|&idx| tables.merchants[idx].clone()))
    }

    async fn list_merchants(&self, page: Page) -> Result<Vec<Merchant>> {
        let page = page.clamped();
        let tables = self.tables.read().await;
        Ok(tables
            .merchants
            .iter()
            .skip(page.skip)
            .take(page.limit)
            .cloned()
            .collect())
    }

    async fn deactivate_merchant(&self, merchant_id: &MerchantId) -> Result<Merchant> {
        let mut tables = self.tables.write().await;
        let idx = *tables
            .merchants_by_id
            .get(merchant_id)
            .ok_or_else(|| LedgerError::MerchantNotFound(merchant_id.clone()))?;

        let merchant = &mut tables.merchants[idx];
        merchant.deactivate();
        Ok(merchant.clone())
    }

    async fn insert_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        let mut tables = self.tables.write().await;

        if !tables
            .merchants_by_id
            .contains_key(&transaction.merchant_id)
        {
            return Err(LedgerError::MerchantNotFound(transaction.merchant_id));
        }
        if tables
            .transactions_by_id
            .contains_key(&transaction.transaction_id)
        {
            return Err(LedgerError::DuplicateTransactionId(
                transaction.transaction_id,
            ));
        }
        let idempotency_slot = transaction
            .idempotency_key
            .clone()
            .map(|key| (transaction.merchant_id.clone(), key));
        if let Some(slot) = &idempotency_slot
            && tables.idempotency_keys.contains_key(slot)
        {
            let (merchant_id, key) = slot.clone();
            return Err(LedgerError::DuplicateIdempotencyKey { merchant_id, key });
        }

        let idx = tables.transactions.len();
        tables
            .transactions_by_id
            .insert(transaction.transaction_id.clone(), idx);
        if let Some(slot) = idempotency_slot {
            tables.idempotency_keys.insert(slot, idx);
        }
        tables.transactions.push(transaction.clone());

        Ok(transaction)
    }

    async fn get_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Transaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .transactions_by_id
            .get(transaction_id)
            .map(|&idx| tables.transactions[idx].clone()))
    }

    async fn find_by_idempotency_key(
        &self,
        merchant_id: &MerchantId,
        key: &str,
    ) -> Result<Option<Transaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .idempotency_keys
            .get(&(merchant_id.clone(), key.to_string()))
            .map(|&idx| tables.transactions[idx].clone()))
    }

    async fn complete_transaction(
        &self,
        transaction_id: &TransactionId,
        outcome: GatewayOutcome,
    ) -> Result<Transaction> {
        let mut tables = self.tables.write().await;
        let idx = *tables
            .transactions_by_id
            .get(transaction_id)
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.clone()))?;

        let transaction = &mut tables.transactions[idx];
        transaction.complete(outcome, Utc::now())?;
        Ok(transaction.clone())
    }

    async fn mark_reconciled(&self, transaction_id: &TransactionId) -> Result<Transaction> {
        let mut tables = self.tables.write().await;
        let idx = *tables
            .transactions_by_id
            .get(transaction_id)
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.clone()))?;

        let transaction = &mut tables.transactions[idx];
        transaction.mark_reconciled()?;
        Ok(transaction.clone())
    }

    async fn list_transactions(&self, query: TransactionQuery) -> Result<Vec<Transaction>> {
        let tables = self.tables.read().await;
        let mut transactions = Self::matching(&tables, &query);
        drop(tables);

        // Reverse first so the stable sort keeps later inserts ahead on ties.
        transactions.reverse();
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = query.offset.unwrap_or(0);
        let transactions = transactions.into_iter().skip(offset);
        let transactions = match query.limit {
            Some(limit) => transactions.take(limit).collect(),
            None => transactions.collect(),
        };

        Ok(transactions)
    }

    async fn stream_transactions(&self, query: TransactionQuery) -> Result<TransactionStream> {
        use futures_util::stream;

        let tables = self.tables.read().await;
        let transactions = Self::matching(&tables, &query);

        let stream = stream::iter(transactions.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }
}
