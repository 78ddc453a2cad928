use common::{MerchantId, Page};
use domain::{GatewayKind, Transaction, TransactionStatus};

/// Builder for constructing transaction queries.
///
/// Filters combine with AND. Results from [`crate::LedgerStore::list_transactions`]
/// are ordered newest first.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    /// Filter by owning merchant.
    pub merchant_id: Option<MerchantId>,

    /// Filter by status.
    pub status: Option<TransactionStatus>,

    /// Filter by the gateway used.
    pub gateway: Option<GatewayKind>,

    /// Number of transactions to skip.
    pub offset: Option<usize>,

    /// Maximum number of transactions to return.
    pub limit: Option<usize>,
}

impl TransactionQuery {
    /// Creates a new empty query matching every transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for one merchant's transactions.
    pub fn for_merchant(merchant_id: MerchantId) -> Self {
        Self {
            merchant_id: Some(merchant_id),
            ..Default::default()
        }
    }

    /// Filters by merchant, if one is given.
    pub fn merchant(mut self, merchant_id: Option<MerchantId>) -> Self {
        self.merchant_id = merchant_id;
        self
    }

    /// Filters by status, if one is given.
    pub fn status(mut self, status: Option<TransactionStatus>) -> Self {
        self.status = status;
        self
    }

    /// Filters by gateway.
    pub fn gateway(mut self, gateway: GatewayKind) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Applies a `skip`/`limit` window.
    pub fn page(mut self, page: Page) -> Self {
        let page = page.clamped();
        self.offset = Some(page.skip);
        self.limit = Some(page.limit);
        self
    }

    /// Skips the first `offset` matches.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if the transaction passes every filter (pagination aside).
    pub fn matches(&self, txn: &Transaction) -> bool {
        if let Some(ref merchant_id) = self.merchant_id
            && &txn.merchant_id != merchant_id
        {
            return false;
        }
        if let Some(status) = self.status
            && txn.status != status
        {
            return false;
        }
        if let Some(gateway) = self.gateway
            && txn.gateway != gateway
        {
            return false;
        }
        true
    }
}
