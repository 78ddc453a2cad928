//! Transaction orchestration.
//!
//! A payment moves through four steps:
//! 1. validate the request and route it (no ledger write on failure)
//! 2. insert a `pending` row
//! 3. call the routed gateway once, with no store lock held
//! 4. conditionally move the row from `pending` to its terminal status

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::TransactionId;
use domain::{CreateTransaction, GatewayKind, GatewayOutcome, Transaction, ValidatedFields};
use ledger::{LedgerError, LedgerStore, LedgerStoreExt, TransactionQuery};

use crate::error::{OrchestratorError, Result};
use crate::gateways::{GatewayRegistry, GatewayRequest, PaymentGateway};
use crate::merchants::MAX_IDENTITY_ATTEMPTS;
use crate::router::Router;

/// Deadline applied to each gateway call unless configured otherwise.
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(5);

/// How often a replay re-reads an in-flight transaction.
const REPLAY_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Extra wait, beyond the gateway timeout, before a replay gives up on an
/// in-flight transaction.
const REPLAY_GRACE: Duration = Duration::from_secs(1);

/// Creates, reads and reconciles transactions.
pub struct TransactionOrchestrator<S: LedgerStore> {
    store: S,
    router: Router,
    gateways: GatewayRegistry,
    gateway_timeout: Duration,
}

impl<S: LedgerStore> TransactionOrchestrator<S> {
    /// Creates an orchestrator with the default gateway timeout.
    pub fn new(store: S, router: Router, gateways: GatewayRegistry) -> Self {
        Self {
            store,
            router,
            gateways,
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }

    /// Sets the per-call gateway deadline.
    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    pub fn gateway_timeout(&self) -> Duration {
        self.gateway_timeout
    }

    /// Charges a customer and records the result.
    ///
    /// Returns the persisted transaction in its terminal status. A gateway
    /// decline is a `failed` transaction, not an error. Replaying an
    /// idempotency key returns the transaction already recorded under it
    /// without calling the gateway again, waiting for it to settle if the
    /// first request is still in flight.
    ///
    /// Once the `pending` row is written, the gateway call and completion
    /// run on a spawned task, so dropping the returned future does not
    /// leave the row pending.
    #[tracing::instrument(
        skip(self, command),
        fields(merchant_id = %command.merchant_id, amount = %command.amount)
    )]
    pub async fn create_transaction(&self, command: CreateTransaction) -> Result<Transaction>
    where
        S: Clone + 'static,
    {
        let fields = command.validate()?;
        let (merchant, gateway) = self
            .router
            .route(&self.store, &command.merchant_id, command.gateway.as_deref())
            .await?;
        let adapter = self
            .gateways
            .get(gateway)
            .ok_or(OrchestratorError::GatewayUnavailable(gateway))?;

        if let Some(key) = &fields.idempotency_key
            && let Some(existing) = self
                .store
                .find_by_idempotency_key(&merchant.merchant_id, key)
                .await?
        {
            return self.replay_settled(existing, &fields, gateway).await;
        }

        let pending = match self
            .insert_pending(Transaction::pending(merchant.merchant_id, gateway, fields.clone()))
            .await
        {
            Ok(pending) => pending,
            // Lost a race with a concurrent request carrying the same key.
            Err(OrchestratorError::IdempotencyConflict { merchant_id, key }) => {
                let existing = self
                    .store
                    .find_by_idempotency_key(&merchant_id, &key)
                    .await?
                    .ok_or(OrchestratorError::IdempotencyConflict { merchant_id, key })?;
                return self.replay_settled(existing, &fields, gateway).await;
            }
            Err(e) => return Err(e),
        };

        let settlement = tokio::spawn(Self::settle(
            self.store.clone(),
            adapter,
            pending,
            self.gateway_timeout,
        ));
        settlement
            .await
            .map_err(|e| OrchestratorError::SettlementAborted(e.to_string()))?
    }

    /// Retrieves a transaction by ID.
    pub async fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Transaction> {
        Ok(self.store.require_transaction(transaction_id).await?)
    }

    /// Lists transactions newest first.
    pub async fn list_transactions(&self, query: TransactionQuery) -> Result<Vec<Transaction>> {
        Ok(self.store.list_transactions(query).await?)
    }

    /// Flags a terminal transaction as reconciled. Idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self, transaction_id: &TransactionId) -> Result<Transaction> {
        let transaction = self.store.mark_reconciled(transaction_id).await?;
        tracing::info!(status = %transaction.status, "transaction reconciled");
        Ok(transaction)
    }

    /// Replays a recorded transaction, waiting while it is still pending.
    async fn replay_settled(
        &self,
        existing: Transaction,
        fields: &ValidatedFields,
        gateway: GatewayKind,
    ) -> Result<Transaction> {
        let mut current = Self::replay(existing, fields, gateway)?;
        let deadline = tokio::time::Instant::now() + self.gateway_timeout + REPLAY_GRACE;

        while !current.status.is_terminal() {
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(
                    transaction_id = %current.transaction_id,
                    "replayed transaction still pending"
                );
                return Err(OrchestratorError::RequestInProgress {
                    merchant_id: current.merchant_id,
                    key: current.idempotency_key.unwrap_or_default(),
                });
            }
            tokio::time::sleep(REPLAY_POLL_INTERVAL).await;
            current = self
                .store
                .require_transaction(&current.transaction_id)
                .await?;
        }

        Ok(current)
    }

    fn replay(
        existing: Transaction,
        fields: &ValidatedFields,
        gateway: GatewayKind,
    ) -> Result<Transaction> {
        if existing.matches_request(fields, gateway) {
            tracing::info!(
                transaction_id = %existing.transaction_id,
                "idempotent replay, returning recorded transaction"
            );
            return Ok(existing);
        }
        Err(OrchestratorError::IdempotencyConflict {
            merchant_id: existing.merchant_id,
            key: existing.idempotency_key.unwrap_or_default(),
        })
    }

    async fn insert_pending(&self, mut transaction: Transaction) -> Result<Transaction> {
        for attempt in 1..=MAX_IDENTITY_ATTEMPTS {
            match self.store.insert_transaction(transaction.clone()).await {
                Ok(stored) => return Ok(stored),
                Err(e @ LedgerError::DuplicateTransactionId(_)) => {
                    tracing::warn!(attempt, error = %e, "transaction id collision, regenerating");
                    transaction = transaction.with_fresh_id();
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(OrchestratorError::IdentityExhausted {
            attempts: MAX_IDENTITY_ATTEMPTS,
        })
    }

    /// Calls the gateway once and moves the pending row to its terminal status.
    async fn settle(
        store: S,
        adapter: Arc<dyn PaymentGateway>,
        pending: Transaction,
        gateway_timeout: Duration,
    ) -> Result<Transaction> {
        let gateway = adapter.kind();
        let outcome = call_gateway(adapter.as_ref(), &pending, gateway_timeout).await;
        let completed = store
            .complete_transaction(&pending.transaction_id, outcome)
            .await?;

        metrics::counter!(
            "transactions_created_total",
            "gateway" => gateway.as_str(),
            "status" => completed.status.as_str()
        )
        .increment(1);
        tracing::info!(
            transaction_id = %completed.transaction_id,
            gateway = %gateway,
            status = %completed.status,
            "transaction completed"
        );

        Ok(completed)
    }
}

async fn call_gateway(
    adapter: &dyn PaymentGateway,
    transaction: &Transaction,
    gateway_timeout: Duration,
) -> GatewayOutcome {
    let gateway = adapter.kind();
    let request = GatewayRequest::from(transaction);
    let started = Instant::now();

    let outcome = match tokio::time::timeout(gateway_timeout, adapter.submit(&request)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            let timeout_ms = u64::try_from(gateway_timeout.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(
                transaction_id = %transaction.transaction_id,
                gateway = %gateway,
                timeout_ms,
                "gateway call timed out"
            );
            GatewayOutcome::timed_out(gateway, timeout_ms)
        }
    };

    metrics::histogram!("gateway_call_duration_seconds", "gateway" => gateway.as_str())
        .record(started.elapsed().as_secs_f64());
    outcome
}
