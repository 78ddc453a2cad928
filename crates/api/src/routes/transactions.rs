//! Payment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::{MerchantId, Page, TransactionId};
use domain::{CreateTransaction, GatewayKind, GatewayOutcome, Transaction, TransactionStatus};
use ledger::{LedgerStore, TransactionQuery};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;

/// Header carrying a client-chosen idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

// -- Request types --

#[derive(Deserialize)]
pub struct CreateTransactionRequest {
    pub merchant_id: String,
    pub amount: Decimal,
    pub currency: Option<String>,
    /// Omitted means the merchant's preferred gateway.
    pub gateway: Option<String>,
    pub customer_email: String,
    pub customer_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListTransactionsParams {
    pub merchant_id: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    Page::DEFAULT_LIMIT
}

// -- Response types --

#[derive(Serialize)]
pub struct TransactionResponse {
    pub transaction_id: TransactionId,
    pub merchant_id: MerchantId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub gateway: GatewayKind,
    pub status: TransactionStatus,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub idempotency_key: Option<String>,
    pub gateway_response: Option<GatewayOutcome>,
    pub is_reconciled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(txn: Transaction) -> Self {
        Self {
            currency: txn.currency.as_str().to_string(),
            transaction_id: txn.transaction_id,
            merchant_id: txn.merchant_id,
            amount: txn.amount,
            gateway: txn.gateway,
            status: txn.status,
            customer_email: txn.customer_email,
            customer_phone: txn.customer_phone,
            idempotency_key: txn.idempotency_key,
            gateway_response: txn.gateway_response,
            is_reconciled: txn.is_reconciled,
            created_at: txn.created_at,
            updated_at: txn.updated_at,
        }
    }
}

// -- Handlers --

/// POST /transactions: route, charge and record a payment.
///
/// A gateway decline still answers 201; the body carries `status: "failed"`.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let mut command = CreateTransaction::new(
        MerchantId::new(req.merchant_id),
        req.amount,
        req.customer_email,
    );
    if let Some(currency) = req.currency {
        command = command.in_currency(currency);
    }
    if let Some(gateway) = req.gateway {
        command = command.via(gateway);
    }
    if let Some(phone) = req.customer_phone {
        command = command.with_phone(phone);
    }
    if let Some(key) = idempotency_key(&headers)? {
        command = command.with_idempotency_key(key);
    }

    let transaction = state.orchestrator.create_transaction(command).await?;
    Ok((StatusCode::CREATED, Json(transaction.into())))
}

/// GET /transactions: newest first, filtered by merchant and status.
#[tracing::instrument(skip(state))]
pub async fn list<S: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListTransactionsParams>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<TransactionStatus>)
        .transpose()?;

    let query = TransactionQuery::new()
        .merchant(params.merchant_id.map(MerchantId::new))
        .status(status)
        .page(Page::new(params.skip, params.limit));

    let transactions = state.orchestrator.list_transactions(query).await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

/// GET /transactions/{transaction_id}
#[tracing::instrument(skip(state))]
pub async fn get<S: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(transaction_id): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let transaction = state
        .orchestrator
        .get_transaction(&TransactionId::new(transaction_id))
        .await?;
    Ok(Json(transaction.into()))
}

/// POST /transactions/{transaction_id}/reconcile: flag a settled transaction.
#[tracing::instrument(skip(state))]
pub async fn reconcile<S: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(transaction_id): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let transaction = state
        .orchestrator
        .reconcile(&TransactionId::new(transaction_id))
        .await?;
    Ok(Json(transaction.into()))
}

fn idempotency_key(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    let key = value
        .to_str()
        .map_err(|_| ApiError::Unprocessable("Idempotency-Key must be visible ASCII".to_string()))?
        .trim();
    if key.is_empty() {
        return Err(ApiError::Unprocessable(
            "Idempotency-Key must not be empty".to_string(),
        ));
    }
    Ok(Some(key.to_string()))
}
