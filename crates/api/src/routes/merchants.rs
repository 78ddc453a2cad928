//! Merchant onboarding endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::{ApiKey, MerchantId, Page};
use domain::{GatewayKind, Merchant, RegisterMerchant};
use ledger::LedgerStore;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;

/// Header carrying a merchant's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

// -- Request types --

#[derive(Deserialize)]
pub struct RegisterMerchantRequest {
    pub merchant_name: String,
    pub email: String,
    pub preferred_gateway: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct MerchantResponse {
    pub merchant_id: MerchantId,
    pub merchant_name: String,
    pub email: String,
    pub api_key: String,
    pub preferred_gateway: GatewayKind,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Merchant> for MerchantResponse {
    fn from(merchant: Merchant) -> Self {
        Self {
            api_key: merchant.api_key.as_str().to_string(),
            merchant_id: merchant.merchant_id,
            merchant_name: merchant.merchant_name,
            email: merchant.email,
            preferred_gateway: merchant.preferred_gateway,
            is_active: merchant.is_active,
            created_at: merchant.created_at,
        }
    }
}

// -- Handlers --

/// POST /merchants: register a merchant and issue its API key.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterMerchantRequest>,
) -> Result<(StatusCode, Json<MerchantResponse>), ApiError> {
    let mut command = RegisterMerchant::new(req.merchant_name, req.email);
    if let Some(gateway) = req.preferred_gateway {
        command = command.with_preferred_gateway(gateway);
    }

    let merchant = state.merchants.register(command).await?;
    Ok((StatusCode::CREATED, Json(merchant.into())))
}

/// GET /merchants: list merchants in registration order.
#[tracing::instrument(skip(state))]
pub async fn list<S: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<MerchantResponse>>, ApiError> {
    let merchants = state.merchants.list(page.clamped()).await?;
    Ok(Json(merchants.into_iter().map(Into::into).collect()))
}

/// GET /merchants/{merchant_id}
#[tracing::instrument(skip(state))]
pub async fn get<S: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(merchant_id): Path<String>,
) -> Result<Json<MerchantResponse>, ApiError> {
    let merchant = state.merchants.get(&MerchantId::new(merchant_id)).await?;
    Ok(Json(merchant.into()))
}

/// GET /merchants/me: look up the merchant owning the `X-API-Key` header.
#[tracing::instrument(skip(state, headers))]
pub async fn me<S: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<MerchantResponse>, ApiError> {
    let key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing API key".to_string()))?;

    let merchant = state.merchants.authenticate(&ApiKey::new(key)).await?;
    Ok(Json(merchant.into()))
}

/// POST /merchants/{merchant_id}/deactivate: stop accepting new transactions.
#[tracing::instrument(skip(state))]
pub async fn deactivate<S: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(merchant_id): Path<String>,
) -> Result<Json<MerchantResponse>, ApiError> {
    let merchant = state
        .merchants
        .deactivate(&MerchantId::new(merchant_id))
        .await?;
    Ok(Json(merchant.into()))
}
