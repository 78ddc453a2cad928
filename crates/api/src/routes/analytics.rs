//! Read-only statistics over the ledger.

use std::collections::BTreeMap;
use std::sync::Arc;

use analytics::{GatewayPerformance, TransactionStats};
use axum::Json;
use axum::extract::{Query, State};
use common::MerchantId;
use domain::GatewayKind;
use ledger::LedgerStore;
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub merchant_id: Option<String>,
}

/// GET /analytics/stats: totals, volume and success rate.
#[tracing::instrument(skip(state))]
pub async fn stats<S: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<StatsParams>,
) -> Result<Json<TransactionStats>, ApiError> {
    let merchant_id = params.merchant_id.map(MerchantId::new);
    Ok(Json(state.analytics.stats(merchant_id).await?))
}

/// GET /analytics/gateway-performance: figures keyed by gateway name.
#[tracing::instrument(skip(state))]
pub async fn gateway_performance<S: LedgerStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<BTreeMap<GatewayKind, GatewayPerformance>>, ApiError> {
    Ok(Json(state.analytics.gateway_performance().await?))
}
