//! HTTP API server with observability for the payment orchestration engine.
//!
//! Provides REST endpoints for merchant onboarding, transaction processing
//! and analytics, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use analytics::AnalyticsEngine;
use axum::Router;
use axum::routing::{get, post};
use ledger::LedgerStore;
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::{GatewayRegistry, MerchantService, TransactionOrchestrator};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: LedgerStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::status::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/", get(routes::status::root))
        .route("/health", get(routes::status::health))
        .route(
            "/merchants",
            post(routes::merchants::create::<S>).get(routes::merchants::list::<S>),
        )
        .route("/merchants/me", get(routes::merchants::me::<S>))
        .route("/merchants/{merchant_id}", get(routes::merchants::get::<S>))
        .route(
            "/merchants/{merchant_id}/deactivate",
            post(routes::merchants::deactivate::<S>),
        )
        .route(
            "/transactions",
            post(routes::transactions::create::<S>).get(routes::transactions::list::<S>),
        )
        .route(
            "/transactions/{transaction_id}",
            get(routes::transactions::get::<S>),
        )
        .route(
            "/transactions/{transaction_id}/reconcile",
            post(routes::transactions::reconcile::<S>),
        )
        .route("/analytics/stats", get(routes::analytics::stats::<S>))
        .route(
            "/analytics/gateway-performance",
            get(routes::analytics::gateway_performance::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state backed by simulated gateways.
pub fn create_default_state<S: LedgerStore + Clone + 'static>(
    store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    create_state(store, GatewayRegistry::simulated(&config.simulation), config)
}

/// Creates application state over an explicit set of gateway adapters.
///
/// Only gateways present in `gateways` are routable; the configured default
/// gateway must be one of them.
pub fn create_state<S: LedgerStore + Clone + 'static>(
    store: S,
    gateways: GatewayRegistry,
    config: &Config,
) -> Arc<AppState<S>> {
    let router = orchestrator::Router::new(
        gateways.kinds(),
        config.default_gateway,
        config.unknown_gateway_policy,
    );

    let merchants = MerchantService::new(store.clone(), router.clone());
    let orchestrator = TransactionOrchestrator::new(store.clone(), router, gateways)
        .with_gateway_timeout(config.gateway_timeout);
    let analytics = AnalyticsEngine::new(store);

    Arc::new(AppState {
        merchants,
        orchestrator,
        analytics,
    })
}
