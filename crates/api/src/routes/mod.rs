//! HTTP handlers, grouped by resource.

pub mod analytics;
pub mod merchants;
pub mod status;
pub mod transactions;

use ::analytics::AnalyticsEngine;
use ledger::LedgerStore;
use orchestrator::{MerchantService, TransactionOrchestrator};

/// Shared application state accessible from all handlers.
pub struct AppState<S: LedgerStore> {
    pub merchants: MerchantService<S>,
    pub orchestrator: TransactionOrchestrator<S>,
    pub analytics: AnalyticsEngine<S>,
}
