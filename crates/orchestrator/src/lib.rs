//! Payment orchestration.
//!
//! This crate turns validated requests into ledger entries:
//! - [`Router`] picks a gateway and checks the merchant may transact
//! - [`gateways`] holds the [`PaymentGateway`] adapters
//! - [`MerchantService`] onboards and looks up merchants
//! - [`TransactionOrchestrator`] drives a payment from `pending` to its
//!   terminal status
//!
//! Concurrent requests share nothing but the ledger store; its uniqueness
//! constraints are the only cross-request synchronization.

pub mod error;
pub mod gateways;
pub mod merchants;
pub mod orchestrator;
pub mod router;

pub use error::{OrchestratorError, Result};
pub use gateways::{
    GatewayRegistry, GatewayRequest, PaymentGateway, ScriptedGateway, SimulatedGateway,
    SimulationConfig,
};
pub use merchants::{MAX_IDENTITY_ATTEMPTS, MerchantService};
pub use orchestrator::{DEFAULT_GATEWAY_TIMEOUT, TransactionOrchestrator};
pub use router::{Router, UnknownGatewayPolicy};
