use std::collections::BTreeMap;
use std::sync::Arc;

use domain::GatewayKind;

use super::{PaymentGateway, SimulatedGateway, SimulationConfig};

/// Adapters keyed by the gateway they serve.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    adapters: BTreeMap<GatewayKind, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a simulated adapter for every supported gateway.
    pub fn simulated(config: &SimulationConfig) -> Self {
        GatewayKind::ALL
            .into_iter()
            .fold(Self::new(), |registry, kind| {
                registry.with(SimulatedGateway::from_config(kind, config))
            })
    }

    /// Adds an adapter, replacing any previous one for the same gateway.
    pub fn with(mut self, adapter: impl PaymentGateway + 'static) -> Self {
        self.register(Arc::new(adapter));
        self
    }

    /// Adds a shared adapter, replacing any previous one for the same gateway.
    pub fn register(&mut self, adapter: Arc<dyn PaymentGateway>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    /// Returns the adapter for a gateway.
    pub fn get(&self, kind: GatewayKind) -> Option<Arc<dyn PaymentGateway>> {
        self.adapters.get(&kind).cloned()
    }

    /// Returns true if an adapter is registered for the gateway.
    pub fn contains(&self, kind: GatewayKind) -> bool {
        self.adapters.contains_key(&kind)
    }

    /// Gateways with a registered adapter, in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = GatewayKind> + '_ {
        self.adapters.keys().copied()
    }
}

impl std::fmt::Debug for GatewayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}
