//! Deterministic gateway for tests.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use domain::{GatewayKind, GatewayOutcome};

use super::{GatewayRequest, PaymentGateway, gateway_reference};

#[derive(Debug, Default)]
struct ScriptState {
    decline: AtomicBool,
    calls: AtomicUsize,
    next_ref: AtomicU64,
    delay: Mutex<Duration>,
}

/// Gateway test double with scripted answers.
///
/// Clones share state, so a test can keep a handle after registering the
/// adapter and inspect how often it was called.
#[derive(Debug, Clone)]
pub struct ScriptedGateway {
    kind: GatewayKind,
    state: Arc<ScriptState>,
}

impl ScriptedGateway {
    /// Creates an adapter that approves every call.
    pub fn approving(kind: GatewayKind) -> Self {
        Self {
            kind,
            state: Arc::default(),
        }
    }

    /// Creates an adapter that declines every call.
    pub fn declining(kind: GatewayKind) -> Self {
        let gateway = Self::approving(kind);
        gateway.set_decline(true);
        gateway
    }

    /// Switches between approving and declining.
    pub fn set_decline(&self, decline: bool) {
        self.state.decline.store(decline, Ordering::SeqCst);
    }

    /// Delays every subsequent call by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self
            .state
            .delay
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = delay;
    }

    /// Returns the number of calls received, including ones still in flight.
    pub fn call_count(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    fn delay(&self) -> Duration {
        *self
            .state
            .delay
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    fn kind(&self) -> GatewayKind {
        self.kind
    }

    async fn submit(&self, _request: &GatewayRequest) -> GatewayOutcome {
        self.state.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let n = self.state.next_ref.fetch_add(1, Ordering::SeqCst) + 1;
        let reference = gateway_reference(self.kind, n);
        if self.state.decline.load(Ordering::SeqCst) {
            GatewayOutcome::declined(self.kind, reference)
        } else {
            GatewayOutcome::approved(self.kind, reference)
        }
    }
}

#[cfg(test)]
mod tests {
    use common::{MerchantId, TransactionId};
    use domain::Currency;
    use rust_decimal_macros::dec;

    use super::*;

    fn request() -> GatewayRequest {
        GatewayRequest {
            transaction_id: TransactionId::generate(),
            merchant_id: MerchantId::new("MERCH_0000000001"),
            amount: dec!(1),
            currency: Currency::default(),
            customer_email: "c@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn scripted_answers_and_call_count() {
        let gateway = ScriptedGateway::approving(GatewayKind::Razorpay);
        let handle = gateway.clone();

        let first = gateway.submit(&request()).await;
        assert!(first.succeeded);
        assert_eq!(
            first.gateway_transaction_ref.as_deref(),
            Some("razorpay_000000000001")
        );

        handle.set_decline(true);
        let second = gateway.submit(&request()).await;
        assert!(!second.succeeded);
        assert_eq!(second.message, "Insufficient funds");

        assert_eq!(handle.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn injected_delay() {
        let gateway = ScriptedGateway::declining(GatewayKind::Paytm);
        gateway.set_delay(Duration::from_secs(30));

        let started = tokio::time::Instant::now();
        let outcome = gateway.submit(&request()).await;
        assert!(!outcome.succeeded);
        assert!(started.elapsed() >= Duration::from_secs(30));
    }
}
