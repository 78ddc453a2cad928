//! Stochastic stand-in for a real gateway.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use domain::{GatewayKind, GatewayOutcome};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{GatewayRequest, PaymentGateway, gateway_reference};

/// Behaviour shared by every simulated adapter in a registry.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Probability in `[0, 1]` that a call is approved.
    pub success_rate: f64,

    /// Artificial network time added to every call.
    pub latency: Duration,

    /// Base seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub const DEFAULT_SUCCESS_RATE: f64 = 0.9;
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            success_rate: Self::DEFAULT_SUCCESS_RATE,
            latency: Duration::ZERO,
            seed: None,
        }
    }
}

/// Simulated gateway that approves each call independently with a fixed
/// probability.
///
/// Every adapter owns its RNG, so a seeded adapter produces the same
/// sequence of outcomes and references on every run.
pub struct SimulatedGateway {
    kind: GatewayKind,
    success_rate: f64,
    latency: Duration,
    rng: Mutex<StdRng>,
}

impl SimulatedGateway {
    /// Creates an adapter with the default success rate and an entropy-seeded RNG.
    pub fn new(kind: GatewayKind) -> Self {
        Self {
            kind,
            success_rate: SimulationConfig::DEFAULT_SUCCESS_RATE,
            latency: Duration::ZERO,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates an adapter from shared simulation settings.
    pub fn from_config(kind: GatewayKind, config: &SimulationConfig) -> Self {
        let gateway = Self::new(kind)
            .with_success_rate(config.success_rate)
            .with_latency(config.latency);
        match config.seed {
            // Offset by gateway so adapters sharing a base seed stay independent.
            Some(seed) => gateway.with_seed(seed.wrapping_add(kind as u64)),
            None => gateway,
        }
    }

    /// Reseeds the RNG for reproducible outcomes.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Sets the approval probability, clamped to `[0, 1]`.
    pub fn with_success_rate(mut self, success_rate: f64) -> Self {
        self.success_rate = if success_rate.is_nan() {
            0.0
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        self
    }

    /// Adds artificial latency to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn sample(&self) -> (bool, u64) {
        // A poisoned lock only means another caller panicked mid-sample;
        // the RNG state is still usable.
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let approved = rng.gen_bool(self.success_rate);
        (approved, rng.r#gen::<u64>())
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    fn kind(&self) -> GatewayKind {
        self.kind
    }

    async fn submit(&self, request: &GatewayRequest) -> GatewayOutcome {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let (approved, token) = self.sample();
        let reference = gateway_reference(self.kind, token);

        tracing::debug!(
            gateway = %self.kind,
            transaction_id = %request.transaction_id,
            approved,
            "simulated gateway answered"
        );

        if approved {
            GatewayOutcome::approved(self.kind, reference)
        } else {
            GatewayOutcome::declined(self.kind, reference)
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
            amount: dec!(10),
            currency: Currency::default(),
            customer_email: "c@example.com".to_string(),
        }
    }

    async fn run(gateway: &SimulatedGateway, calls: usize) -> Vec<GatewayOutcome> {
        let req = request();
        let mut outcomes = Vec::with_capacity(calls);
        for _ in 0..calls {
            outcomes.push(gateway.submit(&req).await);
        }
        outcomes
    }

    #[tokio::test]
    async fn seeded_adapters_are_reproducible() {
        let a = SimulatedGateway::new(GatewayKind::Razorpay).with_seed(42);
        let b = SimulatedGateway::new(GatewayKind::Razorpay).with_seed(42);

        assert_eq!(run(&a, 25).await, run(&b, 25).await);
    }

    #[tokio::test]
    async fn always_approves_at_rate_one() {
        let gateway = SimulatedGateway::new(GatewayKind::Stripe)
            .with_success_rate(1.0)
            .with_seed(7);

        for outcome in run(&gateway, 20).await {
            assert!(outcome.succeeded);
            assert_eq!(outcome.message, "Payment completed");
            let reference = outcome.gateway_transaction_ref.unwrap();
            assert!(reference.starts_with("stripe_"));
            assert_eq!(reference.len(), "stripe_".len() + 12);
        }
    }

    #[tokio::test]
    async fn always_declines_at_rate_zero() {
        let gateway = SimulatedGateway::new(GatewayKind::Phonepe).with_success_rate(0.0);

        for outcome in run(&gateway, 20).await {
            assert!(!outcome.succeeded);
            assert_eq!(outcome.message, "UPI transaction failed");
            assert!(!outcome.timed_out);
        }
    }

    #[tokio::test]
    async fn default_rate_is_roughly_ninety_percent() {
        let gateway = SimulatedGateway::new(GatewayKind::Paytm).with_seed(1234);
        let approved = run(&gateway, 2_000)
            .await
            .iter()
            .filter(|o| o.succeeded)
            .count();

        assert!((1_700..=1_900).contains(&approved), "approved = {approved}");
    }

    #[test]
    fn out_of_range_rates_are_clamped() {
        let gateway = SimulatedGateway::new(GatewayKind::Paytm).with_success_rate(3.5);
        assert_eq!(gateway.success_rate, 1.0);

        let gateway = SimulatedGateway::new(GatewayKind::Paytm).with_success_rate(f64::NAN);
        assert_eq!(gateway.success_rate, 0.0);
    }

    #[test]
    fn shared_seed_gives_each_gateway_its_own_stream() {
        let config = SimulationConfig {
            seed: Some(99),
            ..Default::default()
        };
        let razorpay = SimulatedGateway::from_config(GatewayKind::Razorpay, &config);
        let stripe = SimulatedGateway::from_config(GatewayKind::Stripe, &config);

        let a: Vec<_> = (0..8).map(|_| razorpay.sample().1).collect();
        let b: Vec<_> = (0..8).map(|_| stripe.sample().1).collect();
        assert_ne!(a, b);
    }
}
