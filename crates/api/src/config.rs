//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use domain::GatewayKind;
use orchestrator::{DEFAULT_GATEWAY_TIMEOUT, SimulationConfig, UnknownGatewayPolicy};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default `8000`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset keeps the ledger in memory
/// - `DEFAULT_GATEWAY`: gateway for merchants without a preference (default `razorpay`)
/// - `UNKNOWN_GATEWAY_POLICY`: `fallback` or `reject` (default `fallback`)
/// - `GATEWAY_TIMEOUT_MS`: deadline for each gateway call (default `5000`)
/// - `GATEWAY_SUCCESS_RATE`: approval probability of simulated gateways (default `0.9`)
/// - `GATEWAY_LATENCY_MS`: artificial latency of simulated gateways (default `0`)
/// - `GATEWAY_SEED`: base seed for simulated gateways; unset draws from entropy
///
/// Unparseable values fall back to the default.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub default_gateway: GatewayKind,
    pub unknown_gateway_policy: UnknownGatewayPolicy,
    pub gateway_timeout: Duration,
    pub simulation: SimulationConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            default_gateway: parse_var(&lookup, "DEFAULT_GATEWAY")
                .unwrap_or(defaults.default_gateway),
            unknown_gateway_policy: parse_var(&lookup, "UNKNOWN_GATEWAY_POLICY")
                .unwrap_or(defaults.unknown_gateway_policy),
            gateway_timeout: parse_var(&lookup, "GATEWAY_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.gateway_timeout),
            simulation: SimulationConfig {
                success_rate: parse_var(&lookup, "GATEWAY_SUCCESS_RATE")
                    .unwrap_or(defaults.simulation.success_rate),
                latency: parse_var(&lookup, "GATEWAY_LATENCY_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.simulation.latency),
                seed: parse_var(&lookup, "GATEWAY_SEED"),
            },
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            database_url: None,
            default_gateway: GatewayKind::Razorpay,
            unknown_gateway_policy: UnknownGatewayPolicy::default(),
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            simulation: SimulationConfig::default(),
        }
    }
}
