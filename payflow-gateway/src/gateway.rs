//! The gateway facade (C7, `SPEC_FULL.md` §4.7): the single entry point
//! embedding applications call into.
//!
//! Grounded on `examples/original_source/src/payment_gateway/gateway/payment_gateway.py`'s
//! `PaymentGateway` class: same provider/breaker/transaction registries,
//! same `simulate_scenario` dispatch table, same `retry_payment` contract
//! (now fixed to pass the transaction into re-selection, `SPEC_FULL.md` §9).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use payflow_core::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use payflow_core::models::{
    CustomerInfo, PaymentInstrument, ProviderHealth, RoutingStrategy, Transaction, TransactionType,
};
use payflow_core::provider::{Provider, ProviderOptions};
use payflow_core::providers::{default_providers, REGISTRATION_ORDER};
use payflow_core::routing::{RegisteredProvider, Router};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::event_bus::{EventBus, EventType, MetricsSnapshot};
use crate::retry;

/// Inbound request to `PaymentGateway::process_payment`. Mirrors the
/// original's keyword-argument surface for `process_payment`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessPaymentRequest {
    pub amount: f64,
    pub currency: payflow_core::models::Currency,
    pub transaction_type: Option<TransactionType>,
    pub instrument: Option<PaymentInstrument>,
    pub customer: Option<CustomerInfo>,
    pub merchant_id: Option<String>,
    pub order_id: Option<String>,
    /// `spec.md` §4.7's `preferred_provider` keyword argument: pins the
    /// very first attempt's provider if given, validated against the
    /// registered roster up front (`InvalidProviderError` in the
    /// original). Every attempt after the first still falls through to
    /// ordinary strategy-driven selection.
    pub preferred_provider: Option<String>,
}

/// What `process_payment` and `retry_payment` return to the caller,
/// `spec.md` §6/§7's `{success, transaction, error}` envelope verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub success: bool,
    pub transaction: Transaction,
    pub error: Option<String>,
}

/// `get_provider_health`'s per-provider view, folding the breaker's
/// observable state into `payflow_core::models::ProviderHealth`.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealthView {
    #[serde(flatten)]
    pub health: ProviderHealth,
}

/// Result of `simulate_scenario`.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub message: String,
}

struct ProviderSlot {
    provider: Arc<dyn Provider>,
    breaker: CircuitBreaker,
}

/// The facade. Owns the provider roster, one breaker per provider, the
/// live transaction registry, and the event bus. `strategy` is the only
/// piece of mutable configuration exposed post-construction
/// (`set_routing_strategy`, `SPEC_FULL.md` §4.7).
pub struct PaymentGateway {
    providers: HashMap<String, ProviderSlot>,
    router: Router,
    transactions: DashMap<Uuid, Transaction>,
    strategy: std::sync::RwLock<RoutingStrategy>,
    config: GatewayConfig,
    bus: EventBus,
}

impl PaymentGateway {
    /// Builds the gateway with the fixed four-provider roster
    /// (`SPEC_FULL.md` §4.1), one breaker per provider configured from
    /// `config.circuit_breaker`, and an `EventBus` rooted at
    /// `config.logging.log_directory`.
    pub fn new(config: GatewayConfig) -> std::io::Result<Self> {
        let breaker_config: CircuitBreakerConfig = (&config.circuit_breaker).into();
        let mut providers = HashMap::new();
        for (name, provider) in default_providers() {
            providers.insert(
                name.to_string(),
                ProviderSlot {
                    provider,
                    breaker: CircuitBreaker::new(name, breaker_config.clone()),
                },
            );
        }

        let bus = EventBus::new(&config.logging.log_directory)?;
        let strategy = config.routing.strategy;

        Ok(Self {
            providers,
            router: Router::new(),
            transactions: DashMap::new(),
            strategy: std::sync::RwLock::new(strategy),
            config,
            bus,
        })
    }

    fn registry(&self) -> Vec<RegisteredProvider<'_>> {
        REGISTRATION_ORDER
            .iter()
            .filter_map(|name| {
                self.providers.get(*name).map(|slot| RegisteredProvider {
                    name,
                    provider: slot.provider.as_ref(),
                    breaker: &slot.breaker,
                })
            })
            .collect()
    }

    fn strategy(&self) -> RoutingStrategy {
        *self.strategy.read().expect("strategy lock poisoned")
    }

    /// `SPEC_FULL.md` §4.7: admits a new transaction and runs the full
    /// retry loop to completion (success or terminal failure).
    ///
    /// A `preferred_provider` named in `request` that isn't on the
    /// registered roster is rejected up front, before any transaction is
    /// created or logged: matching the original's `InvalidProviderError`
    /// being raised ahead of `_attempt_payment` rather than surfacing as a
    /// failed attempt.
    pub async fn process_payment(&self, request: ProcessPaymentRequest) -> Result<PaymentResponse, GatewayError> {
        if let Some(name) = &request.preferred_provider {
            if !self.providers.contains_key(name) {
                return Err(GatewayError::InvalidProvider { name: name.clone() });
            }
        }

        let mut tx = Transaction::new(
            request.amount,
            request.currency,
            request.transaction_type.unwrap_or_default(),
            request.instrument,
            request.customer,
            request.merchant_id,
            request.order_id,
        );

        self.bus.emit_payment_event(EventType::PaymentInitiated, &tx, "payment initiated".to_string());

        let registry = self.registry();
        let outcome = retry::run(
            &mut tx,
            self.strategy(),
            &registry,
            &self.router,
            &self.config.retry,
            &self.bus,
            request.preferred_provider.as_deref(),
            HashSet::new(),
        )
        .await;

        let response = PaymentResponse { success: outcome.succeeded, transaction: tx.clone(), error: outcome.error };
        self.transactions.insert(tx.id, tx);
        Ok(response)
    }

    pub fn get_transaction_status(&self, id: Uuid) -> Result<Transaction, GatewayError> {
        self.transactions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(GatewayError::TransactionNotFound { id })
    }

    /// `SPEC_FULL.md` §9 bug fix: re-selection is given the transaction
    /// (its `route_history`, amount, instrument) rather than calling the
    /// router blind, so the already-attempted providers and the
    /// transaction's own eligibility constraints are honored from the
    /// very first provider pick of the retry.
    ///
    /// The retry's first selection also excludes `tx.provider`, the
    /// provider the prior run just exhausted, so the last `Route` of that
    /// run and the first `Route` of this one can never name the same
    /// provider (`SPEC_FULL.md` §4.5: "not reusing the last one";
    /// invariant 5 holds across the retry boundary, not just within one
    /// attempt loop).
    ///
    /// `SPEC_FULL.md` §8 invariant 8: retrying an already-successful
    /// transaction is a no-op.
    pub async fn retry_payment(&self, id: Uuid) -> Result<PaymentResponse, GatewayError> {
        let mut tx = self
            .transactions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(GatewayError::TransactionNotFound { id })?;

        if tx.is_terminal_success() {
            return Err(GatewayError::AlreadySuccessful { id });
        }

        let registry = self.registry();
        let initial_exclude = HashSet::from([tx.provider.clone()]);
        let outcome = retry::run(
            &mut tx,
            self.strategy(),
            &registry,
            &self.router,
            &self.config.retry,
            &self.bus,
            None,
            initial_exclude,
        )
        .await;

        let response = PaymentResponse { success: outcome.succeeded, transaction: tx.clone(), error: outcome.error };
        self.transactions.insert(tx.id, tx);
        Ok(response)
    }

    pub fn get_provider_health(&self) -> HashMap<String, ProviderHealthView> {
        self.providers
            .iter()
            .map(|(name, slot)| (name.clone(), ProviderHealthView { health: slot.provider.health() }))
            .collect()
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.bus.metrics()
    }

    pub fn configure_provider(&self, name: &str, options: ProviderOptions) -> Result<(), GatewayError> {
        let slot = self
            .providers
            .get(name)
            .ok_or_else(|| GatewayError::InvalidProvider { name: name.to_string() })?;
        slot.provider.configure(options);
        Ok(())
    }

    pub fn set_routing_strategy(&self, strategy: RoutingStrategy) {
        *self.strategy.write().expect("strategy lock poisoned") = strategy;
    }

    /// `SPEC_FULL.md` §4.7 / `examples/original_source`'s
    /// `simulate_scenario` dispatch table. Unknown scenario names are
    /// reported in the result rather than treated as an error, matching
    /// the original's "Unknown scenario: {name}" string return.
    pub async fn simulate_scenario(&self, scenario: &str) -> ScenarioResult {
        let message = match scenario {
            "stripe_maintenance" => {
                self.configure_provider("stripe", ProviderOptions { is_maintenance: Some(true), ..Default::default() })
                    .ok();
                "stripe placed into maintenance mode".to_string()
            }
            "adyen_high_latency" => {
                self.configure_provider(
                    "adyen",
                    ProviderOptions { avg_latency_ms: Some(2000.0), ..Default::default() },
                )
                .ok();
                "adyen latency increased to 2000ms".to_string()
            }
            "paypal_low_success" => {
                self.configure_provider("paypal", ProviderOptions { success_rate: Some(0.1), ..Default::default() })
                    .ok();
                "paypal success rate dropped to 0.1".to_string()
            }
            "razorpay_rate_limit" => {
                self.configure_provider(
                    "razorpay",
                    ProviderOptions { rate_limit_threshold: Some(1), ..Default::default() },
                )
                .ok();
                "razorpay rate limit threshold lowered to 1".to_string()
            }
            "mass_failure" => {
                for name in REGISTRATION_ORDER {
                    self.configure_provider(name, ProviderOptions { success_rate: Some(0.05), ..Default::default() })
                        .ok();
                }
                "all providers degraded to 0.05 success rate".to_string()
            }
            "circuit_breaker_test" => {
                if let Some(slot) = self.providers.get("stripe") {
                    slot.breaker.force_open().await;
                }
                "stripe circuit breaker forced open".to_string()
            }
            "reset_all" => {
                for (name, slot) in &self.providers {
                    if let Some((success_rate, avg_latency_ms)) = baseline(name) {
                        slot.provider.configure(ProviderOptions {
                            success_rate: Some(success_rate),
                            avg_latency_ms: Some(avg_latency_ms),
                            is_maintenance: Some(false),
                            rate_limit_threshold: Some(100),
                        });
                    }
                    slot.breaker.force_close().await;
                }
                "all providers restored to baseline and breakers force-closed".to_string()
            }
            other => format!("Unknown scenario: {other}"),
        };

        self.bus.emit_system_health(HashMap::from([
            ("scenario".to_string(), Value::String(scenario.to_string())),
            ("applied_at".to_string(), Value::String(now_rfc3339())),
        ]));

        ScenarioResult { scenario: scenario.to_string(), message }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// `(success_rate, avg_latency_ms)` baselines, `SPEC_FULL.md` §4.1. Kept
/// here rather than on `SimulatedProvider` since "restore to baseline"
/// is a scenario-injector concern, not something the provider itself
/// needs to remember about its own construction.
fn baseline(name: &str) -> Option<(f64, f64)> {
    match name {
        "stripe" => Some((0.85, 200.0)),
        "adyen" => Some((0.90, 150.0)),
        "paypal" => Some((0.80, 300.0)),
        "razorpay" => Some((0.88, 180.0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &std::path::Path) -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.logging.log_directory = dir.to_string_lossy().to_string();
        config
    }

    #[tokio::test]
    async fn process_payment_returns_a_terminal_status() {
        let dir = tempfile::TempDir::new().unwrap();
        let gateway = PaymentGateway::new(test_config(dir.path())).unwrap();
        let response = gateway
            .process_payment(ProcessPaymentRequest {
                amount: 100.0,
                currency: payflow_core::models::Currency::Usd,
                transaction_type: None,
                instrument: None,
                customer: None,
                merchant_id: None,
                order_id: None,
                preferred_provider: None,
            })
            .await
            .unwrap();
        assert!(matches!(
            response.transaction.status,
            payflow_core::models::PaymentStatus::Success | payflow_core::models::PaymentStatus::Failed
        ));
        assert_eq!(response.success, response.transaction.status == payflow_core::models::PaymentStatus::Success);
    }

    #[tokio::test]
    async fn process_payment_rejects_an_unregistered_preferred_provider() {
        let dir = tempfile::TempDir::new().unwrap();
        let gateway = PaymentGateway::new(test_config(dir.path())).unwrap();
        let result = gateway
            .process_payment(ProcessPaymentRequest {
                amount: 100.0,
                currency: payflow_core::models::Currency::Usd,
                transaction_type: None,
                instrument: None,
                customer: None,
                merchant_id: None,
                order_id: None,
                preferred_provider: Some("not-a-provider".to_string()),
            })
            .await;
        assert!(matches!(result, Err(GatewayError::InvalidProvider { .. })));
    }

    #[tokio::test]
    async fn process_payment_honors_a_valid_preferred_provider() {
        let dir = tempfile::TempDir::new().unwrap();
        let gateway = PaymentGateway::new(test_config(dir.path())).unwrap();
        gateway
            .configure_provider("razorpay", ProviderOptions { success_rate: Some(1.0), ..Default::default() })
            .unwrap();
        let response = gateway
            .process_payment(ProcessPaymentRequest {
                amount: 100.0,
                currency: payflow_core::models::Currency::Usd,
                transaction_type: None,
                instrument: None,
                customer: None,
                merchant_id: None,
                order_id: None,
                preferred_provider: Some("razorpay".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(response.transaction.route_history[0].provider, "razorpay");
    }

    #[tokio::test]
    async fn unknown_provider_configuration_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let gateway = PaymentGateway::new(test_config(dir.path())).unwrap();
        let result = gateway.configure_provider("not-a-provider", ProviderOptions::default());
        assert!(matches!(result, Err(GatewayError::InvalidProvider { .. })));
    }

    #[tokio::test]
    async fn unknown_scenario_name_is_reported_in_message() {
        let dir = tempfile::TempDir::new().unwrap();
        let gateway = PaymentGateway::new(test_config(dir.path())).unwrap();
        let result = gateway.simulate_scenario("not_a_real_scenario").await;
        assert!(result.message.starts_with("Unknown scenario"));
    }

    #[tokio::test]
    async fn transaction_status_lookup_fails_for_unknown_id() {
        let dir = tempfile::TempDir::new().unwrap();
        let gateway = PaymentGateway::new(test_config(dir.path())).unwrap();
        let result = gateway.get_transaction_status(Uuid::new_v4());
        assert!(matches!(result, Err(GatewayError::TransactionNotFound { .. })));
    }
}
