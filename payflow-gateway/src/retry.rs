//! The retry orchestrator (C5, `SPEC_FULL.md` §4.5).
//!
//! Implemented as a free function operating over the facade's shared
//! state, matching `examples/original_source/gateway/payment_gateway.py`'s
//! `_attempt_payment` being the single call site for both
//! `process_payment` and `retry_payment`. Both bug fixes `SPEC_FULL.md`
//! §9 calls for are realized here: the `retry_on_errors` allowlist is
//! actually consulted before giving up, and the caller always passes the
//! transaction into provider re-selection (the original's `retry_payment`
//! called `_select_optimal_provider()` with no transaction at all).

use std::collections::HashSet;

use chrono::Utc;
use tokio::time::Duration;

use payflow_core::circuit_breaker::{CircuitBreaker, CircuitCallError};
use payflow_core::models::{PaymentStatus, Route, RouteStatus, RoutingStrategy, Transaction};
use payflow_core::provider::Provider;
use payflow_core::routing::{RegisteredProvider, Router};

use crate::config::RetrySection;
use crate::event_bus::{EventBus, EventType};

/// `spec.md` §7's literal final-failure string, used verbatim whether the
/// loop stopped on a terminal error or on exhausting `max_attempts`, the
/// original never distinguishes the two in its response payload either.
const FINAL_FAILURE_MESSAGE: &str = "Payment failed after all retry attempts";

/// Outcome of one `run` invocation, folded into `PaymentResponse` by the
/// facade.
pub struct RunOutcome {
    pub succeeded: bool,
    /// `Some("Payment failed after all retry attempts")` on any terminal
    /// failure, `None` on success, `SPEC_FULL.md` §6/§7's response
    /// envelope error string, verbatim.
    pub error: Option<String>,
}

/// Runs the attempt loop against `tx` until it succeeds, exhausts
/// `retry.max_attempts`, or hits a non-retryable error. Mutates `tx` in
/// place, appending one `Route` per attempt.
///
/// `initial_provider` is the caller's `preferred_provider`
/// (`SPEC_FULL.md` §4.7): honored for the attempt's very first selection
/// only, the original's `process_payment` pins `transaction.provider`
/// once up front and lets every subsequent attempt fall through to the
/// ordinary strategy-driven `_switch_provider`, it never pins the
/// preference across retries.
///
/// `initial_exclude` seeds the exclusion set the very first selection of
/// this call sees. `process_payment` passes an empty set; `retry_payment`
/// passes `{tx.provider}` so the retry's first pick can't land back on
/// the provider the prior run just exhausted (`SPEC_FULL.md` §4.5: "not
/// reusing the last one"; invariant 5 must hold across the retry
/// boundary too, not just within one `run` call).
pub async fn run(
    tx: &mut Transaction,
    strategy: RoutingStrategy,
    registry: &[RegisteredProvider<'_>],
    router: &Router,
    retry: &RetrySection,
    bus: &EventBus,
    initial_provider: Option<&str>,
    initial_exclude: HashSet<String>,
) -> RunOutcome {
    let mut exclude: HashSet<String> = initial_exclude;
    tx.status = PaymentStatus::Pending;

    for local_attempt in 0..retry.max_attempts {
        let (selected, decision) = match (local_attempt, initial_provider) {
            (0, Some(name)) => (name.to_string(), preferred_decision(name, strategy)),
            _ => router.select(strategy, tx, registry, &exclude).await,
        };
        let attempt_number = tx.attempts + 1;

        let Some(entry) = registry.iter().find(|e| e.name == selected) else {
            // The router always names something in `registry`; this is
            // unreachable in practice but keeps the loop total rather
            // than panicking on a malformed registry.
            break;
        };

        if local_attempt > 0 {
            bus.emit_payment_event(EventType::PaymentRetry, tx, format!("retrying via {selected}"));
        }
        tx.provider = selected.clone();

        let breaker_state_before = entry.breaker.state().await;
        let outcome = attempt_once(entry.provider, entry.breaker, tx).await;
        let breaker_state_after = entry.breaker.state().await;
        if breaker_state_after != breaker_state_before {
            bus.emit_circuit_breaker_event(
                &selected,
                &format!("{breaker_state_before:?} -> {breaker_state_after:?}"),
                entry.breaker.failure_count().await,
            );
        }

        let route = build_route(attempt_number, &selected, decision, &outcome, retry);
        bus.emit_routing_decision(tx, &route);
        bus.emit_performance_metrics(&selected, performance_context(entry.provider, &route));

        match outcome {
            Ok(process_outcome) => {
                tx.metadata.insert(
                    "processing_fee".to_string(),
                    serde_json::json!(process_outcome.processing_fee),
                );
                tx.push_route(route);
                tx.status = PaymentStatus::Success;
                bus.emit_payment_event(EventType::PaymentSuccess, tx, format!("settled via {selected}"));
                return RunOutcome { succeeded: true, error: None };
            }
            Err(_) => {
                let retryable = route.retry_eligible;
                tx.push_route(route.clone());
                bus.emit_failure(tx, &route);

                if !retryable {
                    tx.status = PaymentStatus::Failed;
                    bus.emit_payment_event(
                        EventType::PaymentFinalFailure,
                        tx,
                        format!("non-retryable failure on {selected}"),
                    );
                    return RunOutcome { succeeded: false, error: Some(FINAL_FAILURE_MESSAGE.to_string()) };
                }

                if local_attempt + 1 >= retry.max_attempts {
                    tx.status = PaymentStatus::Failed;
                    bus.emit_payment_event(
                        EventType::PaymentFinalFailure,
                        tx,
                        format!("exhausted {} attempts", retry.max_attempts),
                    );
                    return RunOutcome { succeeded: false, error: Some(FINAL_FAILURE_MESSAGE.to_string()) };
                }

                // `_switch_provider` in the original excludes only the
                // provider that just failed, not the full history: a
                // provider that failed two attempts ago remains eligible.
                exclude.clear();
                exclude.insert(selected);
                tx.status = PaymentStatus::Retrying;

                let delay = backoff_delay(retry, local_attempt);
                tokio::time::sleep(delay).await;
            }
        }
    }

    tx.status = PaymentStatus::Failed;
    RunOutcome { succeeded: false, error: Some(FINAL_FAILURE_MESSAGE.to_string()) }
}

/// Builds the `RoutingDecision` audit record for a first-attempt pick that
/// bypassed `Router::select` entirely because the caller named a
/// `preferred_provider`.
fn preferred_decision(name: &str, strategy: RoutingStrategy) -> payflow_core::models::RoutingDecision {
    let mut decision_factors = std::collections::HashMap::new();
    decision_factors.insert("preferred_provider".to_string(), serde_json::json!(true));
    payflow_core::models::RoutingDecision {
        selected_provider: name.to_string(),
        strategy_used: strategy,
        decision_factors,
        alternative_providers: Vec::new(),
        confidence_score: 1.0,
        timestamp: Utc::now(),
    }
}

async fn attempt_once(
    provider: &dyn Provider,
    breaker: &CircuitBreaker,
    tx: &Transaction,
) -> Result<payflow_core::provider::ProcessOutcome, AttemptError> {
    match breaker.call(|| provider.process(tx)).await {
        Ok(outcome) => Ok(outcome),
        Err(CircuitCallError::Open(err)) => Err(AttemptError::CircuitOpen(err.provider)),
        Err(CircuitCallError::Inner(err)) => Err(AttemptError::Provider(err)),
    }
}

enum AttemptError {
    CircuitOpen(String),
    Provider(payflow_core::error::ProviderError),
}

fn build_route(
    attempt_number: u32,
    provider: &str,
    decision: payflow_core::models::RoutingDecision,
    outcome: &Result<payflow_core::provider::ProcessOutcome, AttemptError>,
    retry: &RetrySection,
) -> Route {
    let timestamp = Utc::now();
    match outcome {
        Ok(process_outcome) => Route {
            provider: provider.to_string(),
            attempt_number,
            status: RouteStatus::Success,
            timestamp,
            reason: None,
            processing_time: Some(process_outcome.processing_time),
            provider_response_code: Some(process_outcome.provider_response_code.clone()),
            network_response_code: Some(process_outcome.network_response_code.clone()),
            network_latency: Some(process_outcome.processing_time),
            retry_eligible: false,
            decision,
        },
        Err(AttemptError::CircuitOpen(_)) => Route {
            provider: provider.to_string(),
            attempt_number,
            status: RouteStatus::Error,
            timestamp,
            reason: None,
            processing_time: None,
            provider_response_code: Some("CIRCUIT_OPEN".to_string()),
            network_response_code: None,
            network_latency: None,
            retry_eligible: true,
            decision,
        },
        Err(AttemptError::Provider(err)) => {
            let retry_eligible = retry.retry_on_errors.contains(&err.kind);
            Route {
                provider: provider.to_string(),
                attempt_number,
                status: RouteStatus::Failed,
                timestamp,
                reason: Some(err.kind),
                processing_time: None,
                provider_response_code: Some(format!("{:?}", err.kind)),
                network_response_code: None,
                network_latency: None,
                retry_eligible,
                decision,
            }
        }
    }
}

/// `SPEC_FULL.md` §4.6 `performance_metrics` event context: the provider's
/// own rolling view alongside this attempt's observed latency, so the
/// JSONL stream carries both the point observation and the trend it
/// moved.
fn performance_context(provider: &dyn Provider, route: &Route) -> std::collections::HashMap<String, serde_json::Value> {
    let health = provider.health();
    let mut metrics = std::collections::HashMap::new();
    metrics.insert("attempt_processing_time".to_string(), serde_json::json!(route.processing_time));
    metrics.insert("avg_latency_ms".to_string(), serde_json::json!(health.avg_latency_ms));
    metrics.insert("success_rate".to_string(), serde_json::json!(health.success_rate));
    metrics.insert("current_load".to_string(), serde_json::json!(health.current_load));
    metrics
}

fn backoff_delay(retry: &RetrySection, local_attempt: u32) -> Duration {
    let secs = retry.initial_delay_secs * retry.backoff_multiplier.powi(local_attempt as i32);
    Duration::from_secs_f64(secs.min(retry.max_delay_secs).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use payflow_core::circuit_breaker::CircuitBreakerConfig;
    use payflow_core::models::{Currency, TransactionType};
    use payflow_core::providers::default_providers;
    use std::collections::HashMap as StdHashMap;
    use tempfile::TempDir;

    fn fast_retry() -> RetrySection {
        RetrySection {
            max_attempts: 3,
            initial_delay_secs: 0.0,
            backoff_multiplier: 1.0,
            max_delay_secs: 0.0,
            retry_on_errors: payflow_core::models::ErrorKind::default_retryable().to_vec(),
        }
    }

    fn tx(amount: f64) -> Transaction {
        Transaction::new(amount, Currency::Usd, TransactionType::Payment, None, None, None, None)
    }

    #[tokio::test]
    async fn successful_attempt_marks_transaction_success() {
        let providers = default_providers();
        for (name, provider) in &providers {
            provider.configure(payflow_core::provider::ProviderOptions {
                success_rate: Some(1.0),
                ..Default::default()
            });
            let _ = name;
        }
        let mut breakers = StdHashMap::new();
        for (name, _) in &providers {
            breakers.insert(name.to_string(), CircuitBreaker::new(*name, CircuitBreakerConfig::default()));
        }
        let registry: Vec<RegisteredProvider> = providers
            .iter()
            .map(|(n, p)| RegisteredProvider {
                name: n,
                provider: p.as_ref(),
                breaker: &breakers[*n],
            })
            .collect();

        let dir = TempDir::new().unwrap();
        let bus = EventBus::new(dir.path()).unwrap();
        let router = Router::new();
        let retry = fast_retry();
        let mut transaction = tx(100.0);

        let result =
            run(&mut transaction, RoutingStrategy::HealthBased, &registry, &router, &retry, &bus, None, HashSet::new())
                .await;
        assert!(result.succeeded);
        assert!(result.error.is_none());
        assert_eq!(transaction.status, PaymentStatus::Success);
        assert_eq!(transaction.route_history.len(), 1);
    }

    #[tokio::test]
    async fn preferred_provider_is_honored_on_the_first_attempt_only() {
        let a = ScriptedProvider::new("provider_a", payflow_core::models::ErrorKind::Timeout);
        let b = ScriptedProvider::new("provider_b", payflow_core::models::ErrorKind::Timeout);
        let providers: Vec<(&str, std::sync::Arc<dyn Provider>)> =
            vec![("provider_a", std::sync::Arc::new(a)), ("provider_b", std::sync::Arc::new(b))];

        let breaker_a = CircuitBreaker::new("provider_a", CircuitBreakerConfig::default());
        let breaker_b = CircuitBreaker::new("provider_b", CircuitBreakerConfig::default());
        let registry = vec![
            RegisteredProvider { name: "provider_a", provider: providers[0].1.as_ref(), breaker: &breaker_a },
            RegisteredProvider { name: "provider_b", provider: providers[1].1.as_ref(), breaker: &breaker_b },
        ];

        let dir = TempDir::new().unwrap();
        let bus = EventBus::new(dir.path()).unwrap();
        let router = Router::new();
        let retry = fast_retry();
        let mut transaction = tx(100.0);

        // With no preference, failover's unhealthy-tiebreak sorts eligible
        // providers alphabetically and would pick "provider_a" first.
        // Pinning "provider_b" as the preferred provider must override that
        // for attempt one, then fall through to ordinary strategy-driven
        // selection (which excludes the just-failed "provider_b") for the
        // retry.
        let result = run(
            &mut transaction,
            RoutingStrategy::Failover,
            &registry,
            &router,
            &retry,
            &bus,
            Some("provider_b"),
            HashSet::new(),
        )
        .await;

        assert!(result.succeeded);
        assert_eq!(transaction.route_history[0].provider, "provider_b");
        assert!(transaction.route_history[0].decision.decision_factors.get("preferred_provider").is_some());
        assert_eq!(transaction.route_history[1].provider, "provider_a");
    }

    /// A fixed-script provider: fails its first call with a named
    /// `ErrorKind`, succeeds every call after. Used to reproduce the
    /// walkthrough in `examples/original_source/src/payment_gateway/gateway/payment_gateway.py`'s
    /// failover example exactly, since `SimulatedProvider`'s stochastic
    /// outcome draw can't be pinned to "fails once, then succeeds".
    struct ScriptedProvider {
        name: &'static str,
        calls: std::sync::atomic::AtomicU32,
        first_call_error: payflow_core::models::ErrorKind,
    }

    impl ScriptedProvider {
        fn new(name: &'static str, first_call_error: payflow_core::models::ErrorKind) -> Self {
            Self {
                name,
                calls: std::sync::atomic::AtomicU32::new(0),
                first_call_error,
            }
        }
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn capabilities(&self) -> payflow_core::models::ProviderCapability {
            payflow_core::models::ProviderCapability {
                supported_networks: vec![payflow_core::models::CardNetwork::Visa],
                supported_methods: vec![payflow_core::models::PaymentMethod::Card],
                supported_currencies: vec![Currency::Usd],
                supported_regions: vec![payflow_core::models::Region::NorthAmerica],
                min_amount: 1.0,
                max_amount: 1_000_000.0,
                processing_fee_percent: 2.0,
            }
        }

        fn can_process(&self, _tx: &Transaction) -> bool {
            true
        }

        async fn process(
            &self,
            _tx: &Transaction,
        ) -> Result<payflow_core::provider::ProcessOutcome, payflow_core::error::ProviderError> {
            let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if call == 0 {
                Err(payflow_core::error::ProviderError::new(self.name, self.first_call_error, "scripted failure"))
            } else {
                Ok(payflow_core::provider::ProcessOutcome {
                    processing_time: 0.01,
                    provider_response_code: "SUCCESS".to_string(),
                    network_response_code: "00".to_string(),
                    processing_fee: 1.0,
                })
            }
        }

        fn health(&self) -> payflow_core::models::ProviderHealth {
            payflow_core::models::ProviderHealth {
                provider: self.name.to_string(),
                success_rate: 1.0,
                avg_latency_ms: 10.0,
                current_load: 0,
                is_healthy: true,
                last_checked: Utc::now(),
                circuit_breaker_open: false,
                last_circuit_failure: None,
                success_rate_by_network: StdHashMap::new(),
                success_rate_by_method: StdHashMap::new(),
                success_rate_by_region: StdHashMap::new(),
            }
        }

        fn configure(&self, _options: payflow_core::provider::ProviderOptions) {}

        fn specific_errors(&self) -> Vec<payflow_core::models::ErrorKind> {
            vec![self.first_call_error]
        }

        fn network_preference_score(&self, _network: payflow_core::models::CardNetwork) -> f64 {
            1.0
        }

        fn in_maintenance(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn failover_after_one_forced_failure_moves_to_the_next_provider() {
        let a = ScriptedProvider::new("provider_a", payflow_core::models::ErrorKind::Timeout);
        let b = ScriptedProvider::new("provider_b", payflow_core::models::ErrorKind::Timeout);
        let providers: Vec<(&str, std::sync::Arc<dyn Provider>)> =
            vec![("provider_a", std::sync::Arc::new(a)), ("provider_b", std::sync::Arc::new(b))];

        let breaker_a = CircuitBreaker::new("provider_a", CircuitBreakerConfig::default());
        let breaker_b = CircuitBreaker::new("provider_b", CircuitBreakerConfig::default());
        let registry = vec![
            RegisteredProvider { name: "provider_a", provider: providers[0].1.as_ref(), breaker: &breaker_a },
            RegisteredProvider { name: "provider_b", provider: providers[1].1.as_ref(), breaker: &breaker_b },
        ];

        let dir = TempDir::new().unwrap();
        let bus = EventBus::new(dir.path()).unwrap();
        let router = Router::new();
        let retry = fast_retry();
        let mut transaction = tx(100.0);

        let result =
            run(&mut transaction, RoutingStrategy::Failover, &registry, &router, &retry, &bus, None, HashSet::new())
                .await;

        assert!(result.succeeded);
        assert_eq!(transaction.attempts, 2);
        assert_eq!(transaction.route_history.len(), 2);
        assert_eq!(transaction.route_history[0].provider, "provider_a");
        assert_eq!(transaction.route_history[0].status, RouteStatus::Failed);
        assert_eq!(transaction.route_history[0].reason, Some(payflow_core::models::ErrorKind::Timeout));
        assert_eq!(transaction.route_history[1].provider, "provider_b");
        assert_eq!(transaction.route_history[1].status, RouteStatus::Success);
        assert_eq!(breaker_a.failure_count().await, 1);
        assert_eq!(breaker_a.state().await, payflow_core::circuit_breaker::CircuitState::Closed);
    }

    #[tokio::test]
    async fn exhausting_retries_marks_transaction_failed() {
        let providers = default_providers();
        for (_, provider) in &providers {
            provider.configure(payflow_core::provider::ProviderOptions {
                success_rate: Some(0.0),
                ..Default::default()
            });
        }
        let mut breakers = StdHashMap::new();
        for (name, _) in &providers {
            breakers.insert(name.to_string(), CircuitBreaker::new(*name, CircuitBreakerConfig::default()));
        }
        let registry: Vec<RegisteredProvider> = providers
            .iter()
            .map(|(n, p)| RegisteredProvider {
                name: n,
                provider: p.as_ref(),
                breaker: &breakers[*n],
            })
            .collect();

        let dir = TempDir::new().unwrap();
        let bus = EventBus::new(dir.path()).unwrap();
        let router = Router::new();
        let mut retry = fast_retry();
        retry.retry_on_errors = payflow_core::models::ErrorKind::default_retryable().to_vec();
        let mut transaction = tx(100.0);

        let result =
            run(&mut transaction, RoutingStrategy::HealthBased, &registry, &router, &retry, &bus, None, HashSet::new())
                .await;
        assert!(!result.succeeded);
        assert_eq!(result.error.as_deref(), Some(FINAL_FAILURE_MESSAGE));
        assert_eq!(transaction.status, PaymentStatus::Failed);
        assert!(transaction.route_history.len() <= retry.max_attempts as usize);
    }

    /// A provider that fails every call with a retryable error, used to
    /// drive a `run` to exhaustion deterministically (unlike
    /// `SimulatedProvider`, whose failure draw is stochastic).
    struct AlwaysFailsProvider {
        name: &'static str,
    }

    #[async_trait::async_trait]
    impl Provider for AlwaysFailsProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn capabilities(&self) -> payflow_core::models::ProviderCapability {
            payflow_core::models::ProviderCapability {
                supported_networks: vec![payflow_core::models::CardNetwork::Visa],
                supported_methods: vec![payflow_core::models::PaymentMethod::Card],
                supported_currencies: vec![Currency::Usd],
                supported_regions: vec![payflow_core::models::Region::NorthAmerica],
                min_amount: 1.0,
                max_amount: 1_000_000.0,
                processing_fee_percent: 2.0,
            }
        }

        fn can_process(&self, _tx: &Transaction) -> bool {
            true
        }

        async fn process(
            &self,
            _tx: &Transaction,
        ) -> Result<payflow_core::provider::ProcessOutcome, payflow_core::error::ProviderError> {
            Err(payflow_core::error::ProviderError::new(
                self.name,
                payflow_core::models::ErrorKind::Timeout,
                "scripted failure",
            ))
        }

        fn health(&self) -> payflow_core::models::ProviderHealth {
            payflow_core::models::ProviderHealth {
                provider: self.name.to_string(),
                success_rate: 1.0,
                avg_latency_ms: 10.0,
                current_load: 0,
                is_healthy: true,
                last_checked: Utc::now(),
                circuit_breaker_open: false,
                last_circuit_failure: None,
                success_rate_by_network: StdHashMap::new(),
                success_rate_by_method: StdHashMap::new(),
                success_rate_by_region: StdHashMap::new(),
            }
        }

        fn configure(&self, _options: payflow_core::provider::ProviderOptions) {}

        fn specific_errors(&self) -> Vec<payflow_core::models::ErrorKind> {
            vec![payflow_core::models::ErrorKind::Timeout]
        }

        fn network_preference_score(&self, _network: payflow_core::models::CardNetwork) -> f64 {
            1.0
        }

        fn in_maintenance(&self) -> bool {
            false
        }
    }

    /// With identical static health on both providers, `HealthBased`'s
    /// scoring ties and the tie-break always prefers "provider_a"
    /// alphabetically whenever both are eligible. A three-attempt run
    /// against two always-failing providers therefore ends on
    /// "provider_a" (a, b, a). A bare retry of that run, with no
    /// knowledge of what the previous run just exhausted, would pick
    /// "provider_a" again for its very first attempt: the same provider
    /// used last, back to back across the retry boundary. Seeding
    /// `initial_exclude` with that last-used provider is what stops it.
    #[tokio::test]
    async fn retry_run_does_not_reselect_the_provider_the_previous_run_ended_on() {
        let a = AlwaysFailsProvider { name: "provider_a" };
        let b = AlwaysFailsProvider { name: "provider_b" };
        let breaker_a = CircuitBreaker::new("provider_a", CircuitBreakerConfig::default());
        let breaker_b = CircuitBreaker::new("provider_b", CircuitBreakerConfig::default());
        let registry = vec![
            RegisteredProvider { name: "provider_a", provider: &a, breaker: &breaker_a },
            RegisteredProvider { name: "provider_b", provider: &b, breaker: &breaker_b },
        ];

        let dir = TempDir::new().unwrap();
        let bus = EventBus::new(dir.path()).unwrap();
        let router = Router::new();
        let mut retry = fast_retry();
        retry.max_attempts = 3;
        let mut transaction = tx(100.0);

        let first_run = run(
            &mut transaction,
            RoutingStrategy::HealthBased,
            &registry,
            &router,
            &retry,
            &bus,
            None,
            HashSet::new(),
        )
        .await;
        assert!(!first_run.succeeded);
        assert_eq!(transaction.route_history.len(), 3);
        assert_eq!(transaction.route_history[0].provider, "provider_a");
        assert_eq!(transaction.route_history[1].provider, "provider_b");
        let last_used = transaction.route_history[2].provider.clone();
        assert_eq!(last_used, "provider_a");
        assert_eq!(transaction.provider, last_used);

        let initial_exclude = HashSet::from([last_used.clone()]);
        run(&mut transaction, RoutingStrategy::HealthBased, &registry, &router, &retry, &bus, None, initial_exclude)
            .await;

        let retry_first_pick = &transaction.route_history[3].provider;
        assert_ne!(
            retry_first_pick, &last_used,
            "the retry's first attempt must not reselect the provider the prior run ended on"
        );
        assert_eq!(retry_first_pick, "provider_b");
    }
}
