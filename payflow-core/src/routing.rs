//! The router (C4, `SPEC_FULL.md` §4.4): picks a provider for one
//! attempt according to the active `RoutingStrategy`.
//!
//! Structurally grounded on the teacher's `Router`/`ProviderSelection`
//! shape in `routing.rs`; the strategy set itself is replaced wholesale
//! with the five payment-routing strategies `spec.md` closes over.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use serde_json::json;

use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::models::{RoutingDecision, RoutingStrategy, Transaction};
use crate::provider::Provider;
use crate::providers::REGISTRATION_ORDER;

/// One entry in the live registry the router chooses among.
pub struct RegisteredProvider<'a> {
    pub name: &'a str,
    pub provider: &'a dyn Provider,
    pub breaker: &'a CircuitBreaker,
}

/// Maintains the process-wide round-robin cursor; otherwise stateless.
/// Every other strategy is a pure function of the registry snapshot
/// passed in.
#[derive(Default)]
pub struct Router {
    round_robin_cursor: AtomicUsize,
}

impl Router {
    pub fn new() -> Self {
        Self {
            round_robin_cursor: AtomicUsize::new(0),
        }
    }

    /// Selects a provider for the next attempt. `exclude` holds provider
    /// names the orchestrator has already used for this transaction and
    /// must not reuse (`SPEC_FULL.md` §8 invariant 5).
    pub async fn select(
        &self,
        strategy: RoutingStrategy,
        tx: &Transaction,
        registry: &[RegisteredProvider<'_>],
        exclude: &HashSet<String>,
    ) -> (String, RoutingDecision) {
        // Base eligibility per the glossary: capability match, breaker
        // not OPEN, not in maintenance, not already used this attempt
        // chain.
        let mut eligible = Vec::new();
        let mut filtered_out = Vec::new();
        for entry in registry {
            if exclude.contains(entry.name) {
                filtered_out.push(json!({ "provider": entry.name, "reason": "already attempted" }));
                continue;
            }
            if !entry.provider.can_process(tx) {
                filtered_out.push(json!({ "provider": entry.name, "reason": "capability mismatch" }));
                continue;
            }
            let breaker_state = entry.breaker.state().await;
            if breaker_state == CircuitState::Open {
                filtered_out.push(json!({ "provider": entry.name, "reason": "circuit open" }));
                continue;
            }
            if entry.provider.in_maintenance() {
                filtered_out.push(json!({ "provider": entry.name, "reason": "maintenance" }));
                continue;
            }
            eligible.push(entry);
        }

        if eligible.is_empty() {
            return self.fallback(tx, registry, exclude, filtered_out).await;
        }

        match strategy {
            RoutingStrategy::HealthBased => self.select_health_based(&eligible, filtered_out),
            RoutingStrategy::RoundRobin => self.select_round_robin(registry, exclude, tx).await,
            RoutingStrategy::Failover => self.select_failover(&eligible, filtered_out),
            RoutingStrategy::CardNetworkOptimized => {
                self.select_card_network_optimized(tx, &eligible, filtered_out)
            }
            RoutingStrategy::CostOptimized => self.select_cost_optimized(tx, &eligible, filtered_out),
        }
    }

    fn select_health_based(
        &self,
        eligible: &[&RegisteredProvider<'_>],
        filtered_out: Vec<serde_json::Value>,
    ) -> (String, RoutingDecision) {
        let mut healthy: Vec<&&RegisteredProvider<'_>> = eligible
            .iter()
            .filter(|e| e.provider.health().is_healthy)
            .collect();
        healthy.sort_by_key(|e| e.name);

        if healthy.is_empty() {
            // No healthy candidate even though some are eligible; the
            // router still owes a decision, fall through to whichever
            // eligible provider sorts first.
            let mut sorted: Vec<&&RegisteredProvider<'_>> = eligible.iter().collect();
            sorted.sort_by_key(|e| e.name);
            let selected = sorted[0];
            return self.build_decision(
                selected.name,
                RoutingStrategy::HealthBased,
                sorted.iter().map(|e| e.name.to_string()).collect(),
                0.0,
                filtered_out,
                HashMap::new(),
                false,
            );
        }

        let mut best: Option<(&str, f64)> = None;
        let mut scores = HashMap::new();
        for entry in &healthy {
            let health = entry.provider.health();
            let score = health.success_rate * 1000.0 / health.avg_latency_ms.max(1.0);
            scores.insert(entry.name.to_string(), json!(score));
            if best.map(|(_, b)| score > b).unwrap_or(true) {
                best = Some((entry.name, score));
            }
        }
        let (selected, best_score) = best.expect("healthy is non-empty");
        let max_score = healthy
            .iter()
            .map(|e| {
                let h = e.provider.health();
                h.success_rate * 1000.0 / h.avg_latency_ms.max(1.0)
            })
            .fold(f64::MIN, f64::max);
        let confidence = if max_score > 0.0 { best_score / max_score } else { 0.0 };

        let mut factors = HashMap::new();
        factors.insert("provider_health".to_string(), json!(scores));

        self.build_decision(
            selected,
            RoutingStrategy::HealthBased,
            healthy.iter().map(|e| e.name.to_string()).collect(),
            confidence,
            filtered_out,
            factors,
            false,
        )
    }

    /// Advances the cursor first, then searches forward for an eligible
    /// provider; a skip does not re-advance the cursor (`SPEC_FULL.md` §10,
    /// resolving the source's ambiguous round-robin ordering).
    async fn select_round_robin(
        &self,
        registry: &[RegisteredProvider<'_>],
        exclude: &HashSet<String>,
        tx: &Transaction,
    ) -> (String, RoutingDecision) {
        let len = registry.len();
        let start = self.round_robin_cursor.fetch_add(1, Ordering::SeqCst) % len;

        let mut filtered_out = Vec::new();
        for offset in 0..len {
            let idx = (start + offset) % len;
            let entry = &registry[idx];
            if exclude.contains(entry.name) {
                continue;
            }
            if !entry.provider.can_process(tx) {
                continue;
            }
            if entry.breaker.state().await == CircuitState::Open {
                continue;
            }
            return self.build_decision(
                entry.name,
                RoutingStrategy::RoundRobin,
                registry.iter().map(|e| e.name.to_string()).collect(),
                0.5,
                filtered_out,
                HashMap::new(),
                false,
            );
        }

        for entry in registry {
            filtered_out.push(json!({ "provider": entry.name, "reason": "round robin pass exhausted" }));
        }
        self.fallback(tx, registry, exclude, filtered_out).await
    }

    fn select_failover(
        &self,
        eligible: &[&RegisteredProvider<'_>],
        filtered_out: Vec<serde_json::Value>,
    ) -> (String, RoutingDecision) {
        let healthy_by_name: HashMap<&str, bool> = eligible
            .iter()
            .map(|e| (e.name, e.provider.health().is_healthy))
            .collect();

        for (position, name) in REGISTRATION_ORDER.iter().enumerate() {
            if healthy_by_name.get(name).copied().unwrap_or(false) {
                let confidence = 1.0 - (position as f64 / REGISTRATION_ORDER.len() as f64);
                return self.build_decision(
                    name,
                    RoutingStrategy::Failover,
                    eligible.iter().map(|e| e.name.to_string()).collect(),
                    confidence,
                    filtered_out,
                    HashMap::new(),
                    false,
                );
            }
        }

        // Every eligible provider is unhealthy; fall through to the
        // first eligible one in preference order regardless of health.
        for name in REGISTRATION_ORDER.iter() {
            if eligible.iter().any(|e| e.name == *name) {
                return self.build_decision(
                    name,
                    RoutingStrategy::Failover,
                    eligible.iter().map(|e| e.name.to_string()).collect(),
                    0.0,
                    filtered_out,
                    HashMap::new(),
                    false,
                );
            }
        }

        let mut sorted: Vec<&&RegisteredProvider<'_>> = eligible.iter().collect();
        sorted.sort_by_key(|e| e.name);
        self.build_decision(
            sorted[0].name,
            RoutingStrategy::Failover,
            sorted.iter().map(|e| e.name.to_string()).collect(),
            0.0,
            filtered_out,
            HashMap::new(),
            false,
        )
    }

    fn select_card_network_optimized(
        &self,
        tx: &Transaction,
        eligible: &[&RegisteredProvider<'_>],
        filtered_out: Vec<serde_json::Value>,
    ) -> (String, RoutingDecision) {
        let Some(network) = tx.card_network() else {
            return self.select_health_based(eligible, filtered_out);
        };

        let mut sorted: Vec<&&RegisteredProvider<'_>> = eligible.iter().collect();
        sorted.sort_by_key(|e| e.name);

        let mut best: Option<(&str, f64)> = None;
        let mut scores = HashMap::new();
        for entry in &sorted {
            let success_rate = entry.provider.health().success_rate;
            let preference = entry.provider.network_preference_score(network);
            let score = success_rate * preference;
            scores.insert(entry.name.to_string(), json!(score));
            if best.map(|(_, b)| score > b).unwrap_or(true) {
                best = Some((entry.name, score));
            }
        }
        let (selected, _) = best.expect("eligible is non-empty");

        let mut factors = HashMap::new();
        factors.insert("network_preference".to_string(), json!(scores));

        self.build_decision(
            selected,
            RoutingStrategy::CardNetworkOptimized,
            sorted.iter().map(|e| e.name.to_string()).collect(),
            1.0,
            filtered_out,
            factors,
            false,
        )
    }

    fn select_cost_optimized(
        &self,
        tx: &Transaction,
        eligible: &[&RegisteredProvider<'_>],
        filtered_out: Vec<serde_json::Value>,
    ) -> (String, RoutingDecision) {
        let mut sorted: Vec<&&RegisteredProvider<'_>> = eligible.iter().collect();
        sorted.sort_by_key(|e| e.name);

        let mut best: Option<(&str, f64)> = None;
        let mut fees = HashMap::new();
        for entry in &sorted {
            let fee = tx.amount * entry.provider.capabilities().processing_fee_percent / 100.0;
            fees.insert(entry.name.to_string(), json!(fee));
            if best.map(|(_, b)| fee < b).unwrap_or(true) {
                best = Some((entry.name, fee));
            }
        }
        let (selected, best_fee) = best.expect("eligible is non-empty");
        let max_fee = fees
            .values()
            .filter_map(|v| v.as_f64())
            .fold(f64::MIN, f64::max);
        let confidence = if max_fee > 0.0 { 1.0 - best_fee / max_fee } else { 1.0 };

        let mut factors = HashMap::new();
        factors.insert("estimated_cost".to_string(), json!(fees));

        self.build_decision(
            selected,
            RoutingStrategy::CostOptimized,
            sorted.iter().map(|e| e.name.to_string()).collect(),
            confidence,
            filtered_out,
            factors,
            false,
        )
    }

    /// `SPEC_FULL.md` §4.4: the router must always return a provider.
    /// Lowest breaker failure_count among those that can_process(tx);
    /// if that set is empty too, the first provider in registry order.
    async fn fallback(
        &self,
        tx: &Transaction,
        registry: &[RegisteredProvider<'_>],
        exclude: &HashSet<String>,
        mut filtered_out: Vec<serde_json::Value>,
    ) -> (String, RoutingDecision) {
        let mut capable: Vec<&RegisteredProvider<'_>> = registry
            .iter()
            .filter(|e| !exclude.contains(e.name) && e.provider.can_process(tx))
            .collect();
        capable.sort_by_key(|e| e.name);

        let selected = if !capable.is_empty() {
            let mut best: Option<(&str, u32)> = None;
            for entry in &capable {
                let failures = entry.breaker.failure_count().await;
                if best.map(|(_, b)| failures < b).unwrap_or(true) {
                    best = Some((entry.name, failures));
                }
            }
            best.expect("capable is non-empty").0.to_string()
        } else {
            filtered_out.push(json!({ "provider": "*", "reason": "no provider can process this transaction" }));
            registry[0].name.to_string()
        };

        self.build_decision(
            &selected,
            RoutingStrategy::HealthBased,
            registry.iter().map(|e| e.name.to_string()).collect(),
            0.0,
            filtered_out,
            HashMap::new(),
            true,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build_decision(
        &self,
        selected: &str,
        strategy_used: RoutingStrategy,
        alternative_providers: Vec<String>,
        confidence_score: f64,
        filtered_out: Vec<serde_json::Value>,
        mut decision_factors: HashMap<String, serde_json::Value>,
        fallback: bool,
    ) -> (String, RoutingDecision) {
        let alternatives: Vec<String> = alternative_providers
            .into_iter()
            .filter(|name| name != selected)
            .collect();

        decision_factors.insert("eligibility_filtered_out".to_string(), json!(filtered_out));
        if fallback {
            decision_factors.insert("fallback".to_string(), json!(true));
        }

        (
            selected.to_string(),
            RoutingDecision {
                selected_provider: selected.to_string(),
                strategy_used,
                decision_factors,
                alternative_providers: alternatives,
                confidence_score: confidence_score.clamp(0.0, 1.0),
                timestamp: Utc::now(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::CircuitBreakerConfig;
    use crate::models::{Currency, TransactionType};
    use crate::providers::default_providers;
    use std::collections::HashSet;

    fn tx(amount: f64) -> Transaction {
        Transaction::new(amount, Currency::Usd, TransactionType::Payment, None, None, None, None)
    }

    async fn registry_and_breakers() -> (Vec<(String, std::sync::Arc<dyn Provider>)>, HashMap<String, CircuitBreaker>) {
        let providers = default_providers();
        let mut breakers = HashMap::new();
        for (name, _) in &providers {
            breakers.insert(name.to_string(), CircuitBreaker::new(*name, CircuitBreakerConfig::default()));
        }
        (
            providers.into_iter().map(|(n, p)| (n.to_string(), p)).collect(),
            breakers,
        )
    }

    #[tokio::test]
    async fn cost_optimized_picks_cheapest_eligible() {
        let (providers, breakers) = registry_and_breakers().await;
        let registry: Vec<RegisteredProvider> = providers
            .iter()
            .map(|(n, p)| RegisteredProvider {
                name: n,
                provider: p.as_ref(),
                breaker: &breakers[n],
            })
            .collect();
        let router = Router::new();
        let (selected, decision) = router
            .select(RoutingStrategy::CostOptimized, &tx(100.0), &registry, &HashSet::new())
            .await;
        // razorpay has the lowest processing_fee_percent (2.0) of the four.
        assert_eq!(selected, "razorpay");
        assert!(decision.decision_factors.contains_key("estimated_cost"));
    }

    #[tokio::test]
    async fn round_robin_never_reuses_excluded_provider() {
        let (providers, breakers) = registry_and_breakers().await;
        let registry: Vec<RegisteredProvider> = providers
            .iter()
            .map(|(n, p)| RegisteredProvider {
                name: n,
                provider: p.as_ref(),
                breaker: &breakers[n],
            })
            .collect();
        let router = Router::new();
        let mut exclude = HashSet::new();
        exclude.insert("stripe".to_string());
        let (selected, _) = router
            .select(RoutingStrategy::RoundRobin, &tx(100.0), &registry, &exclude)
            .await;
        assert_ne!(selected, "stripe");
    }

    #[tokio::test]
    async fn fallback_flags_decision_factors_when_nothing_eligible() {
        let (providers, breakers) = registry_and_breakers().await;
        let registry: Vec<RegisteredProvider> = providers
            .iter()
            .map(|(n, p)| RegisteredProvider {
                name: n,
                provider: p.as_ref(),
                breaker: &breakers[n],
            })
            .collect();
        let router = Router::new();
        // amount above every provider's max_amount forces can_process to fail everywhere.
        let (_, decision) = router
            .select(RoutingStrategy::HealthBased, &tx(10_000_000.0), &registry, &HashSet::new())
            .await;
        assert!(decision.is_fallback());
    }
}
