//! The provider contract (`SPEC_FULL.md` §4.1) and its simulated
//! implementation.
//!
//! `SimulatedProvider` is deterministic in *shape* (every branch named in
//! `spec.md` §4.1 is present) but stochastic in *outcome*, exactly as
//! `examples/original_source/providers/base.py`'s `PaymentProvider` is:
//! success/failure and latency are drawn from the adjusted probability
//! and latency formulas, not hard-coded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;

use crate::error::ProviderError;
use crate::health::HealthTracker;
use crate::models::{
    CardNetwork, Currency, ErrorKind, PaymentMethod, ProviderCapability, ProviderHealth, Region,
    Transaction,
};

/// What a successful `process()` call reports back to the orchestrator.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub processing_time: f64,
    pub provider_response_code: String,
    pub network_response_code: String,
    pub processing_fee: f64,
}

/// Administrative knobs for `configure()`, used by the scenario injector
/// (`simulate_scenario` on the gateway facade) and by tests.
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    pub success_rate: Option<f64>,
    pub avg_latency_ms: Option<f64>,
    pub is_maintenance: Option<bool>,
    pub rate_limit_threshold: Option<u32>,
}

/// The provider contract every upstream acquirer (simulated or real)
/// implements. See `SPEC_FULL.md` §4.1.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;
    fn capabilities(&self) -> ProviderCapability;
    fn can_process(&self, tx: &Transaction) -> bool;
    async fn process(&self, tx: &Transaction) -> Result<ProcessOutcome, ProviderError>;
    fn health(&self) -> ProviderHealth;
    fn configure(&self, options: ProviderOptions);
    fn specific_errors(&self) -> Vec<ErrorKind>;
    fn network_preference_score(&self, network: CardNetwork) -> f64;
    /// Part of `SPEC_FULL.md`'s eligibility definition (capability match
    /// + breaker != OPEN + not in maintenance), distinct from
    /// `health().is_healthy` which also folds in the success-rate floor.
    fn in_maintenance(&self) -> bool;
}

struct RateLimitWindow {
    window_start: DateTime<Utc>,
    count: u32,
}

/// Fixed-window rate limiter, `SPEC_FULL.md` §4.1.1: default 100
/// requests per 60s window, reset when the window elapses.
struct RateLimiter {
    window: Mutex<RateLimitWindow>,
    threshold: AtomicU32,
    window_secs: u64,
}

impl RateLimiter {
    fn new(threshold: u32, window_secs: u64) -> Self {
        Self {
            window: Mutex::new(RateLimitWindow {
                window_start: Utc::now(),
                count: 0,
            }),
            threshold: AtomicU32::new(threshold),
            window_secs,
        }
    }

    fn set_threshold(&self, threshold: u32) {
        self.threshold.store(threshold, Ordering::Relaxed);
    }

    /// Increments the counter and reports whether this call is
    /// over-threshold. Every `process` call increments regardless of
    /// outcome, per `SPEC_FULL.md` §4.1.1.
    fn check_and_increment(&self) -> bool {
        let mut guard = self.window.lock().expect("rate limiter mutex poisoned");
        let elapsed = Utc::now().signed_duration_since(guard.window_start);
        if elapsed >= chrono::Duration::seconds(self.window_secs as i64) {
            guard.window_start = Utc::now();
            guard.count = 0;
        }
        guard.count += 1;
        guard.count > self.threshold.load(Ordering::Relaxed)
    }

    /// Requests seen in the current window, for `health().current_load`.
    fn current_count(&self) -> u32 {
        self.window.lock().expect("rate limiter mutex poisoned").count
    }
}

fn network_latency_multiplier(network: CardNetwork) -> f64 {
    match network {
        CardNetwork::Visa => 1.0,
        CardNetwork::Mastercard => 1.1,
        CardNetwork::Amex => 1.3,
        CardNetwork::Discover => 1.2,
        CardNetwork::Jcb => 1.4,
        CardNetwork::Diners => 1.4,
        CardNetwork::Unionpay => 1.5,
    }
}

fn method_latency_multiplier(method: PaymentMethod) -> f64 {
    match method {
        PaymentMethod::Card => 1.0,
        PaymentMethod::DigitalWallet => 0.8,
        PaymentMethod::BankTransfer => 2.0,
        PaymentMethod::Cryptocurrency => 3.0,
        PaymentMethod::BuyNowPayLater => 1.0,
    }
}

fn network_fee_multiplier(network: CardNetwork) -> f64 {
    match network {
        CardNetwork::Visa => 1.0,
        CardNetwork::Mastercard => 1.05,
        CardNetwork::Amex => 1.5,
        CardNetwork::Discover => 1.1,
        CardNetwork::Jcb => 1.3,
        CardNetwork::Diners => 1.3,
        CardNetwork::Unionpay => 1.2,
    }
}

fn amount_penalty(amount: f64) -> f64 {
    if amount <= 1000.0 {
        1.0
    } else if amount <= 5000.0 {
        0.95
    } else {
        0.90
    }
}

fn risk_penalty(risk_score: f64) -> f64 {
    if risk_score <= 0.5 {
        1.0
    } else if risk_score <= 0.7 {
        0.95
    } else {
        0.85
    }
}

/// A single named upstream acquirer with fixed baseline characteristics
/// and mutable runtime knobs (for scenario injection).
pub struct SimulatedProvider {
    name: String,
    capability: ProviderCapability,
    network_preferences: HashMap<CardNetwork, f64>,
    default_network_preference: f64,
    specific_errors: Vec<ErrorKind>,
    base_success_rate: Mutex<f64>,
    base_latency_ms: Mutex<f64>,
    is_maintenance: AtomicBool,
    health: HealthTracker,
    rate_limiter: RateLimiter,
}

impl SimulatedProvider {
    pub fn new(
        name: impl Into<String>,
        capability: ProviderCapability,
        network_preferences: HashMap<CardNetwork, f64>,
        default_network_preference: f64,
        specific_errors: Vec<ErrorKind>,
        base_success_rate: f64,
        base_latency_ms: f64,
    ) -> Self {
        Self {
            name: name.into(),
            capability,
            network_preferences,
            default_network_preference,
            specific_errors,
            base_success_rate: Mutex::new(base_success_rate),
            base_latency_ms: Mutex::new(base_latency_ms),
            is_maintenance: AtomicBool::new(false),
            health: HealthTracker::new(),
            rate_limiter: RateLimiter::new(100, 60),
        }
    }

    fn adjusted_success_probability(&self, tx: &Transaction) -> f64 {
        let base = *self.base_success_rate.lock().expect("poisoned");
        let network_score = tx
            .card_network()
            .map(|n| self.network_preference_score(n))
            .unwrap_or(1.0);
        let probability =
            base * network_score * amount_penalty(tx.amount) * risk_penalty(tx.risk_score_or_default());
        probability.clamp(0.0, 1.0)
    }

    fn latency_ms(&self, tx: &Transaction) -> f64 {
        let base = *self.base_latency_ms.lock().expect("poisoned");
        let network_mult = tx.card_network().map(network_latency_multiplier).unwrap_or(1.0);
        let method_mult = tx.payment_method().map(method_latency_multiplier).unwrap_or(1.0);
        let jitter = rand::thread_rng().gen_range(0.7..1.3);
        base * network_mult * method_mult * jitter
    }

    fn fee(&self, tx: &Transaction) -> f64 {
        let network_mult = tx.card_network().map(network_fee_multiplier).unwrap_or(1.0);
        tx.amount * (self.capability.processing_fee_percent * network_mult) / 100.0
    }

    /// `SPEC_FULL.md` §4.1.2: the provider's own error list, augmented
    /// contextually by network, amount, and method.
    fn select_contextual_error(&self, tx: &Transaction) -> ErrorKind {
        let mut candidates = self.specific_errors.clone();

        if let Some(network) = tx.card_network() {
            match network {
                CardNetwork::Amex => {
                    candidates.push(ErrorKind::AuthenticationFailed);
                    candidates.push(ErrorKind::BlockedCard);
                }
                CardNetwork::Jcb | CardNetwork::Unionpay => {
                    candidates.push(ErrorKind::RegionBlocked);
                    candidates.push(ErrorKind::CurrencyNotSupported);
                }
                _ => {}
            }
        }

        if tx.amount > 5000.0 {
            candidates.push(ErrorKind::InsufficientFunds);
            candidates.push(ErrorKind::FraudDetected);
        }

        if let Some(method) = tx.payment_method() {
            match method {
                PaymentMethod::DigitalWallet => {
                    candidates.push(ErrorKind::WalletInsufficientBalance);
                    candidates.push(ErrorKind::WalletSuspended);
                }
                PaymentMethod::BankTransfer => {
                    candidates.push(ErrorKind::BankAccountClosed);
                    candidates.push(ErrorKind::BankTransferLimitExceeded);
                }
                _ => {}
            }
        }

        if candidates.is_empty() {
            return ErrorKind::Timeout;
        }
        let idx = rand::thread_rng().gen_range(0..candidates.len());
        candidates[idx]
    }

    fn network_tag(tx: &Transaction) -> Option<String> {
        tx.card_network().map(|n| format!("{:?}", n).to_lowercase())
    }

    fn method_tag(tx: &Transaction) -> Option<String> {
        tx.payment_method().map(|m| format!("{:?}", m).to_lowercase())
    }

    fn region_tag(tx: &Transaction) -> Option<String> {
        tx.region().map(|r| format!("{:?}", r).to_lowercase())
    }
}

#[async_trait]
impl Provider for SimulatedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapability {
        self.capability.clone()
    }

    fn can_process(&self, tx: &Transaction) -> bool {
        if !self.capability.supported_currencies.contains(&tx.currency) {
            return false;
        }
        if tx.amount < self.capability.min_amount || tx.amount > self.capability.max_amount {
            return false;
        }
        if let Some(instrument) = &tx.instrument {
            if !self.capability.supported_methods.contains(&instrument.method) {
                return false;
            }
            if instrument.method == PaymentMethod::Card {
                if let Some(network) = instrument.network {
                    if !self.capability.supported_networks.contains(&network) {
                        return false;
                    }
                }
            }
        }
        if let Some(region) = tx.region() {
            if !self.capability.supported_regions.contains(&region) {
                return false;
            }
        }
        true
    }

    async fn process(&self, tx: &Transaction) -> Result<ProcessOutcome, ProviderError> {
        if !self.can_process(tx) {
            return Err(ProviderError::new(
                &self.name,
                ErrorKind::UnsupportedTransaction,
                "transaction does not match provider capabilities",
            ));
        }

        if self.rate_limiter.check_and_increment() {
            return Err(ProviderError::new(
                &self.name,
                ErrorKind::RateLimited,
                "rate limit window exceeded",
            ));
        }

        if self.is_maintenance.load(Ordering::Relaxed) {
            return Err(ProviderError::new(
                &self.name,
                ErrorKind::ProviderMaintenance,
                "provider is in scheduled maintenance",
            ));
        }

        let probability = self.adjusted_success_probability(tx);
        let latency_ms = self.latency_ms(tx);
        tokio::time::sleep(Duration::from_millis(latency_ms.max(0.0) as u64)).await;
        let processing_time = latency_ms / 1000.0;

        let roll: f64 = rand::thread_rng().gen_range(0.0..1.0);
        let succeeded = roll < probability;

        self.health.record(
            succeeded,
            processing_time,
            Self::network_tag(tx).as_deref(),
            Self::method_tag(tx).as_deref(),
            Self::region_tag(tx).as_deref(),
        );

        if succeeded {
            Ok(ProcessOutcome {
                processing_time,
                provider_response_code: "SUCCESS".to_string(),
                network_response_code: "00".to_string(),
                processing_fee: self.fee(tx),
            })
        } else {
            let kind = self.select_contextual_error(tx);
            Err(ProviderError::new(&self.name, kind, "provider declined the attempt"))
        }
    }

    fn health(&self) -> ProviderHealth {
        let success_rate = self.health.overall_success_rate();
        ProviderHealth {
            provider: self.name.clone(),
            success_rate,
            avg_latency_ms: self
                .health
                .avg_latency_ms(*self.base_latency_ms.lock().expect("poisoned")),
            current_load: self.rate_limiter.current_count(),
            is_healthy: success_rate > 0.5 && !self.is_maintenance.load(Ordering::Relaxed),
            last_checked: self.health.last_checked().unwrap_or_else(Utc::now),
            circuit_breaker_open: false,
            last_circuit_failure: None,
            success_rate_by_network: self.health.success_rate_by_network(),
            success_rate_by_method: self.health.success_rate_by_method(),
            success_rate_by_region: self.health.success_rate_by_region(),
        }
    }

    fn configure(&self, options: ProviderOptions) {
        if let Some(success_rate) = options.success_rate {
            *self.base_success_rate.lock().expect("poisoned") = success_rate;
        }
        if let Some(avg_latency_ms) = options.avg_latency_ms {
            *self.base_latency_ms.lock().expect("poisoned") = avg_latency_ms;
        }
        if let Some(is_maintenance) = options.is_maintenance {
            self.is_maintenance.store(is_maintenance, Ordering::Relaxed);
        }
        if let Some(threshold) = options.rate_limit_threshold {
            self.rate_limiter.set_threshold(threshold);
        }
    }

    fn specific_errors(&self) -> Vec<ErrorKind> {
        self.specific_errors.clone()
    }

    fn network_preference_score(&self, network: CardNetwork) -> f64 {
        self.network_preferences
            .get(&network)
            .copied()
            .unwrap_or(self.default_network_preference)
    }

    fn in_maintenance(&self) -> bool {
        self.is_maintenance.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, TransactionType};

    fn capability() -> ProviderCapability {
        ProviderCapability {
            supported_networks: vec![CardNetwork::Visa],
            supported_methods: vec![PaymentMethod::Card],
            supported_currencies: vec![Currency::Usd],
            supported_regions: vec![Region::NorthAmerica],
            min_amount: 1.0,
            max_amount: 1000.0,
            processing_fee_percent: 2.0,
        }
    }

    fn provider(success_rate: f64) -> SimulatedProvider {
        SimulatedProvider::new(
            "test",
            capability(),
            HashMap::from([(CardNetwork::Visa, 1.0)]),
            0.5,
            vec![ErrorKind::Timeout],
            success_rate,
            10.0,
        )
    }

    fn tx(amount: f64) -> Transaction {
        Transaction::new(amount, Currency::Usd, TransactionType::Payment, None, None, None, None)
    }

    #[tokio::test]
    async fn out_of_bounds_amount_fails_unsupported() {
        let p = provider(1.0);
        let result = p.process(&tx(5000.0)).await;
        assert!(matches!(result, Err(e) if e.kind == ErrorKind::UnsupportedTransaction));
    }

    #[tokio::test]
    async fn always_succeeds_at_success_rate_one() {
        let p = provider(1.0);
        let result = p.process(&tx(100.0)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn maintenance_short_circuits_before_simulation() {
        let p = provider(1.0);
        p.configure(ProviderOptions {
            is_maintenance: Some(true),
            ..Default::default()
        });
        let result = p.process(&tx(100.0)).await;
        assert!(matches!(result, Err(e) if e.kind == ErrorKind::ProviderMaintenance));
    }

    #[tokio::test]
    async fn rate_limit_trips_after_threshold() {
        let p = provider(1.0);
        p.configure(ProviderOptions {
            rate_limit_threshold: Some(1),
            ..Default::default()
        });
        let first = p.process(&tx(100.0)).await;
        assert!(first.is_ok());
        let second = p.process(&tx(100.0)).await;
        assert!(matches!(second, Err(e) if e.kind == ErrorKind::RateLimited));
    }
}
