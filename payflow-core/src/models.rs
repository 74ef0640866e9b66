//! Core data model: transactions, routes, routing decisions, and the
//! static/dynamic provider descriptors.
//!
//! Every closed enumeration here mirrors a wire-level constant from the
//! payment gateway's external interface (see the workspace root
//! `SPEC_FULL.md` §6) and is serialized `snake_case` to match it exactly.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Closed currency set this gateway quotes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Sgd,
    Myr,
    Thb,
    Idr,
    Vnd,
    Php,
}

/// Coarse settlement region used for eligibility and preference scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    NorthAmerica,
    Europe,
    AsiaPacific,
    SoutheastAsia,
    LatinAmerica,
    MiddleEast,
    Africa,
}

/// How the customer is paying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    DigitalWallet,
    BankTransfer,
    Cryptocurrency,
    BuyNowPayLater,
}

/// Card network, meaningful only when `PaymentMethod::Card` is in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardNetwork {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Jcb,
    Diners,
    Unionpay,
}

/// Kind of transaction being orchestrated. Only `Payment` drives a full
/// provider attempt loop today; the others are modeled for completeness
/// of the wire contract but are not distinguished by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[default]
    Payment,
    Refund,
    Authorization,
    Capture,
    Void,
}

/// Customer risk tier, feeding the risk penalty in the success-probability
/// formula (see `payflow_core::provider`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Lifecycle status of a `Transaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Timeout,
    Retrying,
    Cancelled,
    Refunded,
}

/// Status of a single attempt (`Route`). Distinct from `PaymentStatus`:
/// a Route never reaches `Timeout`/`Retrying`/`Cancelled`/`Refunded`:
/// those are transaction-level outcomes, not per-attempt ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Success,
    Failed,
    Error,
}

/// Closed routing strategy enumeration (`SPEC_FULL.md` §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    #[default]
    HealthBased,
    RoundRobin,
    Failover,
    CardNetworkOptimized,
    CostOptimized,
}

/// The wire-level error taxonomy a provider attempt can fail with.
/// Grouped identically to `SPEC_FULL.md` §7; the grouping is informative
/// only; the wire representation is a single flat closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    // Network
    Timeout,
    ConnectionRefused,
    SslHandshakeFailed,
    DnsResolutionFailed,
    NetworkTimeout,
    NetworkUnavailable,
    // Instrument / authorization
    CardDeclined,
    InsufficientFunds,
    AuthenticationFailed,
    BlockedCard,
    ExpiredCard,
    InvalidCardNumber,
    InvalidCvv,
    IssuerUnavailable,
    // Policy / compliance
    AccountRestricted,
    CurrencyNotSupported,
    RegionBlocked,
    ComplianceViolation,
    FraudDetected,
    DuplicateTransaction,
    // Method-specific
    WalletInsufficientBalance,
    WalletSuspended,
    BankAccountClosed,
    BankTransferLimitExceeded,
    // Provider / system
    RateLimited,
    ProviderMaintenance,
    UnsupportedTransaction,
}

impl ErrorKind {
    /// Default retryable allowlist per `SPEC_FULL.md` §4.5 / §8.1.
    pub fn default_retryable() -> &'static [ErrorKind] {
        &[
            ErrorKind::Timeout,
            ErrorKind::ConnectionRefused,
            ErrorKind::NetworkTimeout,
            ErrorKind::ProviderMaintenance,
        ]
    }
}

/// Card/wallet/bank details. PAN and CVV are intentionally never modeled
/// here beyond a masked last-four: this gateway never handles real
/// cryptographic card data (`SPEC_FULL.md` §1 non-goals).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInstrument {
    pub method: PaymentMethod,
    pub network: Option<CardNetwork>,
    pub last_four: Option<String>,
    pub expiry_month: Option<u8>,
    pub expiry_year: Option<u16>,
    pub country_code: Option<String>,
    pub issuer: Option<String>,
    pub brand: Option<String>,
}

/// Customer context available to the router and the provider's
/// success-probability model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub customer_id: String,
    pub country: Option<String>,
    pub region: Option<Region>,
    pub risk_level: RiskLevel,
    pub successful_payments: u64,
    pub previous_failures: u64,
    pub preferred_providers: Vec<String>,
}

/// Why the router picked what it picked for one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub selected_provider: String,
    pub strategy_used: RoutingStrategy,
    pub decision_factors: HashMap<String, Value>,
    pub alternative_providers: Vec<String>,
    pub confidence_score: f64,
    pub timestamp: DateTime<Utc>,
}

impl RoutingDecision {
    pub fn is_fallback(&self) -> bool {
        self.decision_factors
            .get("fallback")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// One provider attempt, appended exactly once and never mutated again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub provider: String,
    pub attempt_number: u32,
    pub status: RouteStatus,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<ErrorKind>,
    pub processing_time: Option<f64>,
    pub provider_response_code: Option<String>,
    pub network_response_code: Option<String>,
    pub network_latency: Option<f64>,
    pub retry_eligible: bool,
    pub decision: RoutingDecision,
}

/// The unit of orchestration. Mutated only by the retry orchestrator
/// (attempts, provider, route_history, status, metadata); all other
/// fields are immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub merchant_id: Option<String>,
    pub order_id: Option<String>,
    pub amount: f64,
    pub currency: Currency,
    pub transaction_type: TransactionType,
    pub instrument: Option<PaymentInstrument>,
    pub customer: Option<CustomerInfo>,
    pub provider: String,
    pub status: PaymentStatus,
    pub attempts: u32,
    pub route_history: Vec<Route>,
    pub risk_score: Option<f64>,
    pub fraud_indicators: Vec<String>,
    pub metadata: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        amount: f64,
        currency: Currency,
        transaction_type: TransactionType,
        instrument: Option<PaymentInstrument>,
        customer: Option<CustomerInfo>,
        merchant_id: Option<String>,
        order_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            merchant_id,
            order_id,
            amount,
            currency,
            transaction_type,
            instrument,
            customer,
            provider: "temp".to_string(),
            status: PaymentStatus::Pending,
            attempts: 0,
            route_history: Vec::new(),
            risk_score: None,
            fraud_indicators: Vec::new(),
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// The card network if the instrument is a card, else `None`.
    pub fn card_network(&self) -> Option<CardNetwork> {
        self.instrument.as_ref().and_then(|i| i.network)
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.instrument.as_ref().map(|i| i.method)
    }

    pub fn region(&self) -> Option<Region> {
        self.customer.as_ref().and_then(|c| c.region)
    }

    pub fn risk_score_or_default(&self) -> f64 {
        self.risk_score.unwrap_or(0.0)
    }

    /// `SPEC_FULL.md` §3 invariant: `attempts == len(route_history)`.
    pub fn push_route(&mut self, route: Route) {
        debug_assert_eq!(route.attempt_number, self.attempts + 1);
        self.attempts += 1;
        self.route_history.push(route);
    }

    pub fn is_terminal_success(&self) -> bool {
        self.status == PaymentStatus::Success
    }
}

/// Static per-provider capability declaration, fixed at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCapability {
    pub supported_networks: Vec<CardNetwork>,
    pub supported_methods: Vec<PaymentMethod>,
    pub supported_currencies: Vec<Currency>,
    pub supported_regions: Vec<Region>,
    pub min_amount: f64,
    pub max_amount: f64,
    pub processing_fee_percent: f64,
}

/// Computed view over a provider's rolling counters. Owns no state of
/// its own beyond what `health::HealthTracker` already aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub provider: String,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub current_load: u32,
    pub is_healthy: bool,
    pub last_checked: DateTime<Utc>,
    pub circuit_breaker_open: bool,
    pub last_circuit_failure: Option<DateTime<Utc>>,
    pub success_rate_by_network: HashMap<String, f64>,
    pub success_rate_by_method: HashMap<String, f64>,
    pub success_rate_by_region: HashMap<String, f64>,
}
