//! Event bus + structured logger (C6, `SPEC_FULL.md` §4.6).
//!
//! Field-for-field grounded on
//! `examples/original_source/src/payment_gateway/logging/structured_logger.py`'s
//! `StructuredLogger`: six JSONL streams, one `StructuredLogEntry` shape,
//! and the same business-impact formulas. The bus is synchronous with
//! respect to the orchestrator: `emit` returns only once the line has
//! been appended (or the write has failed and been swallowed), matching
//! `spec.md` §4.6's happens-before requirement.
//!
//! A write failure never reaches the payment path: it is reported on the
//! `tracing::error!` side channel and otherwise discarded, the same as
//! `original_source`'s `print(f"Failed to write log entry: {e}")` swallow.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use payflow_core::models::{PaymentStatus, Route, Transaction};

/// Closed event-kind enumeration, `spec.md` §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PaymentInitiated,
    PaymentSuccess,
    PaymentFailure,
    PaymentFinalFailure,
    PaymentRetry,
    RoutingSwitch,
    CircuitBreakerEvent,
    PerformanceMetrics,
    SystemHealth,
}

impl EventType {
    fn stream(self) -> &'static str {
        match self {
            EventType::PaymentInitiated
            | EventType::PaymentSuccess
            | EventType::PaymentFinalFailure
            | EventType::PaymentRetry
            | EventType::RoutingSwitch => "payment_events",
            EventType::PaymentFailure => "failure_analysis",
            EventType::CircuitBreakerEvent => "circuit_breaker_events",
            EventType::PerformanceMetrics => "performance_metrics",
            EventType::SystemHealth => "system_health",
        }
    }

    fn default_level(self) -> Level {
        match self {
            EventType::PaymentSuccess | EventType::PaymentInitiated | EventType::PerformanceMetrics | EventType::SystemHealth => {
                Level::Info
            }
            EventType::PaymentFailure | EventType::PaymentFinalFailure | EventType::CircuitBreakerEvent => Level::Warn,
            EventType::PaymentRetry | EventType::RoutingSwitch => Level::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Warn,
    Error,
    Debug,
}

/// One JSON line. Every stream shares this exact shape (`spec.md` §6) so
/// downstream log mining never has to special-case a stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredLogEntry {
    pub log_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub event_type: EventType,
    pub transaction_id: Option<Uuid>,
    pub provider: Option<String>,
    pub message: String,
    pub context: HashMap<String, Value>,
    pub metrics: HashMap<String, Value>,
    pub error_details: Option<Value>,
    pub routing_context: Option<Value>,
    pub performance_metrics: Option<Value>,
    pub business_impact: Option<Value>,
}

/// Cumulative counters exposed by `PaymentGateway::get_metrics`. Intentionally
/// small; the durable, detailed record lives in the JSONL streams
/// themselves; this is the in-memory rollup `spec.md` §4.7's
/// `get_metrics()` surfaces.
#[derive(Debug, Default, Serialize)]
pub struct MetricsSnapshot {
    pub events_emitted: u64,
    pub payments_succeeded: u64,
    pub payments_failed: u64,
    pub total_attempts: u64,
    pub write_failures: u64,
}

struct Streams {
    payment_events: Mutex<File>,
    routing_decisions: Mutex<File>,
    failure_analysis: Mutex<File>,
    performance_metrics: Mutex<File>,
    circuit_breaker_events: Mutex<File>,
    system_health: Mutex<File>,
}

/// Owns the six JSONL files under `log_directory` plus the in-memory
/// counters backing `get_metrics()`. One instance per `PaymentGateway`
/// (`spec.md` §9: "no true globals"; the bus belongs to the facade
/// instance, not a process-wide singleton).
pub struct EventBus {
    streams: Streams,
    events_emitted: AtomicU64,
    payments_succeeded: AtomicU64,
    payments_failed: AtomicU64,
    total_attempts: AtomicU64,
    write_failures: AtomicU64,
}

impl EventBus {
    pub fn new(log_directory: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = log_directory.as_ref();
        std::fs::create_dir_all(dir)?;

        let open = |name: &str| -> std::io::Result<Mutex<File>> {
            let path: PathBuf = dir.join(name);
            Ok(Mutex::new(OpenOptions::new().create(true).append(true).open(path)?))
        };

        Ok(Self {
            streams: Streams {
                payment_events: open("payment_events.jsonl")?,
                routing_decisions: open("routing_decisions.jsonl")?,
                failure_analysis: open("failure_analysis.jsonl")?,
                performance_metrics: open("performance_metrics.jsonl")?,
                circuit_breaker_events: open("circuit_breaker_events.jsonl")?,
                system_health: open("system_health.jsonl")?,
            },
            events_emitted: AtomicU64::new(0),
            payments_succeeded: AtomicU64::new(0),
            payments_failed: AtomicU64::new(0),
            total_attempts: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        })
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            payments_succeeded: self.payments_succeeded.load(Ordering::Relaxed),
            payments_failed: self.payments_failed.load(Ordering::Relaxed),
            total_attempts: self.total_attempts.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }

    /// Emits a payment lifecycle event (`payment_initiated`, `payment_success`,
    /// `payment_final_failure`, `payment_retry`, `routing_switch`), context
    /// keys per `spec.md` §6 "payment_*".
    pub fn emit_payment_event(&self, event_type: EventType, tx: &Transaction, message: String) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        match event_type {
            EventType::PaymentSuccess => {
                self.payments_succeeded.fetch_add(1, Ordering::Relaxed);
            }
            EventType::PaymentFinalFailure => {
                self.payments_failed.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }

        let context = payment_context(tx);
        let entry = StructuredLogEntry {
            log_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level: event_type.default_level(),
            event_type,
            transaction_id: Some(tx.id),
            provider: Some(tx.provider.clone()),
            message,
            context,
            metrics: HashMap::new(),
            error_details: None,
            routing_context: Some(routing_context(tx)),
            performance_metrics: Some(json!(performance_metrics(tx))),
            business_impact: Some(json!(business_impact(tx, event_type))),
        };

        tracing::info!(transaction_id = %tx.id, event = ?event_type, "{}", entry.message);
        self.write(&entry);
    }

    /// Emits one `payment_failure` record per failed attempt, with the
    /// full attempt history for pattern recognition (`spec.md` §6
    /// "payment_failure" context keys).
    pub fn emit_failure(&self, tx: &Transaction, route: &Route) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        self.total_attempts.fetch_add(1, Ordering::Relaxed);

        let now = Utc::now();
        let mut context = payment_context(tx);
        context.insert(
            "error_code".to_string(),
            json!(route.reason.map(|k| format!("{:?}", k))),
        );
        context.insert("error_message".to_string(), json!(route.provider_response_code));
        context.insert(
            "attempt_history".to_string(),
            json!(tx.route_history.iter().map(route_summary).collect::<Vec<_>>()),
        );
        context.insert("time_of_day".to_string(), json!(now.hour()));
        context.insert("day_of_week".to_string(), json!(now.weekday()));

        let entry = StructuredLogEntry {
            log_id: Uuid::new_v4(),
            timestamp: now,
            level: Level::Error,
            event_type: EventType::PaymentFailure,
            transaction_id: Some(tx.id),
            provider: Some(route.provider.clone()),
            message: format!("payment failed: {:?}", route.reason),
            context,
            metrics: HashMap::new(),
            error_details: Some(json!({
                "provider_response_code": route.provider_response_code,
                "network_response_code": route.network_response_code,
                "processing_time": route.processing_time,
                "retry_eligible": route.retry_eligible,
            })),
            routing_context: Some(routing_context(tx)),
            performance_metrics: Some(json!(performance_metrics(tx))),
            business_impact: Some(json!(business_impact(tx, EventType::PaymentFailure))),
        };

        tracing::warn!(transaction_id = %tx.id, provider = %route.provider, "payment attempt failed");
        self.write(&entry);
    }

    /// `spec.md` §6 "routing_decision" context keys.
    pub fn emit_routing_decision(&self, tx: &Transaction, route: &Route) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        let decision = &route.decision;
        let mut context = HashMap::new();
        context.insert("selected_provider".to_string(), json!(decision.selected_provider));
        context.insert("alternative_providers".to_string(), json!(decision.alternative_providers));
        context.insert("decision_factors".to_string(), json!(decision.decision_factors));
        context.insert(
            "transaction_context".to_string(),
            json!({
                "amount": tx.amount,
                "currency": tx.currency,
                "payment_method": tx.payment_method(),
                "card_network": tx.card_network(),
                "customer_region": tx.region(),
                "risk_score": tx.risk_score,
            }),
        );

        let entry = StructuredLogEntry {
            log_id: Uuid::new_v4(),
            timestamp: decision.timestamp,
            level: Level::Info,
            event_type: EventType::RoutingSwitch,
            transaction_id: Some(tx.id),
            provider: Some(decision.selected_provider.clone()),
            message: format!(
                "route selected: {} over {:?}",
                decision.selected_provider, decision.alternative_providers
            ),
            context,
            metrics: HashMap::new(),
            error_details: None,
            routing_context: None,
            performance_metrics: None,
            business_impact: None,
        };

        self.write_to(&entry, &self.streams.routing_decisions);
    }

    /// `spec.md` §6 "circuit_breaker_event" context keys.
    pub fn emit_circuit_breaker_event(&self, provider: &str, state_change: &str, failure_count: u32) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        let mut context = HashMap::new();
        context.insert("state_change".to_string(), json!(state_change));
        context.insert("failure_count".to_string(), json!(failure_count));
        context.insert("provider_context".to_string(), json!({ "provider": provider }));
        context.insert(
            "impact_assessment".to_string(),
            json!({ "affected_transactions": Value::Null, "alternative_providers": Value::Array(vec![]) }),
        );

        let entry = StructuredLogEntry {
            log_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level: Level::Warn,
            event_type: EventType::CircuitBreakerEvent,
            transaction_id: None,
            provider: Some(provider.to_string()),
            message: format!("circuit breaker {state_change} for {provider}"),
            context,
            metrics: HashMap::new(),
            error_details: None,
            routing_context: None,
            performance_metrics: None,
            business_impact: None,
        };

        tracing::warn!(provider, state_change, "circuit breaker transition");
        self.write_to(&entry, &self.streams.circuit_breaker_events);
    }

    pub fn emit_performance_metrics(&self, provider: &str, metrics: HashMap<String, Value>) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        let entry = StructuredLogEntry {
            log_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level: Level::Info,
            event_type: EventType::PerformanceMetrics,
            transaction_id: None,
            provider: Some(provider.to_string()),
            message: format!("performance metrics for {provider}"),
            context: HashMap::new(),
            metrics,
            error_details: None,
            routing_context: None,
            performance_metrics: None,
            business_impact: None,
        };
        self.write_to(&entry, &self.streams.performance_metrics);
    }

    pub fn emit_system_health(&self, context: HashMap<String, Value>) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        let entry = StructuredLogEntry {
            log_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level: Level::Info,
            event_type: EventType::SystemHealth,
            transaction_id: None,
            provider: None,
            message: "system health check".to_string(),
            context,
            metrics: HashMap::new(),
            error_details: None,
            routing_context: None,
            performance_metrics: None,
            business_impact: None,
        };
        self.write_to(&entry, &self.streams.system_health);
    }

    fn write(&self, entry: &StructuredLogEntry) {
        let stream = match entry.event_type.stream() {
            "payment_events" => &self.streams.payment_events,
            "failure_analysis" => &self.streams.failure_analysis,
            "circuit_breaker_events" => &self.streams.circuit_breaker_events,
            "performance_metrics" => &self.streams.performance_metrics,
            "system_health" => &self.streams.system_health,
            _ => &self.streams.payment_events,
        };
        self.write_to(entry, stream);
    }

    fn write_to(&self, entry: &StructuredLogEntry, stream: &Mutex<File>) {
        let line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize structured log entry");
                self.write_failures.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        let mut guard = match stream.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = writeln!(guard, "{line}") {
            tracing::error!(error = %err, "failed to write structured log entry");
            self.write_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn payment_context(tx: &Transaction) -> HashMap<String, Value> {
    let mut context = HashMap::new();
    context.insert("transaction_amount".to_string(), json!(tx.amount));
    context.insert("transaction_currency".to_string(), json!(tx.currency));
    context.insert("payment_method".to_string(), json!(tx.payment_method()));
    context.insert("card_network".to_string(), json!(tx.card_network()));
    context.insert("customer_region".to_string(), json!(tx.region()));
    context.insert(
        "customer_risk_level".to_string(),
        json!(tx.customer.as_ref().map(|c| c.risk_level)),
    );
    context.insert("merchant_id".to_string(), json!(tx.merchant_id));
    context.insert("attempt_number".to_string(), json!(tx.attempts));
    context.insert("total_routes_tried".to_string(), json!(tx.route_history.len()));
    context
}

fn routing_context(tx: &Transaction) -> Value {
    if tx.route_history.is_empty() {
        return json!({});
    }
    let providers_tried: std::collections::HashSet<&str> =
        tx.route_history.iter().map(|r| r.provider.as_str()).collect();
    json!({
        "current_provider": tx.provider,
        "providers_tried": providers_tried,
        "routing_decisions": tx.route_history.iter().map(|r| &r.decision).collect::<Vec<_>>(),
        "provider_switches": providers_tried.len().saturating_sub(1),
    })
}

#[derive(Serialize)]
struct PerformanceSummary {
    total_processing_time: f64,
    avg_processing_time: f64,
    max_processing_time: f64,
    attempts_count: usize,
    successful_attempts: usize,
    failed_attempts: usize,
}

fn performance_metrics(tx: &Transaction) -> PerformanceSummary {
    let times: Vec<f64> = tx.route_history.iter().filter_map(|r| r.processing_time).collect();
    let total: f64 = times.iter().sum();
    let successful = tx
        .route_history
        .iter()
        .filter(|r| r.status == payflow_core::models::RouteStatus::Success)
        .count();
    PerformanceSummary {
        total_processing_time: total,
        avg_processing_time: if times.is_empty() { 0.0 } else { total / times.len() as f64 },
        max_processing_time: times.iter().cloned().fold(0.0, f64::max),
        attempts_count: tx.route_history.len(),
        successful_attempts: successful,
        failed_attempts: tx.route_history.len() - successful,
    }
}

/// `spec.md` §4.6 business-impact formulas, verbatim.
#[derive(Serialize)]
struct BusinessImpact {
    revenue_at_risk: f64,
    customer_experience_score: f64,
    cost_implications: CostImplications,
}

#[derive(Serialize)]
struct CostImplications {
    processing_fees: f64,
    retry_costs: f64,
    opportunity_cost: f64,
}

fn business_impact(tx: &Transaction, event_type: EventType) -> BusinessImpact {
    let is_failure = matches!(event_type, EventType::PaymentFailure | EventType::PaymentFinalFailure);
    let is_failed_status = tx.status == PaymentStatus::Failed;

    let total_processing_time: f64 = tx.route_history.iter().filter_map(|r| r.processing_time).sum();
    let retry_penalty = 10.0 * (tx.attempts.saturating_sub(1)) as f64;
    let time_penalty = (5.0 * total_processing_time).min(30.0);
    let failure_penalty = if is_failed_status { 50.0 } else { 0.0 };
    let cx_score = (100.0 - retry_penalty - time_penalty - failure_penalty).clamp(0.0, 100.0);

    let processing_fee = tx
        .metadata
        .get("processing_fee")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    BusinessImpact {
        revenue_at_risk: if is_failure { tx.amount } else { 0.0 },
        customer_experience_score: cx_score,
        cost_implications: CostImplications {
            processing_fees: processing_fee,
            retry_costs: 0.01 * tx.route_history.len() as f64,
            opportunity_cost: if is_failed_status { 0.1 * tx.amount } else { 0.0 },
        },
    }
}

fn route_summary(route: &Route) -> Value {
    json!({
        "provider": route.provider,
        "attempt_number": route.attempt_number,
        "status": route.status,
        "reason": route.reason,
        "retry_eligible": route.retry_eligible,
    })
}

use chrono::Datelike;
use chrono::Timelike;

#[cfg(test)]
mod tests {
    use super::*;
    use payflow_core::models::{Currency, TransactionType};
    use tempfile::TempDir;

    fn tx() -> Transaction {
        Transaction::new(100.0, Currency::Usd, TransactionType::Payment, None, None, None, None)
    }

    #[test]
    fn emitting_appends_a_jsonl_line() {
        let dir = TempDir::new().unwrap();
        let bus = EventBus::new(dir.path()).unwrap();
        let t = tx();
        bus.emit_payment_event(EventType::PaymentInitiated, &t, "payment initiated".to_string());
        let contents = std::fs::read_to_string(dir.path().join("payment_events.jsonl")).unwrap();
        assert_eq!(contents.lines().count(), 1);
        let parsed: Value = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(parsed["event_type"], "payment_initiated");
    }

    #[test]
    fn success_event_increments_metrics_snapshot() {
        let dir = TempDir::new().unwrap();
        let bus = EventBus::new(dir.path()).unwrap();
        let t = tx();
        bus.emit_payment_event(EventType::PaymentSuccess, &t, "ok".to_string());
        assert_eq!(bus.metrics().payments_succeeded, 1);
    }

    #[test]
    fn business_impact_flags_full_amount_at_risk_on_failure() {
        let t = tx();
        let impact = business_impact(&t, EventType::PaymentFinalFailure);
        assert_eq!(impact.revenue_at_risk, 100.0);
    }
}
