//! # payflow-gateway
//!
//! The retry orchestrator, structured event bus, and facade that turn
//! `payflow-core`'s provider/breaker/router primitives into a complete
//! payment gateway.
//!
//! `payflow-core` can answer "which provider, and is it healthy" for a
//! single attempt; this crate is what runs the attempt loop to
//! completion, records every attempt to the six JSONL audit streams, and
//! exposes the single `PaymentGateway` facade embedding applications
//! call into. It also owns the ambient stack `payflow-core` deliberately
//! has none of: TOML + environment configuration, and the facade-level
//! error types that actually cross the crate boundary.
//!
//! ## Modules
//!
//! - [`config`]: `GatewayConfig`, TOML-loadable, `PAYFLOW_*` env
//!   overridable, validated before use.
//! - [`error`]: `GatewayError` and `ConfigError`, the only two error
//!   types that ever leave this crate.
//! - [`event_bus`]: the structured JSONL audit trail and the in-memory
//!   metrics rollup it backs.
//! - [`retry`]: the attempt loop itself, operating over a transaction
//!   and a provider registry.
//! - [`gateway`]: `PaymentGateway`, the facade.

pub mod config;
pub mod error;
pub mod event_bus;
pub mod gateway;
pub mod retry;

pub use config::GatewayConfig;
pub use error::{ConfigError, GatewayError};
pub use event_bus::{EventBus, EventType, MetricsSnapshot};
pub use gateway::{PaymentGateway, PaymentResponse, ProcessPaymentRequest, ProviderHealthView, ScenarioResult};
