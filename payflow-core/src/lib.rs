//! # payflow-core
//!
//! Provider abstraction, circuit breaker, health counters, and routing
//! primitives for the payflow payment gateway orchestrator.
//!
//! This crate has no knowledge of configuration files, JSONL logging, or
//! the retry loop itself: those live in `payflow-gateway`, which
//! composes the pieces here into a full orchestrator. `payflow-core` is
//! deliberately the dependency-light half of the workspace: given a
//! transaction and a provider registry, it can answer "which provider,
//! and is it healthy" without reading anything off disk.
//!
//! ## Modules
//!
//! - [`models`]: the data model (`Transaction`, `Route`, `RoutingDecision`,
//!   and the closed enumerations that make up the wire contract).
//! - [`error`]: `ProviderError`, the typed failure a provider attempt
//!   produces.
//! - [`provider`]: the `Provider` trait and its simulated implementation.
//! - [`providers`]: the four named upstream acquirers (stripe, adyen,
//!   paypal, razorpay) with their baseline capability tables.
//! - [`circuit_breaker`]: per-provider fault isolation.
//! - [`health`]: per-provider rolling counters broken down by card
//!   network, payment method, and region.
//! - [`routing`]: the strategy-driven provider selector.

pub mod circuit_breaker;
pub mod error;
pub mod health;
pub mod models;
pub mod provider;
pub mod providers;
pub mod routing;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
pub use error::ProviderError;
pub use health::HealthTracker;
pub use provider::{Provider, ProviderOptions};
pub use routing::{RegisteredProvider, Router};
