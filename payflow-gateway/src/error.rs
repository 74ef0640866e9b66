//! Facade-level and configuration error types.
//!
//! Per `SPEC_FULL.md` §7, only two error conditions ever propagate out of
//! the `PaymentGateway` facade to a caller: everything a provider or a
//! breaker produces is captured into a `Route` instead. `ConfigError`
//! covers the ambient configuration-loading surface, which has no
//! `spec.md` counterpart but follows the teacher's `Config::load` /
//! `Config::validate` split.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transaction {id} not found")]
    TransactionNotFound { id: Uuid },

    #[error("invalid provider: {name}")]
    InvalidProvider { name: String },

    /// `SPEC_FULL.md` §8 invariant 8: retrying a transaction that already
    /// settled successfully is a no-op, surfaced as an error rather than
    /// a boolean flag so callers can't silently ignore it.
    #[error("already successful")]
    AlreadySuccessful { id: Uuid },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(String),
}
