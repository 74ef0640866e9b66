//! Error types for provider attempts.
//!
//! `ProviderError` never escapes the retry orchestrator: per
//! `SPEC_FULL.md` §7 it is captured into a `Route` record, not
//! propagated. Only `payflow_gateway::error::GatewayError` (facade-level)
//! propagates to a caller.

use thiserror::Error;

use crate::models::ErrorKind;

/// A failed provider attempt, carrying the structured reason a `Route`
/// needs to record.
#[derive(Debug, Error, Clone)]
#[error("{provider}: {kind:?}: {message}")]
pub struct ProviderError {
    pub provider: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }
}
