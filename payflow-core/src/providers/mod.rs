//! The four named upstream acquirers this gateway routes across.
//!
//! Baseline capability tables, network preference scores, and
//! provider-specific error lists are carried over verbatim from
//! `examples/original_source/providers/{stripe,adyen,paypal,razorpay}_provider.py`;
//! see `DESIGN.md` for the per-provider grounding entry.

mod adyen;
mod paypal;
mod razorpay;
mod stripe;

use std::sync::Arc;

use crate::provider::Provider;

/// Canonical registration order, also the static preference order the
/// `failover` routing strategy uses (`SPEC_FULL.md` §4.4).
pub const REGISTRATION_ORDER: [&str; 4] = ["stripe", "adyen", "paypal", "razorpay"];

/// Builds the fixed four-provider roster the gateway facade registers
/// at startup.
pub fn default_providers() -> Vec<(&'static str, Arc<dyn Provider>)> {
    vec![
        ("stripe", Arc::new(stripe::new()) as Arc<dyn Provider>),
        ("adyen", Arc::new(adyen::new()) as Arc<dyn Provider>),
        ("paypal", Arc::new(paypal::new()) as Arc<dyn Provider>),
        ("razorpay", Arc::new(razorpay::new()) as Arc<dyn Provider>),
    ]
}
