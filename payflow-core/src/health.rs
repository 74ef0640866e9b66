//! Per-provider health counters (`SPEC_FULL.md` §4.3), broken down by
//! card network, payment method, and region.
//!
//! Grounded on `examples/original_source/providers/base.py`'s
//! `request_count`/`failure_count`/per-dimension stats dicts, and on the
//! teacher's `ProviderMetrics` (`providers/mod.rs`) for the Rust shape of
//! a counters-plus-derived-ratios struct.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

#[derive(Debug, Default, Clone)]
struct DimensionCounters {
    requests: u64,
    failures: u64,
    total_time: f64,
}

impl DimensionCounters {
    fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            1.0
        } else {
            (self.requests - self.failures) as f64 / self.requests as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    total: DimensionCounters,
    by_network: HashMap<String, DimensionCounters>,
    by_method: HashMap<String, DimensionCounters>,
    by_region: HashMap<String, DimensionCounters>,
    last_checked: Option<DateTime<Utc>>,
}

/// Sits inside each provider; serialized access to a single mutex
/// satisfies the `SPEC_FULL.md` §5 requirement that `health()` observe
/// a consistent snapshot (`requests >= failures` always holds).
pub struct HealthTracker {
    counters: Mutex<Counters>,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Records the outcome of one processed attempt. `network`/`method`/
    /// `region` are the dimension keys the attempt should be attributed
    /// to; any of them may be absent for instrument-less transactions.
    pub fn record(
        &self,
        succeeded: bool,
        processing_time: f64,
        network: Option<&str>,
        method: Option<&str>,
        region: Option<&str>,
    ) {
        let mut guard = self.counters.lock().expect("health tracker mutex poisoned");
        Self::bump(&mut guard.total, succeeded, processing_time);
        if let Some(network) = network {
            Self::bump(
                guard.by_network.entry(network.to_string()).or_default(),
                succeeded,
                processing_time,
            );
        }
        if let Some(method) = method {
            Self::bump(
                guard.by_method.entry(method.to_string()).or_default(),
                succeeded,
                processing_time,
            );
        }
        if let Some(region) = region {
            Self::bump(
                guard.by_region.entry(region.to_string()).or_default(),
                succeeded,
                processing_time,
            );
        }
        guard.last_checked = Some(Utc::now());
    }

    fn bump(counters: &mut DimensionCounters, succeeded: bool, processing_time: f64) {
        counters.requests += 1;
        if !succeeded {
            counters.failures += 1;
        }
        counters.total_time += processing_time;
    }

    /// `overall_success_rate = (requests - failures) / requests` when
    /// `requests > 0`, else `1.0` (an untested provider is optimistically
    /// healthy, matching `examples/original_source`).
    pub fn overall_success_rate(&self) -> f64 {
        self.counters
            .lock()
            .expect("health tracker mutex poisoned")
            .total
            .success_rate()
    }

    pub fn avg_latency_ms(&self, base_latency_ms: f64) -> f64 {
        let guard = self.counters.lock().expect("health tracker mutex poisoned");
        if guard.total.requests == 0 {
            base_latency_ms
        } else {
            (guard.total.total_time / guard.total.requests as f64) * 1000.0
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.counters.lock().expect("health tracker mutex poisoned").total.requests
    }

    pub fn total_failures(&self) -> u64 {
        self.counters.lock().expect("health tracker mutex poisoned").total.failures
    }

    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.counters.lock().expect("health tracker mutex poisoned").last_checked
    }

    pub fn success_rate_by_network(&self) -> HashMap<String, f64> {
        self.counters
            .lock()
            .expect("health tracker mutex poisoned")
            .by_network
            .iter()
            .map(|(k, v)| (k.clone(), v.success_rate()))
            .collect()
    }

    pub fn success_rate_by_method(&self) -> HashMap<String, f64> {
        self.counters
            .lock()
            .expect("health tracker mutex poisoned")
            .by_method
            .iter()
            .map(|(k, v)| (k.clone(), v.success_rate()))
            .collect()
    }

    pub fn success_rate_by_region(&self) -> HashMap<String, f64> {
        self.counters
            .lock()
            .expect("health tracker mutex poisoned")
            .by_region
            .iter()
            .map(|(k, v)| (k.clone(), v.success_rate()))
            .collect()
    }
}
