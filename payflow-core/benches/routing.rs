//! Router provider-selection micro-benchmark, in the teacher's
//! `criterion::criterion_group!`/`criterion_main!` style
//! (`ultrafast-models-sdk/benches/benchmarks.rs`).

use std::collections::{HashMap, HashSet};

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use payflow_core::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use payflow_core::models::{Currency, RoutingStrategy, Transaction, TransactionType};
use payflow_core::provider::Provider;
use payflow_core::providers::default_providers;
use payflow_core::routing::{RegisteredProvider, Router};

fn bench_select(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let providers = default_providers();
    let mut breakers = HashMap::new();
    for (name, _) in &providers {
        breakers.insert(name.to_string(), CircuitBreaker::new(*name, CircuitBreakerConfig::default()));
    }
    let registry: Vec<RegisteredProvider> = providers
        .iter()
        .map(|(n, p)| RegisteredProvider { name: n, provider: p.as_ref(), breaker: &breakers[*n] })
        .collect();
    let router = Router::new();
    let tx = Transaction::new(100.0, Currency::Usd, TransactionType::Payment, None, None, None, None);

    for strategy in [
        RoutingStrategy::HealthBased,
        RoutingStrategy::RoundRobin,
        RoutingStrategy::Failover,
        RoutingStrategy::CostOptimized,
    ] {
        let label = format!("router_select_{strategy:?}");
        c.bench_function(&label, |b| {
            b.iter(|| {
                rt.block_on(router.select(black_box(strategy), black_box(&tx), &registry, &HashSet::new()))
            });
        });
    }
}

criterion_group!(benches, bench_select);
criterion_main!(benches);
