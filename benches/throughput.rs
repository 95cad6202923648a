//! Throughput Benchmark for FlashLink
//!
//! This benchmark measures the performance of the link registry
//! under various workloads.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use flashlink::{Registry, RegistryConfig};
use std::sync::Arc;
use std::time::Duration;

const TARGET: &str = "https://example.com/some/fairly/long/path?with=query";

fn populated(links: usize) -> (Registry, Vec<String>) {
    let registry = Registry::new(RegistryConfig::default());
    let aliases = (0..links)
        .map(|i| {
            let target = format!("{}&n={}", TARGET, i % 100);
            registry
                .create(&target, None, Some(3600))
                .expect("fresh registry accepts links")
        })
        .collect();
    (registry, aliases)
}

/// Benchmark SHORTEN operations
fn bench_create(c: &mut Criterion) {
    let registry = Registry::new(RegistryConfig::default());

    let mut group = c.benchmark_group("create");
    group.throughput(Throughput::Elements(1));

    group.bench_function("create_generated_alias", |b| {
        b.iter(|| {
            black_box(registry.create(TARGET, None, Some(3600)).unwrap());
        });
    });

    group.bench_function("create_custom_alias", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let alias = format!("custom-{}", i);
            black_box(registry.create(TARGET, Some(&alias), Some(3600)).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark RESOLVE operations
fn bench_resolve(c: &mut Criterion) {
    let (registry, aliases) = populated(100_000);

    let mut group = c.benchmark_group("resolve");
    group.throughput(Throughput::Elements(1));

    group.bench_function("resolve_existing", |b| {
        let mut i = 0usize;
        b.iter(|| {
            black_box(registry.resolve(&aliases[i % aliases.len()]).unwrap());
            i += 1;
        });
    });

    group.bench_function("resolve_missing", |b| {
        b.iter(|| {
            black_box(registry.resolve("missing").is_err());
        });
    });

    group.bench_function("stats_existing", |b| {
        let mut i = 0usize;
        b.iter(|| {
            black_box(registry.stats(&aliases[i % aliases.len()]).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark mixed workload (80% resolve, 20% create)
fn bench_mixed(c: &mut Criterion) {
    let (registry, aliases) = populated(10_000);

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_resolve_20_create", |b| {
        let mut i = 0usize;
        b.iter(|| {
            if i % 5 == 0 {
                black_box(registry.create(TARGET, None, Some(3600)).unwrap());
            } else {
                black_box(registry.resolve(&aliases[i % aliases.len()]).unwrap());
            }
            i += 1;
        });
    });

    group.bench_function("update_ttl", |b| {
        let mut i = 0usize;
        b.iter(|| {
            registry
                .update(&aliases[i % aliases.len()], None, Some(7200))
                .unwrap();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent access
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let registry = Arc::new(Registry::new(RegistryConfig::default()));
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let registry = Arc::clone(&registry);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let alias = format!("t{}-{}", t, i);
                            registry.create(TARGET, Some(&alias), Some(3600)).unwrap();
                            registry.resolve(&alias).unwrap();
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(registry.len());
        });
    });

    group.finish();
}

/// Benchmark expiry bookkeeping
fn bench_expiry(c: &mut Criterion) {
    let (registry, _aliases) = populated(100_000);

    let mut group = c.benchmark_group("expiry");

    // The common sweeper tick: a large registry with nothing due yet
    group.bench_function("sweep_nothing_due", |b| {
        b.iter(|| {
            black_box(registry.sweep_expired());
        });
    });

    group.bench_function("list_active_100k", |b| {
        b.iter(|| {
            black_box(registry.list_active().len());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_create,
    bench_resolve,
    bench_mixed,
    bench_concurrent,
    bench_expiry,
);

criterion_main!(benches);
