//! Benchmark: claim throughput of the two distribution strategies.
//!
//! Measures full-pass drain time for a single worker and under contention,
//! to quantify what the claim tree buys at higher worker counts.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::thread;

use pardist::{DistributionStrategy, DistributorConfig, IndexDistributor};

const MAX_COUNT: usize = 100_000;

fn drain(config: &DistributorConfig, count: usize, workers: usize) {
    let distributor = IndexDistributor::with_config(count, config);
    thread::scope(|s| {
        for _ in 0..workers {
            let distributor = &distributor;
            s.spawn(move || {
                distributor.do_indices(|index| {
                    black_box(index);
                });
            });
        }
    });
}

fn bench_single_worker(c: &mut Criterion) {
    let sequential = DistributorConfig::with_strategy(DistributionStrategy::Sequential);
    let tree = DistributorConfig::with_strategy(DistributionStrategy::ClaimTree);
    let count = IndexDistributor::get_count_with(MAX_COUNT, &tree);

    c.bench_function("sequential_drain_1_worker", |b| {
        b.iter(|| drain(&sequential, count, 1));
    });
    c.bench_function("claim_tree_drain_1_worker", |b| {
        b.iter(|| drain(&tree, count, 1));
    });
}

fn bench_contended(c: &mut Criterion) {
    let sequential = DistributorConfig::with_strategy(DistributionStrategy::Sequential);
    let tree = DistributorConfig::with_strategy(DistributionStrategy::ClaimTree);
    let count = IndexDistributor::get_count_with(MAX_COUNT, &tree);

    c.bench_function("sequential_drain_8_workers", |b| {
        b.iter(|| drain(&sequential, count, 8));
    });
    c.bench_function("claim_tree_drain_8_workers", |b| {
        b.iter(|| drain(&tree, count, 8));
    });
}

criterion_group!(benches, bench_single_worker, bench_contended);
criterion_main!(benches);
