use criterion::*;
use std::hint::black_box;

mod common;
use common::*;

use collatz_orbits::OutputAccumulator;
use collatz_orbits::{IncompletePolicy, TerminationPolicy};

fn compaction_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("compaction");

    group.bench_function("partition_1M", |b| {
        b.iter_batched(
            || seeded_store(SEEDS_MED),
            |store| black_box(store.partition(|v| v % 2 == 0, true)),
            BatchSize::LargeInput,
        );
    });

    group.bench_function("eager_compact_after_8_steps_1M", |b| {
        let strategy = TerminationPolicy::EagerCompaction.strategy(IncompletePolicy::Mark);
        b.iter_batched(
            || {
                let mut store = seeded_store(SEEDS_MED);
                for _ in 0..8 {
                    strategy.advance(&mut store).unwrap();
                }
                store
            },
            |store| {
                let mut out = OutputAccumulator::new();
                let active = strategy.compact(store, &mut out).unwrap();
                black_box((active, out));
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, compaction_benchmark);
criterion_main!(benches);
