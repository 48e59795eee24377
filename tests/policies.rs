use std::collections::HashMap;

use collatz_orbits::engine::map::collatz_step;
use collatz_orbits::{
    EagerCompaction,
    FreezeInPlace,
    IncompletePolicy,
    Mean,
    OrbitDriver,
    OrbitError,
    OrbitRecord,
    OrbitStore,
    OutputAccumulator,
    RecordStatus,
    TerminationPolicy,
    Value,
};

fn by_seed(records: Vec<OrbitRecord>) -> HashMap<Value, OrbitRecord> {
    records.into_iter().map(|r| (r.seed, r)).collect()
}

/// Walks one orbit directly: (max, sum, steps, reached_one).
fn walk(seed: Value, budget: u64) -> (Value, u128, u64, bool) {
    let (mut v, mut max, mut sum, mut steps) = (seed, seed, seed as u128, 0);
    while v != 1 && steps < budget {
        v = collatz_step(v).unwrap();
        max = max.max(v);
        sum += v as u128;
        steps += 1;
    }
    (max, sum, steps, v == 1)
}

#[test]
fn eager_compaction_small_example() {
    let driver = OrbitDriver::new(3, TerminationPolicy::EagerCompaction, IncompletePolicy::Mark);
    let output = driver.run(1..=4).unwrap();
    let records = by_seed(output.records);

    // Seed 1 terminates before any step.
    let r1 = records[&1];
    assert_eq!((r1.max, r1.length), (1, Some(0)));
    assert!(r1.mean.unwrap().equals_ratio(1, 1));
    assert_eq!(r1.status, RecordStatus::Complete);

    // 2 -> 1
    let r2 = records[&2];
    assert_eq!((r2.max, r2.length), (2, Some(1)));
    assert!(r2.mean.unwrap().equals_ratio(3, 2));
    assert_eq!(r2.mean.unwrap().as_f64(), 1.5);

    // 3 -> 5 -> 8 -> 4: still active when the budget runs out.
    let r3 = records[&3];
    assert_eq!((r3.max, r3.length), (8, Some(3)));
    assert_eq!(r3.status, RecordStatus::Incomplete);
    assert!(r3.mean.unwrap().equals_ratio(20, 4));

    // 4 -> 2 -> 1
    let r4 = records[&4];
    assert_eq!((r4.max, r4.length), (4, Some(2)));
    assert!(r4.mean.unwrap().equals_ratio(7, 3));
    assert_eq!(r4.status, RecordStatus::Complete);

    assert_eq!(output.summary.seeds, 4);
    assert_eq!(output.summary.terminated, 3);
    assert_eq!(output.summary.incomplete, 1);
    assert_eq!(output.summary.dropped, 0);
}

#[test]
fn dropping_incomplete_orbits_is_counted() {
    let driver = OrbitDriver::new(3, TerminationPolicy::EagerCompaction, IncompletePolicy::Drop);
    let output = driver.run(1..=4).unwrap();

    let mut seeds: Vec<Value> = output.records.iter().map(|r| r.seed).collect();
    seeds.sort_unstable();
    assert_eq!(seeds, vec![1, 2, 4]);
    assert_eq!(output.summary.dropped, 1);
    assert_eq!(output.summary.emitted(), 3);
}

#[test]
fn orbit_reaching_one_on_the_last_step_is_complete() {
    // 4 -> 2 -> 1 takes exactly two steps.
    let driver = OrbitDriver::new(2, TerminationPolicy::EagerCompaction, IncompletePolicy::Mark);
    let output = driver.run(4..=4).unwrap();

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.records[0].status, RecordStatus::Complete);
    assert_eq!(output.records[0].length, Some(2));
}

#[test]
fn freeze_in_place_small_example() {
    let driver = OrbitDriver::new(2, TerminationPolicy::FreezeInPlace, IncompletePolicy::Mark);
    let output = driver.run(1..=5).unwrap();

    let mut records = output.records;
    records.sort_by_key(|r| r.seed);

    // max(seed, f(seed), f(f(seed))) with 1 fixed.
    let expected: Vec<Value> = (1..=5)
        .map(|s| {
            let a = collatz_step(s).unwrap();
            let b = collatz_step(a).unwrap();
            s.max(a).max(b)
        })
        .collect();
    let maxima: Vec<Value> = records.iter().map(|r| r.max).collect();
    assert_eq!(maxima, expected);
    assert_eq!(maxima, vec![1, 2, 8, 4, 8]);

    assert!(records.iter().all(|r| r.mean.is_none() && r.length.is_none()));
    assert_eq!(records[0].status, RecordStatus::Complete);
    assert_eq!(records[2].status, RecordStatus::Incomplete);
}

#[test]
fn freeze_in_place_stops_once_everything_is_frozen() {
    let driver = OrbitDriver::new(1_000, TerminationPolicy::FreezeInPlace, IncompletePolicy::Mark);
    let output = driver.run(1..=8).unwrap();

    // 7 needs the most steps of 1..=8 under the shortcut map.
    let longest = (1..=8).map(|s| walk(s, 1_000).2).max().unwrap();
    assert_eq!(output.summary.steps, longest);
    assert_eq!(output.summary.incomplete, 0);
}

#[test]
fn both_policies_agree_on_the_maximum() {
    let budget = 50;
    let eager = OrbitDriver::new(budget, TerminationPolicy::EagerCompaction, IncompletePolicy::Mark)
        .run(1..=2_000)
        .unwrap();
    let frozen = OrbitDriver::new(budget, TerminationPolicy::FreezeInPlace, IncompletePolicy::Mark)
        .run(1..=2_000)
        .unwrap();

    let eager = by_seed(eager.records);
    let frozen = by_seed(frozen.records);
    assert_eq!(eager.len(), 2_000);
    assert_eq!(frozen.len(), 2_000);

    for seed in 1..=2_000 {
        assert_eq!(eager[&seed].max, frozen[&seed].max, "seed {seed}");
        assert_eq!(eager[&seed].status, frozen[&seed].status, "seed {seed}");
    }
}

#[test]
fn statistics_match_direct_summation() {
    let budget = 120;
    let output = OrbitDriver::new(budget, TerminationPolicy::EagerCompaction, IncompletePolicy::Mark)
        .run(1..=5_000)
        .unwrap();

    for record in output.records {
        let (max, sum, steps, reached) = walk(record.seed, budget);
        let mean = record.mean.unwrap();

        assert_eq!(record.max, max, "seed {}", record.seed);
        assert_eq!(record.length, Some(steps), "seed {}", record.seed);
        assert_eq!(mean.sum, sum, "seed {}", record.seed);
        assert_eq!(mean.count, steps + 1, "seed {}", record.seed);
        let expected = if reached { RecordStatus::Complete } else { RecordStatus::Incomplete };
        assert_eq!(record.status, expected, "seed {}", record.seed);
    }
}

#[test]
fn running_max_never_decreases() {
    let mut store = OrbitStore::from_range(1..=3_000).unwrap();
    let strategy = TerminationPolicy::EagerCompaction.strategy(IncompletePolicy::Mark);

    for _ in 0..40 {
        let before: HashMap<Value, Value> =
            store.seeds().iter().copied().zip(store.maxima().iter().copied()).collect();
        strategy.advance(&mut store).unwrap();
        for (seed, max) in store.seeds().iter().zip(store.maxima()) {
            assert!(*max >= before[seed]);
        }
    }
}

#[test]
fn zero_budget_reports_seeds_as_is() {
    let driver = OrbitDriver::new(0, TerminationPolicy::EagerCompaction, IncompletePolicy::Mark);
    let records = by_seed(driver.run(1..=3).unwrap().records);

    assert_eq!(records[&1].status, RecordStatus::Complete);
    assert_eq!(records[&3].status, RecordStatus::Incomplete);
    assert_eq!(records[&3].max, 3);
    assert_eq!(records[&3].length, Some(0));
}

#[test]
fn overflow_reaches_the_driver_under_both_policies() {
    for policy in [TerminationPolicy::EagerCompaction, TerminationPolicy::FreezeInPlace] {
        let driver = OrbitDriver::new(10, policy, IncompletePolicy::Mark);
        let store = OrbitStore::from_seeds([3, Value::MAX]).unwrap();

        let err = driver.run_store(store).unwrap_err();
        assert!(
            matches!(err, OrbitError::ArithmeticOverflow(e) if e.value == Value::MAX),
            "{policy}: {err:?}"
        );
    }
}

#[test]
fn zero_seed_is_rejected_by_the_driver() {
    let driver = OrbitDriver::new(10, TerminationPolicy::EagerCompaction, IncompletePolicy::Mark);
    let err = driver.run(0..=3).unwrap_err();
    assert!(matches!(err, OrbitError::InvalidSeed(e) if e.value == 0));
}

#[test]
fn explicit_strategies_match_policy_built_drivers() {
    let cases: [(Box<dyn collatz_orbits::TerminationStrategy>, TerminationPolicy); 2] = [
        (Box::new(FreezeInPlace), TerminationPolicy::FreezeInPlace),
        (Box::new(EagerCompaction { incomplete: IncompletePolicy::Drop }), TerminationPolicy::EagerCompaction),
    ];

    for (strategy, policy) in cases {
        let custom = OrbitDriver::with_strategy(25, strategy);
        assert_eq!(custom.policy(), policy);

        let built = OrbitDriver::new(25, policy, IncompletePolicy::Drop);
        assert_eq!(custom.run(1..=500).unwrap(), built.run(1..=500).unwrap());
    }
}

#[test]
fn mean_comparison_is_exact_for_large_sums() {
    let big = Mean { sum: 1 << 100, count: 1 };
    assert!(!big.equals_ratio(1 << 100, 1 << 40));
    assert!(big.equals_ratio(1 << 101, 2));

    let mean = Mean { sum: (1 << 120) + 3, count: 3 };
    assert!(mean.equals_ratio((1 << 121) + 6, 6));
    assert!(!mean.equals_ratio((1 << 121) + 7, 6));

    assert!(!Mean { sum: 0, count: 0 }.equals_ratio(0, 1));
    assert!(!Mean { sum: 4, count: 2 }.equals_ratio(2, 0));
}

#[test]
fn eager_compaction_retires_finished_rows_into_the_accumulator() {
    let strategy = TerminationPolicy::EagerCompaction.strategy(IncompletePolicy::Mark);
    let mut out = OutputAccumulator::new();
    assert!(out.is_empty());

    let store = strategy.compact(OrbitStore::from_range(1..=4).unwrap(), &mut out).unwrap();

    assert_eq!(out.len(), 1);
    assert!(!out.is_empty());
    assert_eq!(store.seeds(), &[2, 3, 4]);
    assert_eq!(out.into_records()[0].seed, 1);
}
