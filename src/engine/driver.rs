//! The orbit step loop.
//!
//! [`OrbitDriver`] owns the iteration budget and the chosen termination
//! strategy. For one working set it runs:
//!
//! ```text
//! for step in 0..budget:
//!     store = strategy.compact(store)      // retire orbits at 1
//!     if no active orbits: break
//!     strategy.advance(store)              // map + max + mean + length
//! store = strategy.compact(store)          // orbits that hit 1 on the last step
//! strategy.finish(store)                   // flush the rest
//! ```
//!
//! The loop is explicit and bounded by the budget. Step `i + 1` only starts
//! once step `i` has fully materialized, since every statistic update depends
//! on the immediately preceding value.
//!
//! Retired records are appended to an [`OutputAccumulator`]; the driver never
//! formats or writes them.

use std::ops::RangeInclusive;

use tracing::{debug, trace, warn};

use crate::engine::error::OrbitResult;
use crate::engine::policy::TerminationStrategy;
use crate::engine::storage::OrbitStore;
use crate::engine::types::{
    IncompletePolicy,
    OrbitRecord,
    Step,
    TerminationPolicy,
    Value,
};


/// Append-only collection of retired orbit records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputAccumulator {
    records: Vec<OrbitRecord>,
}

impl OutputAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one record.
    pub fn push(&mut self, record: OrbitRecord) {
        self.records.push(record);
    }

    /// Appends every record from `records`.
    pub fn extend<I: IntoIterator<Item = OrbitRecord>>(&mut self, records: I) {
        self.records.extend(records);
    }

    /// Number of records accumulated so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the accumulator, returning its records.
    pub fn into_records(self) -> Vec<OrbitRecord> {
        self.records
    }
}

/// Counters describing one driver run or a merge of several.
///
/// `combine` is associative and commutative, so per-chunk summaries can be
/// merged in any order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Seeds that entered the working set.
    pub seeds: u64,

    /// Orbits that reached 1 within the budget.
    pub terminated: u64,

    /// Orbits still active when the budget ran out.
    pub incomplete: u64,

    /// Incomplete orbits discarded from the output.
    pub dropped: u64,

    /// Map steps executed (maximum over merged runs).
    pub steps: Step,
}

impl RunSummary {
    /// Merges two summaries.
    pub fn combine(self, other: RunSummary) -> RunSummary {
        RunSummary {
            seeds: self.seeds + other.seeds,
            terminated: self.terminated + other.terminated,
            incomplete: self.incomplete + other.incomplete,
            dropped: self.dropped + other.dropped,
            steps: self.steps.max(other.steps),
        }
    }

    /// Number of records that reached the output.
    pub fn emitted(&self) -> u64 {
        self.seeds - self.dropped
    }
}

/// Records and counters produced by one driver run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkOutput {
    /// Retired records in emission order.
    pub records: Vec<OrbitRecord>,

    /// Counters for the run.
    pub summary: RunSummary,
}

/// Runs the bounded step loop over a working set.
pub struct OrbitDriver {
    budget: Step,
    strategy: Box<dyn TerminationStrategy>,
}

impl OrbitDriver {
    /// Creates a driver with `budget` steps and the given policies.
    pub fn new(budget: Step, policy: TerminationPolicy, incomplete: IncompletePolicy) -> Self {
        Self {
            budget,
            strategy: policy.strategy(incomplete),
        }
    }

    /// Creates a driver around an existing strategy object.
    pub fn with_strategy(budget: Step, strategy: Box<dyn TerminationStrategy>) -> Self {
        Self { budget, strategy }
    }

    /// Iteration budget.
    pub fn budget(&self) -> Step {
        self.budget
    }

    /// Policy of the underlying strategy.
    pub fn policy(&self) -> TerminationPolicy {
        self.strategy.policy()
    }

    /// Seeds a working set from `seeds` and runs it to completion.
    pub fn run(&self, seeds: RangeInclusive<Value>) -> OrbitResult<ChunkOutput> {
        let store = OrbitStore::from_range(seeds)?;
        self.run_store(store)
    }

    /// Runs an already-seeded working set to completion.
    pub fn run_store(&self, mut store: OrbitStore) -> OrbitResult<ChunkOutput> {
        store.check_alignment()?;

        let seeds = store.len() as u64;
        let mut out = OutputAccumulator::new();
        let mut steps: Step = 0;

        while steps < self.budget {
            store = self.strategy.compact(store, &mut out)?;

            let active = self.strategy.active_count(&store);
            if active == 0 {
                break;
            }

            self.strategy.advance(&mut store)?;
            steps += 1;
            trace!(step = steps, active, emitted = out.len(), "step complete");
        }

        store = self.strategy.compact(store, &mut out)?;
        let completion = self.strategy.finish(store, &mut out)?;

        let summary = RunSummary {
            seeds,
            terminated: seeds - completion.incomplete,
            incomplete: completion.incomplete,
            dropped: completion.dropped,
            steps,
        };

        if summary.dropped > 0 {
            warn!(
                dropped = summary.dropped,
                budget = self.budget,
                "discarded orbits that did not reach 1 within the budget"
            );
        }
        debug!(
            policy = %self.policy(),
            seeds = summary.seeds,
            terminated = summary.terminated,
            incomplete = summary.incomplete,
            steps = summary.steps,
            "driver finished"
        );

        Ok(ChunkOutput {
            records: out.into_records(),
            summary,
        })
    }
}
