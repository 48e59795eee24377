//! Termination and compaction strategies.
//!
//! A strategy decides, once per step, which orbits have reached the fixed
//! point and what happens to them, and how the remaining orbits advance.
//! Two strategies exist behind the [`TerminationStrategy`] trait:
//!
//! * [`FreezeInPlace`]: nothing is removed. Terminated rows are marked and
//!   skipped by the map step, so their running maximum can no longer change.
//!   Only `seed` and `max` are tracked. Orbits still active at the end report
//!   their in-progress maximum, a lower bound on the true orbit maximum.
//!
//! * [`EagerCompaction`]: at the start of each step the working set is
//!   partitioned by `value == 1`; the terminated partition is emitted with its
//!   final `max`, `mean` and `length` and dropped from further computation.
//!   Orbits still active at the end are handled per [`IncompletePolicy`].
//!
//! [`TerminationPolicy`] is the tagged choice that selects one of them.
//!
//! ## Per-record state machine
//! `Active -> Terminated` on detecting `value == 1`. `Terminated` is absorbing.

use tracing::trace;

use crate::engine::driver::OutputAccumulator;
use crate::engine::error::OrbitResult;
use crate::engine::map::{apply_map, map_values};
use crate::engine::reduce::{
    accumulate_sum,
    combine_max,
    combine_max_into,
    count_where,
    increment_lengths,
};
use crate::engine::storage::{OrbitStore, RowUpdate, StatColumnsMut};
use crate::engine::types::{
    IncompletePolicy,
    OrbitState,
    RecordStatus,
    TerminationPolicy,
    Value,
    FIXED_POINT,
};


/// Counts produced when a strategy flushes its working set at budget end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Completion {
    /// Orbits that never reached 1 within the budget.
    pub incomplete: u64,

    /// Incomplete orbits whose statistics were discarded.
    pub dropped: u64,
}

/// Behaviour shared by every termination policy.
///
/// The driver calls, in order: `compact` then `advance` once per step while
/// `active_count` is non-zero, then `compact` and `finish` once after the
/// loop.
pub trait TerminationStrategy: Send + Sync {
    /// The policy this strategy implements.
    fn policy(&self) -> TerminationPolicy;

    /// Detects orbits at the fixed point and retires them.
    ///
    /// Returns the working set that continues to the next step.
    fn compact(&self, store: OrbitStore, out: &mut OutputAccumulator) -> OrbitResult<OrbitStore>;

    /// Number of orbits that still need map applications.
    fn active_count(&self, store: &OrbitStore) -> usize;

    /// Applies one map step to every active orbit and updates its statistics.
    fn advance(&self, store: &mut OrbitStore) -> OrbitResult<()>;

    /// Emits whatever remains once the budget is exhausted.
    fn finish(&self, store: OrbitStore, out: &mut OutputAccumulator) -> OrbitResult<Completion>;
}

impl TerminationPolicy {
    /// Builds the strategy object for this policy.
    pub fn strategy(self, incomplete: IncompletePolicy) -> Box<dyn TerminationStrategy> {
        match self {
            TerminationPolicy::FreezeInPlace => Box::new(FreezeInPlace),
            TerminationPolicy::EagerCompaction => Box::new(EagerCompaction { incomplete }),
        }
    }
}

#[inline]
fn at_fixed_point(v: Value) -> bool {
    v == FIXED_POINT
}

/// Keeps every record in the working set; terminated rows become no-ops.
#[derive(Clone, Copy, Debug, Default)]
pub struct FreezeInPlace;

impl TerminationStrategy for FreezeInPlace {
    fn policy(&self) -> TerminationPolicy {
        TerminationPolicy::FreezeInPlace
    }

    fn compact(&self, mut store: OrbitStore, _out: &mut OutputAccumulator) -> OrbitResult<OrbitStore> {
        let frozen = store.mark_terminated(at_fixed_point);
        trace!(frozen, "froze orbits at the fixed point");
        Ok(store)
    }

    fn active_count(&self, store: &OrbitStore) -> usize {
        count_where(store.states(), |s| s.is_active())
    }

    fn advance(&self, store: &mut OrbitStore) -> OrbitResult<()> {
        let positions = store.active_positions();
        if positions.is_empty() {
            return Ok(());
        }

        let current: Vec<Value> = positions.iter().map(|&p| store.values()[p]).collect();
        let prior_max: Vec<Value> = positions.iter().map(|&p| store.maxima()[p]).collect();

        let next = map_values(&current)?;
        let max = combine_max(&prior_max, &next)?;

        let updates: Vec<RowUpdate> = positions
            .iter()
            .zip(next.iter().zip(&max))
            .map(|(&p, (&value, &max))| RowUpdate {
                value,
                max,
                sum: store.sums()[p],
                length: store.lengths()[p],
            })
            .collect();

        store.overwrite(&positions, &updates)
    }

    fn finish(&self, store: OrbitStore, out: &mut OutputAccumulator) -> OrbitResult<Completion> {
        let mut incomplete = 0;
        for row in store.rows() {
            let status = match row.state {
                OrbitState::Terminated => RecordStatus::Complete,
                OrbitState::Active => {
                    incomplete += 1;
                    RecordStatus::Incomplete
                }
            };
            out.push(row.max_record(status));
        }
        Ok(Completion { incomplete, dropped: 0 })
    }
}

/// Emits and removes terminated records at the start of every step.
#[derive(Clone, Copy, Debug, Default)]
pub struct EagerCompaction {
    /// Treatment of orbits still active at budget exhaustion.
    pub incomplete: IncompletePolicy,
}

impl TerminationStrategy for EagerCompaction {
    fn policy(&self) -> TerminationPolicy {
        TerminationPolicy::EagerCompaction
    }

    fn compact(&self, store: OrbitStore, out: &mut OutputAccumulator) -> OrbitResult<OrbitStore> {
        let (terminated, active) = store.partition(at_fixed_point, true);
        terminated.check_alignment()?;
        active.check_alignment()?;

        trace!(
            emitted = terminated.len(),
            active = active.len(),
            "compacted working set"
        );
        out.extend(terminated.rows().map(|row| row.full_record(RecordStatus::Complete)));
        Ok(active)
    }

    fn active_count(&self, store: &OrbitStore) -> usize {
        store.len()
    }

    fn advance(&self, store: &mut OrbitStore) -> OrbitResult<()> {
        let StatColumnsMut { values, maxima, sums, lengths } = store.stat_columns_mut();
        apply_map(values)?;
        combine_max_into(maxima, values)?;
        accumulate_sum(sums, values)?;
        increment_lengths(lengths);
        Ok(())
    }

    fn finish(&self, store: OrbitStore, out: &mut OutputAccumulator) -> OrbitResult<Completion> {
        let incomplete = store.len() as u64;
        match self.incomplete {
            IncompletePolicy::Mark => {
                out.extend(store.rows().map(|row| row.full_record(RecordStatus::Incomplete)));
                Ok(Completion { incomplete, dropped: 0 })
            }
            IncompletePolicy::Drop => Ok(Completion { incomplete, dropped: incomplete }),
        }
    }
}
