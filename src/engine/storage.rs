//! Column-oriented storage for the orbit working set.
//!
//! [`OrbitStore`] keeps every orbit attribute in its own dense column:
//!
//! ```text
//! seeds   | values | maxima | sums | lengths | states
//! --------+--------+--------+------+---------+-------
//!    3    |   5    |   5    |  8   |    1    | Active
//!    4    |   2    |   4    |  6   |    1    | Active
//! ```
//!
//! Row `i` of every column describes the same logical orbit. All mutating
//! operations either touch every column in lockstep (construction,
//! partitioning) or address rows by position (bulk overwrite), so alignment
//! is preserved by construction. [`OrbitStore::check_alignment`] verifies it.
//!
//! # Core operations
//!
//! - **Initialize**: [`OrbitStore::from_range`] / [`OrbitStore::from_seeds`]
//!   create one active record per seed.
//! - **Read**: typed column accessors return slices.
//! - **Overwrite**: [`OrbitStore::overwrite`] replaces value, max, sum and
//!   length for a subset of rows.
//! - **Partition**: [`OrbitStore::partition`] splits the store into two
//!   disjoint stores by a predicate over `value`, keeping every column
//!   aligned and preserving row order.
//!
//! Partitioning never loses or duplicates a record: the seed sets of both
//! outputs are disjoint and their union is the input seed set.

use std::ops::RangeInclusive;

use rayon::prelude::*;

use crate::engine::error::{
    InvalidSeedError,
    OrbitResult,
    PositionOutOfBoundsError,
    ShapeMismatchError,
};
use crate::engine::types::{
    Mean,
    MeanSum,
    OrbitRecord,
    OrbitState,
    RecordStatus,
    Step,
    Value,
    CHUNK_CAP,
};


/// Replacement statistics for a single row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowUpdate {
    /// New current value.
    pub value: Value,

    /// New running maximum.
    pub max: Value,

    /// New running sum.
    pub sum: MeanSum,

    /// New step count.
    pub length: Step,
}

/// Borrowed view of one row across every column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrbitRow {
    /// Seed identity.
    pub seed: Value,

    /// Current position of the orbit.
    pub value: Value,

    /// Largest value seen so far.
    pub max: Value,

    /// Sum of every visited value.
    pub sum: MeanSum,

    /// Map applications performed so far.
    pub length: Step,

    /// Lifecycle state.
    pub state: OrbitState,
}

impl OrbitRow {
    /// Exact mean of the visited values; the seed counts as the first one.
    pub fn mean(&self) -> Mean {
        Mean { sum: self.sum, count: self.length + 1 }
    }

    /// Builds the full output record (max, mean and length).
    pub fn full_record(&self, status: RecordStatus) -> OrbitRecord {
        OrbitRecord {
            seed: self.seed,
            max: self.max,
            mean: Some(self.mean()),
            length: Some(self.length),
            status,
        }
    }

    /// Builds the reduced output record (max only).
    pub fn max_record(&self, status: RecordStatus) -> OrbitRecord {
        OrbitRecord {
            seed: self.seed,
            max: self.max,
            mean: None,
            length: None,
            status,
        }
    }
}

/// Dense, position-aligned columns for a working set of orbits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrbitStore {
    seeds: Vec<Value>,
    values: Vec<Value>,
    maxima: Vec<Value>,
    sums: Vec<MeanSum>,
    lengths: Vec<Step>,
    states: Vec<OrbitState>,
}

impl OrbitStore {
    /// Creates one active record per seed in `range`.
    ///
    /// ## Errors
    /// [`InvalidSeedError`] if the range contains 0.
    pub fn from_range(range: RangeInclusive<Value>) -> OrbitResult<Self> {
        if !range.is_empty() && *range.start() == 0 {
            return Err(InvalidSeedError { value: 0 }.into());
        }

        let seeds: Vec<Value> = range.into_par_iter().collect();
        Ok(Self::from_seed_column(seeds))
    }

    /// Creates one active record per seed, in iteration order.
    ///
    /// ## Errors
    /// [`InvalidSeedError`] if any seed is 0.
    pub fn from_seeds<I>(seeds: I) -> OrbitResult<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let seeds: Vec<Value> = seeds.into_iter().collect();
        if let Some(&value) = seeds.iter().find(|&&s| s == 0) {
            return Err(InvalidSeedError { value }.into());
        }
        Ok(Self::from_seed_column(seeds))
    }

    fn from_seed_column(seeds: Vec<Value>) -> Self {
        let n = seeds.len();
        Self {
            values: seeds.clone(),
            maxima: seeds.clone(),
            sums: seeds.par_iter().map(|&s| s as MeanSum).collect(),
            lengths: vec![0; n],
            states: vec![OrbitState::Active; n],
            seeds,
        }
    }

    /// Number of records in the store.
    #[inline]
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// Returns `true` if the store holds no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Seed column.
    pub fn seeds(&self) -> &[Value] { &self.seeds }

    /// Current value column.
    pub fn values(&self) -> &[Value] { &self.values }

    /// Running maximum column.
    pub fn maxima(&self) -> &[Value] { &self.maxima }

    /// Running sum column.
    pub fn sums(&self) -> &[MeanSum] { &self.sums }

    /// Step count column.
    pub fn lengths(&self) -> &[Step] { &self.lengths }

    /// Lifecycle state column.
    pub fn states(&self) -> &[OrbitState] { &self.states }

    /// Mutable access to the statistic columns in one borrow.
    ///
    /// The seed column is never exposed mutably: it is the record identity.
    pub fn stat_columns_mut(&mut self) -> StatColumnsMut<'_> {
        StatColumnsMut {
            values: &mut self.values,
            maxima: &mut self.maxima,
            sums: &mut self.sums,
            lengths: &mut self.lengths,
        }
    }

    /// Reads row `position` across every column.
    pub fn row(&self, position: usize) -> Option<OrbitRow> {
        if position >= self.len() {
            return None;
        }
        Some(OrbitRow {
            seed: self.seeds[position],
            value: self.values[position],
            max: self.maxima[position],
            sum: self.sums[position],
            length: self.lengths[position],
            state: self.states[position],
        })
    }

    /// Iterates over every row in storage order.
    pub fn rows(&self) -> impl Iterator<Item = OrbitRow> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    /// Replaces value, max, sum and length for the rows in `positions`.
    ///
    /// Rows whose state is [`OrbitState::Terminated`] are frozen and are left
    /// untouched. Positions are validated before any row is written.
    ///
    /// ## Errors
    /// * [`ShapeMismatchError`] if `positions` and `updates` differ in length.
    /// * [`PositionOutOfBoundsError`] for any position `>= len()`.
    pub fn overwrite(&mut self, positions: &[usize], updates: &[RowUpdate]) -> OrbitResult<()> {
        if positions.len() != updates.len() {
            return Err(ShapeMismatchError {
                what: "overwrite positions and updates",
                expected: positions.len(),
                actual: updates.len(),
            }
            .into());
        }

        let len = self.len();
        if let Some(&position) = positions.iter().find(|&&p| p >= len) {
            return Err(PositionOutOfBoundsError { position, len }.into());
        }

        for (&p, update) in positions.iter().zip(updates) {
            if !self.states[p].is_active() {
                continue;
            }
            self.values[p] = update.value;
            self.maxima[p] = update.max;
            self.sums[p] = update.sum;
            self.lengths[p] = update.length;
        }
        Ok(())
    }

    /// Marks every active row whose value satisfies `predicate` as terminated.
    ///
    /// Returns the number of rows that changed state.
    pub fn mark_terminated<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(Value) -> bool + Sync + Send,
    {
        self.states
            .par_chunks_mut(CHUNK_CAP)
            .zip(self.values.par_chunks(CHUNK_CAP))
            .map(|(states, values)| {
                let mut changed = 0;
                for (state, &v) in states.iter_mut().zip(values) {
                    if state.is_active() && predicate(v) {
                        *state = OrbitState::Terminated;
                        changed += 1;
                    }
                }
                changed
            })
            .sum()
    }

    /// Positions of every row still in [`OrbitState::Active`].
    pub fn active_positions(&self) -> Vec<usize> {
        self.states
            .par_iter()
            .enumerate()
            .filter(|(_, s)| s.is_active())
            .map(|(i, _)| i)
            .collect()
    }

    /// Splits the store into `(matched, rest)` by a predicate over `value`.
    ///
    /// Rows keep their relative order inside each output. Rows in `matched`
    /// are marked [`OrbitState::Terminated`] when `terminate_matched` is set.
    pub fn partition<P>(self, predicate: P, terminate_matched: bool) -> (OrbitStore, OrbitStore)
    where
        P: Fn(Value) -> bool,
    {
        let mask: Vec<bool> = self.values.iter().map(|&v| predicate(v)).collect();
        let hits = mask.iter().filter(|&&m| m).count();

        let mut matched = OrbitStore::with_capacity(hits);
        let mut rest = OrbitStore::with_capacity(self.len() - hits);

        let OrbitStore { seeds, values, maxima, sums, lengths, states } = self;
        let rows = seeds
            .into_iter()
            .zip(values)
            .zip(maxima)
            .zip(sums)
            .zip(lengths)
            .zip(states)
            .zip(mask);

        for ((((((seed, value), max), sum), length), state), hit) in rows {
            if hit {
                let state = if terminate_matched { OrbitState::Terminated } else { state };
                matched.push_row(seed, value, max, sum, length, state);
            } else {
                rest.push_row(seed, value, max, sum, length, state);
            }
        }

        (matched, rest)
    }

    /// Verifies that every column has the same number of rows.
    pub fn check_alignment(&self) -> Result<(), ShapeMismatchError> {
        let expected = self.seeds.len();
        let columns = [
            ("value column", self.values.len()),
            ("max column", self.maxima.len()),
            ("sum column", self.sums.len()),
            ("length column", self.lengths.len()),
            ("state column", self.states.len()),
        ];
        for (what, actual) in columns {
            if actual != expected {
                return Err(ShapeMismatchError { what, expected, actual });
            }
        }
        Ok(())
    }

    fn with_capacity(n: usize) -> Self {
        Self {
            seeds: Vec::with_capacity(n),
            values: Vec::with_capacity(n),
            maxima: Vec::with_capacity(n),
            sums: Vec::with_capacity(n),
            lengths: Vec::with_capacity(n),
            states: Vec::with_capacity(n),
        }
    }

    fn push_row(
        &mut self,
        seed: Value,
        value: Value,
        max: Value,
        sum: MeanSum,
        length: Step,
        state: OrbitState,
    ) {
        self.seeds.push(seed);
        self.values.push(value);
        self.maxima.push(max);
        self.sums.push(sum);
        self.lengths.push(length);
        self.states.push(state);
    }
}

/// Simultaneous mutable borrows of the statistic columns.
pub struct StatColumnsMut<'a> {
    /// Current values.
    pub values: &'a mut [Value],

    /// Running maxima.
    pub maxima: &'a mut [Value],

    /// Running sums.
    pub sums: &'a mut [MeanSum],

    /// Step counts.
    pub lengths: &'a mut [Step],
}
