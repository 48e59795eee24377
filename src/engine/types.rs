//! Core Orbit Types, Identifiers, and Layout Constants
//!
//! This module defines the **fundamental numeric types, identifiers and
//! tagged choices** shared by every other part of the engine: the map
//! applicator, the record store, the termination strategies, the driver and
//! the chunk scheduler.
//!
//! ## Numeric Representation
//!
//! Orbit values are exact unsigned integers:
//!
//! - [`Value`] holds seeds, current values and running maxima,
//! - [`MeanSum`] holds the running sum behind the exact mean,
//! - [`Step`] counts map applications.
//!
//! No floating-point arithmetic is used while an orbit is advanced. The only
//! conversion to `f64` happens when a mean is rendered for output.
//!
//! ## Chunked Iteration
//!
//! Column passes are split into slices of [`CHUNK_CAP`] rows so that Rayon
//! workers receive cache-sized, disjoint pieces of every attribute column.
//!
//! ## Record Lifecycle
//!
//! ```text
//! Active ──(value == 1)──> Terminated
//! ```
//!
//! [`OrbitState::Terminated`] is absorbing; no other transition exists.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Deserialize;


/// Orbit value: seeds, current positions and running maxima.
pub type Value = u64;

/// Running sum of every value an orbit has visited.
///
/// A `u128` sum of up to `u64::MAX` values of size `u64::MAX` cannot overflow,
/// so the mean stays exact for any realistic step budget.
pub type MeanSum = u128;

/// Number of map applications performed.
pub type Step = u64;

/// Identifier of an independently processed seed sub-range.
///
/// As wide as [`Value`]: a plan never holds more chunks than seeds.
pub type ChunkID = u64;

/// Number of rows processed by a single parallel job inside a column pass.
pub const CHUNK_CAP: usize = 16 * 1024;

/// The fixed point every orbit is expected to reach.
pub const FIXED_POINT: Value = 1;

/// Lifecycle state of a single orbit record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum OrbitState {
    /// The orbit has not reached the fixed point yet.
    #[default]
    Active,

    /// The orbit reached the fixed point; all fields are frozen.
    Terminated,
}

impl OrbitState {
    /// Returns `true` for [`OrbitState::Active`].
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, OrbitState::Active)
    }
}

/// Tagged choice between the two supported termination strategies.
///
/// ## Variants
/// * `FreezeInPlace`: every record stays in the working set for the whole
///   budget; terminated orbits are skipped by the map step. Only `seed` and
///   `max` are reported.
/// * `EagerCompaction`: terminated records are emitted and removed from the
///   working set at the start of every step. `seed`, `max`, `mean` and
///   `length` are reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationPolicy {
    /// Keep terminated orbits in place and treat them as no-ops.
    FreezeInPlace,

    /// Remove terminated orbits as soon as they are detected.
    #[default]
    EagerCompaction,
}

impl fmt::Display for TerminationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationPolicy::FreezeInPlace => f.write_str("freeze-in-place"),
            TerminationPolicy::EagerCompaction => f.write_str("eager-compaction"),
        }
    }
}

/// What to do with orbits that are still active when the budget runs out.
///
/// Only meaningful under [`TerminationPolicy::EagerCompaction`]; frozen
/// orbits always report their in-progress maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum IncompletePolicy {
    /// Emit the partial statistics with [`RecordStatus::Incomplete`].
    #[default]
    Mark,

    /// Discard the partial statistics; the count is still reported.
    Drop,
}

impl fmt::Display for IncompletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncompletePolicy::Mark => f.write_str("mark"),
            IncompletePolicy::Drop => f.write_str("drop"),
        }
    }
}

/// Completeness marker attached to every emitted record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordStatus {
    /// The orbit reached 1; its statistics are final.
    Complete,

    /// The budget ran out first; statistics cover only the steps taken.
    Incomplete,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Complete => f.write_str("complete"),
            RecordStatus::Incomplete => f.write_str("incomplete"),
        }
    }
}

/// Exact arithmetic mean of the values an orbit has visited.
///
/// Stored as the running `sum` and the number of observations `count`. The
/// seed is the first observation, so after `k` map applications
/// `count == k + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mean {
    /// Sum of all visited values.
    pub sum: MeanSum,

    /// Number of visited values, including the seed.
    pub count: u64,
}

impl Mean {
    /// Returns the mean as a floating-point number for reporting.
    pub fn as_f64(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum as f64 / self.count as f64
    }

    /// Returns `true` when the mean equals `numerator / denominator` exactly.
    ///
    /// Compares quotients and then the reciprocals of the remainders, so no
    /// intermediate product is formed. A zero count or denominator never
    /// matches.
    pub fn equals_ratio(&self, numerator: MeanSum, denominator: u64) -> bool {
        if self.count == 0 || denominator == 0 {
            return false;
        }
        let (mut a, mut b) = (self.sum, MeanSum::from(self.count));
        let (mut c, mut d) = (numerator, MeanSum::from(denominator));
        loop {
            if a / b != c / d {
                return false;
            }
            match (a % b, c % d) {
                (0, 0) => return true,
                (0, _) | (_, 0) => return false,
                (ra, rc) => (a, b, c, d) = (b, ra, d, rc),
            }
        }
    }
}

/// Final statistics of one seed, handed to the output sink.
///
/// `mean` and `length` are `None` under freeze-in-place, which tracks only
/// the running maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrbitRecord {
    /// Starting value of the orbit.
    pub seed: Value,

    /// Largest value observed.
    pub max: Value,

    /// Exact mean of the visited values.
    pub mean: Option<Mean>,

    /// Number of map applications performed.
    pub length: Option<Step>,

    /// Whether the statistics are final.
    pub status: RecordStatus,
}

/// Contiguous, inclusive seed sub-range processed as one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedChunk {
    /// Position of the chunk in its plan.
    pub id: ChunkID,

    /// Seeds covered by the chunk.
    pub range: RangeInclusive<Value>,
}

impl SeedChunk {
    /// Number of seeds in the chunk.
    pub fn len(&self) -> u64 {
        if self.range.is_empty() {
            0
        } else {
            self.range.end() - self.range.start() + 1
        }
    }

    /// Returns `true` if the chunk covers no seeds.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}
