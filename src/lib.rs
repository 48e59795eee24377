//! # Collatz Orbits
//!
//! Chunk-parallel engine computing per-seed statistics of Collatz orbits
//! over large, contiguous seed ranges.
//!
//! For every seed in `[1, N]` the engine reports, within a fixed step budget:
//! - the maximum value attained,
//! - the exact mean of the visited values,
//! - the orbit length (map applications until the value reaches 1).
//!
//! ## Design Goals
//! - Column storage with position-aligned attributes
//! - Exact integer arithmetic with overflow detection
//! - Compaction of finished orbits out of the working set
//! - Parallel execution across independent seed chunks
//!
//! ## Quick start
//! ```
//! use collatz_orbits::prelude::*;
//!
//! let driver = OrbitDriver::new(3, TerminationPolicy::EagerCompaction, IncompletePolicy::Mark);
//! let output = driver.run(1..=4).unwrap();
//! assert_eq!(output.summary.terminated, 3);
//! assert_eq!(output.summary.incomplete, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(dead_code)]

pub mod engine;
pub mod config;
pub mod output;
pub mod telemetry;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::types::{
    ChunkID,
    IncompletePolicy,
    Mean,
    MeanSum,
    OrbitRecord,
    OrbitState,
    RecordStatus,
    SeedChunk,
    Step,
    TerminationPolicy,
    Value,
};

pub use engine::map::{apply_map, collatz_step};
pub use engine::reduce::{combine_max, combine_max_into};
pub use engine::storage::{OrbitRow, OrbitStore, RowUpdate};
pub use engine::policy::{EagerCompaction, FreezeInPlace, TerminationStrategy};
pub use engine::driver::{ChunkOutput, OrbitDriver, OutputAccumulator, RunSummary};
pub use engine::scheduler::{ChunkPlan, RecordSink, Scheduler};

pub use engine::error::{
    ArithmeticOverflowError,
    ExecutionError,
    ExecutionResult,
    InvalidSeedError,
    OrbitError,
    OrbitResult,
    PositionOutOfBoundsError,
    ShapeMismatchError,
    WriteError,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used engine types.
///
/// Import with:
/// ```rust
/// use collatz_orbits::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ChunkPlan,
        IncompletePolicy,
        OrbitDriver,
        OrbitRecord,
        OrbitStore,
        RecordSink,
        RecordStatus,
        Scheduler,
        TerminationPolicy,
    };
}
