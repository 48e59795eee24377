//! Error types for orbit simulation and chunk execution.
//!
//! This module declares focused, composable error types used across the map
//! applicator, the record store and the driver. Each error carries enough
//! context to make a failure actionable (the offending seed or value, the
//! mismatched lengths) while remaining small and cheap to pass around or
//! convert into the aggregate [`OrbitError`].
//!
//! ## Taxonomy
//! * [`InvalidSeedError`]: a value below 1 reached the map applicator.
//!   Fatal; aborts the run.
//! * [`ArithmeticOverflowError`]: the next orbit value does not fit in
//!   [`Value`]. Fatal for the affected chunk; values never wrap.
//! * [`ShapeMismatchError`] / [`PositionOutOfBoundsError`]: parallel
//!   attribute columns disagree. Always a programming defect.
//!
//! Orbits that outlive the step budget are **not** errors. They are surfaced
//! through [`RecordStatus::Incomplete`](crate::engine::types::RecordStatus)
//! and the run summary.
//!
//! ## Typical flow
//! Low-level operations return the dedicated error types. Orchestration code
//! uses `?` to bubble them into [`OrbitError`], and the scheduler wraps the
//! result in [`ExecutionError`] together with the chunk that failed.
//!
//! ```ignore
//! fn advance(store: &mut OrbitStore) -> OrbitResult<()> {
//!     let StatColumnsMut { values, maxima, .. } = store.stat_columns_mut();
//!     apply_map(values)?;                  // InvalidSeed / Overflow
//!     combine_max_into(maxima, values)?;   // ShapeMismatch
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::engine::types::{ChunkID, Value};


/// Returned when the map applicator receives a value below 1.
///
/// ### Fields
/// * `value`: The offending value (always `0` for unsigned storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid seed {value}: orbit values must be at least 1")]
pub struct InvalidSeedError {
    /// The non-positive value that was supplied.
    pub value: Value,
}

/// Returned when the next orbit value exceeds the numeric representation.
///
/// ### Fields
/// * `value`: The current value whose image could not be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("arithmetic overflow computing (3 * {value} + 1) / 2")]
pub struct ArithmeticOverflowError {
    /// The odd value whose image overflowed.
    pub value: Value,
}

/// Returned when two collections that must be aligned have different lengths.
///
/// ### Fields
/// * `what`: Which pair of collections disagreed.
/// * `expected`: Length of the reference collection.
/// * `actual`: Length of the collection that diverged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("shape mismatch in {what}: expected {expected} elements, got {actual}")]
pub struct ShapeMismatchError {
    /// Human-readable name of the collections being compared.
    pub what: &'static str,

    /// Length of the reference collection.
    pub expected: usize,

    /// Length of the diverging collection.
    pub actual: usize,
}

/// Returned when a row position lies outside the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("row position {position} out of bounds (store holds {len} records)")]
pub struct PositionOutOfBoundsError {
    /// Position that was addressed.
    pub position: usize,

    /// Number of records in the store.
    pub len: usize,
}

/// Aggregate error for orbit simulation.
///
/// `From<T>` conversions are implemented for every low-level error so that
/// callers can write `?` and still return a single, expressive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrbitError {
    /// A value below 1 entered the simulation.
    #[error(transparent)]
    InvalidSeed(#[from] InvalidSeedError),

    /// An orbit value left the representable range.
    #[error(transparent)]
    ArithmeticOverflow(#[from] ArithmeticOverflowError),

    /// Parallel attribute collections disagreed on their length.
    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatchError),

    /// A bulk update addressed a row that does not exist.
    #[error(transparent)]
    Position(#[from] PositionOutOfBoundsError),
}

/// Errors raised while executing a chunk plan.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The driver failed for one chunk; the whole run is aborted.
    #[error("chunk {chunk} failed: {source}")]
    Chunk {
        /// Identifier of the failed chunk.
        chunk: ChunkID,

        /// Underlying simulation error.
        #[source]
        source: OrbitError,
    },

    /// The output sink rejected a chunk's records.
    #[error("chunk {chunk} could not be written: {source}")]
    Sink {
        /// Identifier of the chunk whose records were rejected.
        chunk: ChunkID,

        /// Underlying write error.
        #[source]
        source: WriteError,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Errors raised by output sinks.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Filesystem failure while creating or writing a partition.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// Partition path being written.
        path: String,

        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization failure inside the delimited writer.
    #[error("csv error on {path}: {source}")]
    Csv {
        /// Partition path being written.
        path: String,

        /// Underlying csv error.
        #[source]
        source: csv::Error,
    },

    /// A record did not carry the fields its schema requires.
    #[error("record for seed {seed} is missing field `{field}`")]
    MissingField {
        /// Seed of the malformed record.
        seed: Value,

        /// Name of the missing column.
        field: &'static str,
    },
}

/// Convenient result alias for simulation operations.
pub type OrbitResult<T> = Result<T, OrbitError>;

/// Convenient result alias for chunk execution.
pub type ExecutionResult<T> = Result<T, ExecutionError>;
