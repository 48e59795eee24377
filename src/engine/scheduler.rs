//! Chunk planning and parallel execution.
//!
//! This module is responsible for:
//! * splitting the seed range `[1, N]` into contiguous, disjoint chunks,
//! * running one independent [`OrbitDriver`] per chunk on the Rayon pool,
//! * handing each chunk's records to a [`RecordSink`],
//! * merging per-chunk [`RunSummary`] values.
//!
//! ## Execution model
//!
//! Chunks share no mutable state: each owns its seed range and its record
//! store. Within a chunk the step loop is strictly sequential; across chunks
//! execution is fully parallel. The only merge point is the summary, whose
//! `combine` is associative, so completion order does not matter.
//!
//! The first failing chunk aborts the run. Its identifier is reported in the
//! resulting [`ExecutionError`].

use rayon::prelude::*;
use tracing::{debug, info, info_span};

use crate::engine::driver::{OrbitDriver, RunSummary};
use crate::engine::error::{ExecutionError, ExecutionResult, WriteError};
use crate::engine::types::{ChunkID, OrbitRecord, SeedChunk, Value};


/// Destination for the records produced by each chunk.
///
/// Implementations must be `Send + Sync`: chunks finish on worker threads
/// and call [`RecordSink::accept`] concurrently.
pub trait RecordSink: Send + Sync {
    /// Receives the complete record set of one chunk.
    fn accept(&self, chunk: &SeedChunk, records: &[OrbitRecord]) -> Result<(), WriteError>;
}

/// Partition of a seed range into contiguous chunks.
///
/// ## Invariants of [`ChunkPlan::new`]
/// * chunks are disjoint and ordered by id,
/// * their union is exactly `[1, N]`,
/// * every chunk but the last holds `chunk_size` seeds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkPlan {
    chunks: Vec<SeedChunk>,
}

impl ChunkPlan {
    /// Splits `[1, num_elements]` into chunks of at most `chunk_size` seeds.
    ///
    /// A zero `num_elements` yields an empty plan; a zero `chunk_size` is
    /// treated as one chunk covering the whole range.
    pub fn new(num_elements: Value, chunk_size: Value) -> Self {
        let size = if chunk_size == 0 { num_elements.max(1) } else { chunk_size };

        let mut chunks = Vec::new();
        let mut start: Value = 1;
        let mut id: ChunkID = 0;
        while num_elements > 0 && start <= num_elements {
            let end = start.saturating_add(size - 1).min(num_elements);
            chunks.push(SeedChunk { id, range: start..=end });
            id += 1;
            if end == num_elements {
                break;
            }
            start = end + 1;
        }
        Self { chunks }
    }

    /// Builds a plan from explicit chunks, kept in the given order.
    ///
    /// The plan covers exactly the seeds of `chunks`; none of the `[1, N]`
    /// invariants of [`ChunkPlan::new`] are enforced.
    pub fn from_chunks(chunks: Vec<SeedChunk>) -> Self {
        Self { chunks }
    }

    /// Chunks in plan order.
    pub fn chunks(&self) -> &[SeedChunk] {
        &self.chunks
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` if the plan covers no seeds.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total number of seeds covered.
    pub fn seeds(&self) -> u64 {
        self.chunks.iter().map(SeedChunk::len).sum()
    }
}

/// Runs a [`ChunkPlan`] with one driver per chunk.
pub struct Scheduler {
    driver: OrbitDriver,
    threads: Option<usize>,
}

impl Scheduler {
    /// Creates a scheduler that runs every chunk with `driver`.
    pub fn new(driver: OrbitDriver) -> Self {
        Self { driver, threads: None }
    }

    /// Bounds the worker pool to `threads` threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Executes every chunk in `plan`, delivering records to `sink`.
    ///
    /// ## Errors
    /// * [`ExecutionError::Chunk`] if a driver fails,
    /// * [`ExecutionError::Sink`] if the sink rejects a chunk,
    /// * [`ExecutionError::ThreadPool`] if a bounded pool cannot be built.
    pub fn run(&self, plan: &ChunkPlan, sink: &dyn RecordSink) -> ExecutionResult<RunSummary> {
        info!(
            chunks = plan.len(),
            seeds = plan.seeds(),
            budget = self.driver.budget(),
            policy = %self.driver.policy(),
            "starting run"
        );

        let summary = match self.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
                pool.install(|| self.run_chunks(plan, sink))?
            }
            None => self.run_chunks(plan, sink)?,
        };

        info!(
            seeds = summary.seeds,
            terminated = summary.terminated,
            incomplete = summary.incomplete,
            dropped = summary.dropped,
            "run complete"
        );
        Ok(summary)
    }

    fn run_chunks(&self, plan: &ChunkPlan, sink: &dyn RecordSink) -> ExecutionResult<RunSummary> {
        plan.chunks()
            .par_iter()
            .map(|chunk| self.run_chunk(chunk, sink))
            .try_reduce(RunSummary::default, |a, b| Ok(a.combine(b)))
    }

    fn run_chunk(&self, chunk: &SeedChunk, sink: &dyn RecordSink) -> ExecutionResult<RunSummary> {
        let span = info_span!("chunk", id = chunk.id);
        let _guard = span.enter();

        let output = self
            .driver
            .run(chunk.range.clone())
            .map_err(|source| ExecutionError::Chunk { chunk: chunk.id, source })?;

        sink.accept(chunk, &output.records)
            .map_err(|source| ExecutionError::Sink { chunk: chunk.id, source })?;

        debug!(
            seeds = output.summary.seeds,
            records = output.records.len(),
            "chunk delivered"
        );
        Ok(output.summary)
    }
}
