//! Delimited output for orbit records.
//!
//! Records are written as pipe-separated text with a header row, one file
//! per chunk:
//!
//! ```text
//! seed|max|mean|length
//! 1|1|1|0
//! 2|2|1.5|1
//! ```
//!
//! The column set depends on the run configuration, see [`RecordSchema`].
//! Partition files carry no ordering guarantee relative to each other.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::engine::error::WriteError;
use crate::engine::scheduler::RecordSink;
use crate::engine::types::{
    IncompletePolicy,
    OrbitRecord,
    SeedChunk,
    TerminationPolicy,
};


/// Field delimiter of every output partition.
pub const DELIMITER: u8 = b'|';

/// Columns written for each record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordSchema {
    /// `seed|max`
    SeedMax,

    /// `seed|max|mean|length`
    Full,

    /// `seed|max|mean|length|status`
    FullWithStatus,
}

impl RecordSchema {
    /// Chooses the schema for a policy combination.
    pub fn for_policies(policy: TerminationPolicy, incomplete: IncompletePolicy) -> Self {
        match (policy, incomplete) {
            (TerminationPolicy::FreezeInPlace, _) => RecordSchema::SeedMax,
            (TerminationPolicy::EagerCompaction, IncompletePolicy::Drop) => RecordSchema::Full,
            (TerminationPolicy::EagerCompaction, IncompletePolicy::Mark) => RecordSchema::FullWithStatus,
        }
    }

    /// Header row fields.
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            RecordSchema::SeedMax => &["seed", "max"],
            RecordSchema::Full => &["seed", "max", "mean", "length"],
            RecordSchema::FullWithStatus => &["seed", "max", "mean", "length", "status"],
        }
    }

    /// Renders one record as the fields of a row.
    pub fn fields(&self, record: &OrbitRecord) -> Result<Vec<String>, WriteError> {
        let mut row = vec![record.seed.to_string(), record.max.to_string()];
        if matches!(self, RecordSchema::SeedMax) {
            return Ok(row);
        }

        let mean = record.mean.ok_or(WriteError::MissingField { seed: record.seed, field: "mean" })?;
        let length = record.length.ok_or(WriteError::MissingField { seed: record.seed, field: "length" })?;
        row.push(mean.as_f64().to_string());
        row.push(length.to_string());

        if matches!(self, RecordSchema::FullWithStatus) {
            row.push(record.status.to_string());
        }
        Ok(row)
    }
}

/// Resolves the partition path for `chunk` from an output location.
///
/// A `*` in the location is replaced by the chunk id. Otherwise the location
/// is a directory and the partition is named `part_<id>.csv`.
pub fn partition_path(location: &str, chunk: &SeedChunk) -> PathBuf {
    if location.contains('*') {
        PathBuf::from(location.replacen('*', &chunk.id.to_string(), 1))
    } else {
        Path::new(location).join(format!("part_{}.csv", chunk.id))
    }
}

/// Writes each chunk to its own pipe-delimited file.
#[derive(Clone, Debug)]
pub struct PartitionedWriter {
    location: String,
    schema: RecordSchema,
}

impl PartitionedWriter {
    /// Creates a writer for `location` using `schema`.
    pub fn new(location: impl Into<String>, schema: RecordSchema) -> Self {
        Self { location: location.into(), schema }
    }

    fn write_partition(&self, path: &Path, records: &[OrbitRecord]) -> Result<(), WriteError> {
        let display = path.display().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| WriteError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let csv_err = |source: csv::Error| WriteError::Csv { path: display.clone(), source };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .from_path(path)
            .map_err(csv_err)?;

        writer.write_record(self.schema.header()).map_err(csv_err)?;
        for record in records {
            writer.write_record(self.schema.fields(record)?).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| WriteError::Io { path: display.clone(), source })?;
        Ok(())
    }
}

impl RecordSink for PartitionedWriter {
    fn accept(&self, chunk: &SeedChunk, records: &[OrbitRecord]) -> Result<(), WriteError> {
        let path = partition_path(&self.location, chunk);
        self.write_partition(&path, records)?;
        debug!(path = %path.display(), records = records.len(), "wrote partition");
        Ok(())
    }
}

/// Collects every chunk's records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<OrbitRecord>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected records sorted by seed.
    pub fn into_sorted(self) -> Vec<OrbitRecord> {
        let mut records = self
            .records
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.sort_by_key(|r| r.seed);
        records
    }
}

impl RecordSink for MemorySink {
    fn accept(&self, _chunk: &SeedChunk, records: &[OrbitRecord]) -> Result<(), WriteError> {
        let mut guard = self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.extend_from_slice(records);
        Ok(())
    }
}
