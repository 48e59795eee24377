//! Run configuration.
//!
//! A run is described by [`RunConfig`]. Values come from three layers, later
//! layers overriding earlier ones:
//!
//! 1. built-in defaults,
//! 2. an optional TOML file,
//! 3. command-line flags ([`CliArgs`]).
//!
//! ```toml
//! num_elements = 1000000
//! num_iterations = 1000
//! output_location = "data/collatz_stats_part_*.csv"
//! termination_policy = "eager-compaction"
//! incomplete_orbits = "mark"
//! chunk_size = 100000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::engine::types::{IncompletePolicy, Step, TerminationPolicy, Value};


/// Default number of seeds.
pub const DEFAULT_NUM_ELEMENTS: Value = 1_000_000_000;

/// Default step budget.
pub const DEFAULT_NUM_ITERATIONS: Step = 1_000;

/// Default seeds per chunk.
pub const DEFAULT_CHUNK_SIZE: Value = 1_000_000;

/// Default partition pattern.
pub const DEFAULT_OUTPUT_LOCATION: &str = "data/collatz_stats_part_*.csv";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config at {path:?}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,

        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`RunConfig`].
    #[error("failed to parse config at {path:?}: {source}")]
    Parse {
        /// File that was parsed.
        path: PathBuf,

        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// A field holds a value the engine cannot run with.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,

        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// Fully resolved run parameters.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Size of the seed range `[1, num_elements]`.
    pub num_elements: Value,

    /// Maximum number of map applications per orbit.
    pub num_iterations: Step,

    /// Partition pattern (`*` replaced by chunk id) or output directory.
    pub output_location: String,

    /// Termination and compaction strategy.
    pub termination_policy: TerminationPolicy,

    /// Treatment of orbits still active at budget exhaustion.
    pub incomplete_orbits: IncompletePolicy,

    /// Seeds per independently processed chunk.
    pub chunk_size: Value,

    /// Worker threads; `None` uses the global Rayon pool.
    pub threads: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_elements: DEFAULT_NUM_ELEMENTS,
            num_iterations: DEFAULT_NUM_ITERATIONS,
            output_location: DEFAULT_OUTPUT_LOCATION.to_string(),
            termination_policy: TerminationPolicy::default(),
            incomplete_orbits: IncompletePolicy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            threads: None,
        }
    }
}

impl RunConfig {
    /// Parses a configuration from TOML text; missing fields keep defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads and parses a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolves the configuration for a command line: file (if any), then flags.
    pub fn resolve(args: &CliArgs) -> Result<Self, ConfigError> {
        let base = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        let config = base.with_overrides(args);
        config.validate()?;
        Ok(config)
    }

    /// Applies every flag that was given on the command line.
    pub fn with_overrides(mut self, args: &CliArgs) -> Self {
        if let Some(n) = args.num_elements {
            self.num_elements = n;
        }
        if let Some(k) = args.num_iterations {
            self.num_iterations = k;
        }
        if let Some(location) = &args.output_location {
            self.output_location = location.clone();
        }
        if let Some(policy) = args.termination_policy {
            self.termination_policy = policy;
        }
        if let Some(incomplete) = args.incomplete_orbits {
            self.incomplete_orbits = incomplete;
        }
        if let Some(size) = args.chunk_size {
            self.chunk_size = size;
        }
        if args.threads.is_some() {
            self.threads = args.threads;
        }
        self
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_elements == 0 {
            return Err(ConfigError::Invalid { field: "num_elements", reason: "must be positive" });
        }
        if self.num_iterations == 0 {
            return Err(ConfigError::Invalid { field: "num_iterations", reason: "must be positive" });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid { field: "chunk_size", reason: "must be positive" });
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid { field: "threads", reason: "must be positive" });
        }
        if self.output_location.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "output_location", reason: "must not be empty" });
        }
        Ok(())
    }
}

/// Command-line flags.
#[derive(Debug, Default, Parser)]
#[command(name = "collatz-orbits", version, about = "Per-seed Collatz orbit statistics")]
pub struct CliArgs {
    /// TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Size of the seed range [1, N].
    #[arg(short = 'n', long)]
    pub num_elements: Option<Value>,

    /// Step budget per orbit.
    #[arg(short = 'k', long)]
    pub num_iterations: Option<Step>,

    /// Output pattern (`*` is replaced by the chunk id) or directory.
    #[arg(short, long)]
    pub output_location: Option<String>,

    /// Termination policy.
    #[arg(short = 'p', long, value_enum)]
    pub termination_policy: Option<TerminationPolicy>,

    /// Treatment of orbits that outlive the budget.
    #[arg(long, value_enum)]
    pub incomplete_orbits: Option<IncompletePolicy>,

    /// Seeds per chunk.
    #[arg(long)]
    pub chunk_size: Option<Value>,

    /// Worker threads.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,
}
