use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use collatz_orbits::config::{CliArgs, RunConfig};
use collatz_orbits::output::{PartitionedWriter, RecordSchema};
use collatz_orbits::telemetry::init_tracing;
use collatz_orbits::{ChunkPlan, OrbitDriver, Scheduler};

fn main() -> Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = RunConfig::resolve(&args).context("invalid configuration")?;
    info!(?config, "resolved configuration");

    let driver = OrbitDriver::new(
        config.num_iterations,
        config.termination_policy,
        config.incomplete_orbits,
    );
    let mut scheduler = Scheduler::new(driver);
    if let Some(threads) = config.threads {
        scheduler = scheduler.with_threads(threads);
    }

    let plan = ChunkPlan::new(config.num_elements, config.chunk_size);
    let schema = RecordSchema::for_policies(config.termination_policy, config.incomplete_orbits);
    let writer = PartitionedWriter::new(config.output_location.clone(), schema);

    let summary = scheduler
        .run(&plan, &writer)
        .with_context(|| format!("run failed writing to {}", config.output_location))?;

    info!(
        seeds = summary.seeds,
        emitted = summary.emitted(),
        incomplete = summary.incomplete,
        "done"
    );
    Ok(())
}
