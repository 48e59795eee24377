use std::io::Write;

use clap::Parser;
use collatz_orbits::config::{CliArgs, ConfigError, RunConfig, DEFAULT_NUM_ITERATIONS};
use collatz_orbits::{IncompletePolicy, TerminationPolicy};

#[test]
fn defaults_are_valid() {
    let config = RunConfig::default();
    config.validate().unwrap();
    assert_eq!(config.num_elements, 1_000_000_000);
    assert_eq!(config.num_iterations, 1_000);
    assert_eq!(config.termination_policy, TerminationPolicy::EagerCompaction);
    assert_eq!(config.incomplete_orbits, IncompletePolicy::Mark);
}

#[test]
fn toml_overrides_only_given_fields() {
    let config = RunConfig::from_toml_str(
        r#"
        num_elements = 5000
        termination_policy = "freeze-in-place"
        output_location = "out/part_*.csv"
        "#,
    )
    .unwrap();

    assert_eq!(config.num_elements, 5_000);
    assert_eq!(config.termination_policy, TerminationPolicy::FreezeInPlace);
    assert_eq!(config.output_location, "out/part_*.csv");
    assert_eq!(config.num_iterations, DEFAULT_NUM_ITERATIONS);
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(RunConfig::from_toml_str("num_seeds = 3").is_err());
    assert!(RunConfig::from_toml_str("termination_policy = \"lazy\"").is_err());
}

#[test]
fn flags_override_the_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "num_elements = 100\nnum_iterations = 10\nincomplete_orbits = \"drop\"").unwrap();

    let args = CliArgs::parse_from([
        "collatz-orbits",
        "--config",
        file.path().to_str().unwrap(),
        "--num-iterations",
        "25",
        "--termination-policy",
        "freeze-in-place",
        "--threads",
        "2",
    ]);
    let config = RunConfig::resolve(&args).unwrap();

    assert_eq!(config.num_elements, 100);
    assert_eq!(config.num_iterations, 25);
    assert_eq!(config.termination_policy, TerminationPolicy::FreezeInPlace);
    assert_eq!(config.incomplete_orbits, IncompletePolicy::Drop);
    assert_eq!(config.threads, Some(2));
}

#[test]
fn zero_values_fail_validation() {
    let args = CliArgs::parse_from(["collatz-orbits", "-n", "0"]);
    let err = RunConfig::resolve(&args).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "num_elements", .. }));

    let config = RunConfig { chunk_size: 0, ..RunConfig::default() };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "chunk_size", .. })));

    let config = RunConfig { threads: Some(0), ..RunConfig::default() };
    assert!(config.validate().is_err());
}

#[test]
fn missing_file_is_a_read_error() {
    let args = CliArgs::parse_from(["collatz-orbits", "--config", "/nonexistent/collatz.toml"]);
    assert!(matches!(RunConfig::resolve(&args), Err(ConfigError::Read { .. })));
}
