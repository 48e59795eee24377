#![allow(dead_code)]

use collatz_orbits::{IncompletePolicy, OrbitDriver, OrbitStore, TerminationPolicy};

pub const SEEDS_SMALL: u64 = 100_000;
pub const SEEDS_MED: u64 = 1_000_000;

pub fn seeded_store(seeds: u64) -> OrbitStore {
    OrbitStore::from_range(1..=seeds).unwrap()
}

pub fn driver(policy: TerminationPolicy, budget: u64) -> OrbitDriver {
    OrbitDriver::new(budget, policy, IncompletePolicy::Mark)
}
