//! # Engine Module
//!
//! Orbit simulation engine.
//!
//! This module contains the core building blocks:
//! - Numeric types and tagged policy choices
//! - The Collatz map applicator
//! - Element-wise combiners for running statistics
//! - Column storage for the orbit working set
//! - Termination and compaction strategies
//! - The step-loop driver and the chunk scheduler
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod types;
pub mod error;
pub mod map;
pub mod reduce;
pub mod storage;
pub mod policy;
pub mod driver;
pub mod scheduler;
