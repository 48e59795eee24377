//! Tracing subscriber setup.
//!
//! Log verbosity is controlled by `RUST_LOG` (default `info`), e.g.
//! `RUST_LOG=collatz_orbits=trace` prints one line per step.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Installs the global fmt subscriber. Later calls are no-ops.
pub fn init_tracing() {
    if INITIALISED.set(()).is_err() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    if let Err(err) = Registry::default().with(filter).with(fmt_layer).try_init() {
        eprintln!("failed to initialise tracing subscriber: {err}");
    }
}
