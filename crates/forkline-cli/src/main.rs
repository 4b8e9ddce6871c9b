//! forkline scenario driver
//!
//! Samples a history, forks competing predictions off it, then prunes,
//! detaches and trims as the scenario asks, and prints every surviving
//! trajectory.
//!
//! ## Usage
//!
//! ```bash
//! # Built-in scenario
//! forkline
//!
//! # Scenario from a RON file, with structural changes logged
//! forkline --config scenario.ron --verbose
//! ```

mod config;
mod driver;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Scenario;

/// Run a branching-timeline scenario.
#[derive(Parser, Debug)]
#[command(name = "forkline")]
#[command(about = "Fork, prune and detach predictions off a sampled history")]
struct Args {
    /// RON scenario file (built-in scenario when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log fork structure changes (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let scenario = match &args.config {
        Some(path) => Scenario::load(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => Scenario::default(),
    };
    tracing::debug!(?scenario, "scenario");

    let report = driver::run(&scenario)?;
    print!("{report}");
    Ok(())
}
