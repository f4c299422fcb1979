//! # Bestiary Simulator
//!
//! Headless runner for the creature behavior and combat engine.
//!
//! Loads `bestiary.toml` (or the path given as the first argument), reads the
//! species files it points at, runs the configured encounter and prints the
//! report as JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::{Context, Result};
use bestiary_gameplay::SpeciesRegistry;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bestiary_sim::{SimConfig, Simulation};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("bestiary=info".parse()?))
        .init();

    info!("Bestiary simulator starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load_from(path),
        None => SimConfig::load(),
    };

    let mut registry = SpeciesRegistry::new();
    let loaded = registry
        .load_dir(&config.species_dir)
        .with_context(|| format!("loading species from {}", config.species_dir.display()))?;
    info!("Loaded {} species", loaded);

    let mut simulation = Simulation::new(config, &registry).context("spawning roster")?;
    let report = simulation.run();

    println!("{}", serde_json::to_string_pretty(&report)?);

    info!("Bestiary simulator finished");
    Ok(())
}
