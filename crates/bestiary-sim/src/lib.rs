//! Bestiary Simulator - headless driver for the creature engine.
//!
//! Provides the simulation configuration file, a seeded loot roller and the
//! fixed-timestep encounter runner used by the `bestiary` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod loot;
pub mod sim;

pub use config::{PlayerConfig, RosterEntry, SimConfig, CONFIG_FILE};
pub use loot::BasicLootRoller;
pub use sim::{EventTally, SimReport, Simulation};
