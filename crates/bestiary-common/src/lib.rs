//! # Bestiary Common
//!
//! Common types, utilities, and shared abstractions for the Bestiary creature
//! engine.
//!
//! This crate provides foundational types used across all Bestiary crates:
//! - ID types (EntityId, ItemTypeId)
//! - Planar vector helpers over `glam::Vec2`
//! - Numeric sanitation with logged fallbacks
//! - Version information for authored data
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;
