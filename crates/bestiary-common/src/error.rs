//! Error types shared across Bestiary crates.

use thiserror::Error;

use crate::version::SchemaVersion;

/// Top-level error type for Bestiary operations outside the tick loop.
///
/// The simulation itself never fails; these errors only arise while loading
/// configuration and authored data before the loop starts.
#[derive(Debug, Error)]
pub enum BestiaryError {
    /// Configuration could not be used
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authored data could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: SchemaVersion,
        /// Actual version found
        actual: SchemaVersion,
    },
}

/// Result type alias for Bestiary operations.
pub type BestiaryResult<T> = Result<T, BestiaryError>;
