//! Error types for Quarry
//!
//! This module defines the error taxonomy shared by every crate.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Skipped source records are not errors: they are counted and logged by
//! the build, and never surface here.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Quarry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Quarry
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid wiring detected at setup time
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// A source could not be iterated while building an index
    #[error("Source iteration failed for {index}/{category}: {reason}")]
    SourceIteration {
        /// Index being built
        index: String,
        /// Category whose harvest failed
        category: String,
        /// Underlying failure
        reason: String,
    },

    /// A persisted cache failed verification
    #[error("Cache integrity error in {path}: {reason}")]
    CacheIntegrity {
        /// Cache file that failed
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Configuration errors
///
/// Raised while wiring indexes, categories and searches together.
/// Never raised at query time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A pattern in a canonicalizer configuration does not compile
    #[error("Invalid pattern for {field}: {reason}")]
    InvalidPattern {
        /// Configuration field holding the pattern
        field: &'static str,
        /// Regex compiler message
        reason: String,
    },

    /// The same qualifier is claimed by two categories of one index
    #[error("Ambiguous qualifier '{qualifier}' in index {index}: used by {first} and {second}")]
    AmbiguousQualifier {
        /// Index being defined
        index: String,
        /// Offending qualifier
        qualifier: String,
        /// Category that claimed it first
        first: String,
        /// Category that claimed it again
        second: String,
    },

    /// Expansion strategy parameters are out of range or unknown
    #[error("Invalid expansion strategy for category {category}: {reason}")]
    InvalidStrategy {
        /// Category being defined
        category: String,
        /// What was wrong
        reason: String,
    },

    /// A required parameter was not supplied
    #[error("Missing required parameter '{parameter}' for {component}")]
    MissingParameter {
        /// Component being configured
        component: String,
        /// Missing parameter name
        parameter: &'static str,
    },

    /// Two registered items share a name
    #[error("Duplicate {kind} name: {name}")]
    DuplicateName {
        /// "index" or "category"
        kind: &'static str,
        /// Duplicated name
        name: String,
    },

    /// A name cannot be used (it becomes a path component on disk)
    #[error("Invalid {kind} name '{name}': {reason}")]
    InvalidName {
        /// "index" or "category"
        kind: &'static str,
        /// Rejected name
        name: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Configuration file could not be read or parsed
    #[error("Invalid configuration file {path}: {reason}")]
    InvalidFile {
        /// Path of the file
        path: PathBuf,
        /// Read or parse failure
        reason: String,
    },
}

impl Error {
    /// Create a source iteration error
    pub fn source_iteration(
        index: impl Into<String>,
        category: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::SourceIteration {
            index: index.into(),
            category: category.into(),
            reason: reason.into(),
        }
    }

    /// Create a cache integrity error
    pub fn cache_integrity(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CacheIntegrity {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that can only happen while wiring things together
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}
