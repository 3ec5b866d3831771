//! Data sources
//!
//! An index harvests each category by asking its source for
//! `(native key, value)` pairs of one field. Sources are read in full on
//! every build; nothing is streamed incrementally.
//!
//! - [`MemorySource`]: records held in memory
//! - [`DocumentSource`]: a JSON document dump on disk

mod document;
mod memory;

pub use document::{DocumentSource, DocumentSourceBuilder, DEFAULT_ID_FIELD};
pub use memory::MemorySource;

use quarry_core::{KeyFormat, NativeKey};
use thiserror::Error;

/// One harvested pair; `None` when the record has no value for the field
pub type SourceRow = Result<(NativeKey, Option<String>), SourceError>;

/// Iterator over the pairs of one field
pub type SourceRows<'a> = Box<dyn Iterator<Item = SourceRow> + 'a>;

/// Failures while reading a source
///
/// Any of these aborts the build of the affected index.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Backend could not be reached or read
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// Backend content could not be understood
    #[error("Malformed source data: {reason}")]
    Malformed {
        /// What was wrong
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything an index can harvest
///
/// Implementations must be shareable across the build threads: every
/// category of an index reads the same source concurrently.
pub trait IterableSource: Send + Sync {
    /// Yield `(native key, value)` for every record, in a stable order
    fn each<'a>(&'a self, field: &str) -> Result<SourceRows<'a>, SourceError>;

    /// Called once per index when a new snapshot generation is taken
    fn take_snapshot(&self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Key format to use when the index does not configure one
    fn key_format(&self) -> Option<KeyFormat> {
        None
    }

    /// Short description for logs
    fn describe(&self) -> String {
        "source".to_string()
    }
}
