//! Errors raised while reading, writing or verifying persisted caches

use std::path::PathBuf;

/// Errors that can occur when handling cache files, manifests and markers
#[derive(Debug, thiserror::Error)]
pub enum CacheFileError {
    /// File is too small to hold a header and footer
    #[error("Cache file too small: {size} bytes")]
    FileTooSmall {
        /// Actual file size
        size: usize,
    },
    /// Invalid magic bytes
    #[error("Invalid magic bytes: expected {expected:?}, got {actual:?}")]
    InvalidMagic {
        /// Expected magic bytes
        expected: [u8; 4],
        /// Actual magic bytes
        actual: [u8; 4],
    },
    /// Format version this build cannot read
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u32),
    /// CRC mismatch
    #[error("CRC mismatch: stored={stored:#010x}, computed={computed:#010x}")]
    CrcMismatch {
        /// Stored CRC
        stored: u32,
        /// Computed CRC
        computed: u32,
    },
    /// Unknown section kind
    #[error("Invalid section kind: {kind:#04x}")]
    InvalidSectionKind {
        /// Invalid kind byte
        kind: u8,
    },
    /// Section data truncated
    #[error("Section data truncated for section {kind}: expected {expected} bytes, got {available}")]
    SectionDataTruncated {
        /// Section kind byte
        kind: u8,
        /// Declared data length
        expected: usize,
        /// Bytes actually present
        available: usize,
    },
    /// Header section count disagrees with the sections present
    #[error("Section count mismatch: header declares {declared}, found {found}")]
    SectionCountMismatch {
        /// Count from the header
        declared: u32,
        /// Sections actually present
        found: u32,
    },
    /// The same section appears twice
    #[error("Duplicate section: {kind:#04x}")]
    DuplicateSection {
        /// Repeated kind byte
        kind: u8,
    },
    /// Entry framing inside a section is broken
    #[error("Malformed entry in section {section} at offset {offset}: {reason}")]
    MalformedEntry {
        /// Section name
        section: &'static str,
        /// Byte offset inside the section data
        offset: usize,
        /// What was wrong
        reason: String,
    },
    /// Expected file does not exist
    #[error("Missing file: {}", path.display())]
    Missing {
        /// Path that was looked for
        path: PathBuf,
    },
    /// Manifest or marker payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheFileError {
    /// True when the file content (not the file system) is at fault
    pub fn is_corruption(&self) -> bool {
        !matches!(
            self,
            CacheFileError::Io(_) | CacheFileError::Missing { .. }
        )
    }
}
