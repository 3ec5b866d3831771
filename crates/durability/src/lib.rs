//! Durability layer for Quarry
//!
//! This crate persists category caches:
//! - cache_file: binary format (header, sections, CRC32 footer)
//! - writer / reader: atomic writes, loading and integrity verification
//! - layout: where files live under the cache root
//! - manifest: per-index MessagePack manifest
//! - generation: JSON generation marker written by snapshots
//! - store: file-level backup / restore / clear operations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod atomic;
pub mod cache_file;
pub mod error;
pub mod generation;
pub mod layout;
pub mod manifest;
pub mod reader;
pub mod store;
pub mod writer;

pub use cache_file::{
    CacheFileHeader, CacheSection, SectionKind, CACHE_FILE_EXTENSION, CACHE_FORMAT_VERSION,
    CACHE_MAGIC,
};
pub use error::CacheFileError;
pub use generation::GenerationMarker;
pub use layout::StoreLayout;
pub use manifest::{IndexManifest, ManifestCategory};
pub use reader::{CacheFileSummary, LoadedCacheFile, LoadedSection, SectionSummary};
pub use store::CacheStore;
pub use writer::CacheFileInfo;
