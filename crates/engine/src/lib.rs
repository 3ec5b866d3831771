//! Indexing engine for Quarry
//!
//! This crate ties the lower layers together:
//! - Source: the `IterableSource` trait plus memory and document adapters
//! - Category: one searchable field, harvested into a three-section cache
//! - Index: a source and its categories; unit of build, backup and restore
//! - Registry: ordered indexes, the generation counter and lifecycle fan-out
//! - Config: `quarry.toml` loading and declarative index definitions
//!
//! Queries never touch this crate's locks for longer than an `Arc` clone.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod category;
pub mod config;
pub mod index;
pub mod registry;
pub mod source;

pub use cache::{Cache, CacheBuilder, CacheStats};
pub use category::{BuildStats, Category, LookupMode, SkipReason};
pub use config::{
    CategoryConfig, EngineConfig, GeoConfig, IndexConfig, SourceConfig, CONFIG_FILE_NAME,
    DEFAULT_CACHE_ROOT, DEFAULT_MAXIMUM_TOKENS,
};
pub use index::{
    CacheState, CategoryCheck, CheckReport, GeoPair, Index, IndexBuilder, IndexReport,
};
pub use registry::{LifecycleReport, Registry};
pub use source::{
    DocumentSource, DocumentSourceBuilder, IterableSource, MemorySource, SourceError, SourceRow,
    SourceRows,
};
