//! Quarry - embeddable full-text and structured search
//!
//! Quarry builds per-field inverted indexes (categories) from data sources,
//! expands tokens with partial and phonetic strategies, keeps the caches on
//! disk with snapshot, backup and restore, and answers weighted queries
//! across several indexes.
//!
//! # Quick Start
//!
//! ```ignore
//! use quarry::{Category, Index, MemorySource, Partial, Registry, Search, SearchOptions};
//! use std::sync::Arc;
//!
//! let source = MemorySource::new().record(1u64, [("title", "The Hobbit")]);
//! let books = Index::builder("books", Arc::new(source))
//!     .category(Category::new("title").partial(Partial::Substring { from: -1 }))
//!     .build()?;
//!
//! let mut registry = Registry::new();
//! registry.register(books)?;
//! registry.index();
//!
//! let search = Search::over(&registry, SearchOptions::new()?);
//! let results = search.search("hob", 20, 0);
//! ```
//!
//! # Architecture
//!
//! - `quarry-analysis`: canonicalizer and expansion strategies
//! - `quarry-durability`: cache files, backups, manifests
//! - `quarry-engine`: sources, categories, indexes, the registry
//! - `quarry-search`: query parsing, allocations, ranking

pub use quarry_analysis::{
    double_metaphone, metaphone, Canonicalizer, CanonicalizerConfig, CharacterSubstituter,
    Expansion, Partial, RangeBucketing, Similarity,
};
pub use quarry_core::{ConfigError, DocId, Error, KeyFormat, NativeKey, Result};
pub use quarry_durability::CacheStore;
pub use quarry_engine::{
    CacheState, Category, CheckReport, DocumentSource, EngineConfig, Index, IndexConfig,
    IterableSource, LifecycleReport, LookupMode, MemorySource, Registry, SourceError, SourceRows,
};
pub use quarry_search::{Hit, Query, Search, SearchOptions, SearchResults, TokenCap, Weights};
