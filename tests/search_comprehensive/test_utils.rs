//! Test utilities for the search suite

use quarry::{
    Category, Index, MemorySource, Partial, Registry, Search, SearchOptions, SearchResults,
    Similarity, Weights,
};
use std::path::Path;
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Install a fmt subscriber once; `RUST_LOG` selects what is shown
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Books with title, author and year
pub fn library_source() -> MemorySource {
    MemorySource::new()
        .record(
            1u64,
            [
                ("title", "The Lord of the Rings"),
                ("author", "J.R.R. Tolkien"),
                ("year", "1954"),
            ],
        )
        .record(
            2u64,
            [("title", "The Hobbit"), ("author", "Tolkien"), ("year", "1937")],
        )
        .record(
            3u64,
            [("title", "Dune"), ("author", "Frank Herbert"), ("year", "1965")],
        )
        .record(
            4u64,
            [
                ("title", "Tolkien: A Biography"),
                ("author", "Humphrey Carpenter"),
                ("year", "1977"),
            ],
        )
        .record(
            5u64,
            [("title", "Children of Dune"), ("author", "Frank Herbert"), ("year", "1976")],
        )
        .record(6u64, [("title", "Untitled draft")])
}

/// Unbuilt `books` index over [`library_source`]
pub fn library(root: &Path) -> Index {
    Index::builder("books", Arc::new(library_source()))
        .category(
            Category::new("title")
                .qualifiers(["title", "t"])
                .partial(Partial::Substring { from: -1 }),
        )
        .category(
            Category::new("author")
                .qualifiers(["author", "by"])
                .partial(Partial::Substring { from: -1 })
                .similarity(Similarity::double_metaphone()),
        )
        .category(Category::new("year"))
        .cache_root(root)
        .build()
        .expect("library index definition is valid")
}

/// Registry holding the built library
pub fn built_registry(root: &Path) -> Registry {
    init_tracing();
    let mut registry = Registry::new();
    registry.register(library(root)).unwrap();
    let report = registry.index_for_tests();
    assert!(report.is_ok(), "build failed: {:?}", report.outcomes);
    registry
}

/// The weights used throughout: author 6, title+author 5, author+year 2
pub fn weights() -> Weights {
    Weights::new()
        .with(["author"], 6)
        .with(["title", "author"], 5)
        .with(["author", "year"], 2)
}

/// Search over a registry with [`weights`]
pub fn weighted_search(registry: &Registry) -> Search {
    Search::over(registry, SearchOptions::new().unwrap().weights(weights()))
}

/// Ids of a page as plain integers
pub fn ids(results: &SearchResults) -> Vec<u128> {
    results.ids.iter().map(|id| id.as_u128()).collect()
}

/// `(id, score)` of a page
pub fn scored(results: &SearchResults) -> Vec<(u128, i64)> {
    results
        .hits
        .iter()
        .map(|hit| (hit.id.as_u128(), hit.score))
        .collect()
}
