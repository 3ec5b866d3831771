//! Indexes shared by the unit tests

use quarry_analysis::{Partial, Similarity};
use quarry_engine::{Category, Index, MemorySource};
use std::path::Path;
use std::sync::Arc;

pub(crate) fn library_source() -> MemorySource {
    MemorySource::new()
        .record(
            1u64,
            [("title", "The Lord of the Rings"), ("author", "J.R.R. Tolkien"), ("year", "1954")],
        )
        .record(2u64, [("title", "The Hobbit"), ("author", "Tolkien"), ("year", "1937")])
        .record(3u64, [("title", "Dune"), ("author", "Frank Herbert"), ("year", "1965")])
        .record(
            4u64,
            [("title", "Tolkien: A Biography"), ("author", "Humphrey Carpenter"), ("year", "1977")],
        )
}

/// Built `books` index: title and author match prefixes, author also
/// sounds alike, year is exact only
pub(crate) fn library(root: &Path) -> Index {
    let index = Index::builder("books", Arc::new(library_source()))
        .category(Category::new("title").partial(Partial::Substring { from: -1 }))
        .category(
            Category::new("author")
                .qualifiers(["author", "by"])
                .partial(Partial::Substring { from: -1 })
                .similarity(Similarity::double_metaphone()),
        )
        .category(Category::new("year"))
        .cache_root(root)
        .build()
        .unwrap();
    index.index().unwrap();
    index
}

/// Built `places` index with a 1 km geo pair
pub(crate) fn places(root: &Path) -> Index {
    let source = MemorySource::new()
        .record(1u64, [("lat", "47.3779"), ("lng", "8.5402")])
        .record(2u64, [("lat", "46.9480"), ("lng", "7.4474")]);
    let index = Index::builder("places", Arc::new(source))
        .geo_categories("lat", "lng", 1.0, 1)
        .cache_root(root)
        .build()
        .unwrap();
    index.index().unwrap();
    index
}
