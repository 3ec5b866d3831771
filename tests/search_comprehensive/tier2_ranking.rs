//! Tier 2: Ranking
//!
//! Weighted combinations, multi-index merge, ordering and pagination.

use super::test_utils::*;
use quarry::{Category, Index, MemorySource, Search, SearchOptions, TokenCap, Weights};
use std::sync::Arc;

// ============================================================================
// Weights
// ============================================================================

#[test]
fn test_tier2_author_only_scores_six() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let results = weighted_search(&registry).search("author:tolkien", 20, 0);
    assert_eq!(scored(&results), [(1, 6), (2, 6)]);
}

#[test]
fn test_tier2_author_and_year_score_two() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let results = weighted_search(&registry).search("author:tolkien year:1954", 20, 0);
    assert_eq!(scored(&results), [(1, 2)]);
    assert_eq!(results.allocations.len(), 1);
    assert_eq!(results.allocations[0].categories, ["author", "year"]);
}

#[test]
fn test_tier2_highest_aggregate_first() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let results = weighted_search(&registry).search("tolkien", 20, 0);
    // author -> 6, title -> 1
    assert_eq!(scored(&results), [(1, 6), (2, 6), (4, 1)]);
}

#[test]
fn test_tier2_weights_follow_token_order() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let search = weighted_search(&registry);

    // [title, author] is weighted, [author, title] is not
    assert_eq!(scored(&search.search("dune herbert", 20, 0)), [(3, 5), (5, 5)]);
    assert_eq!(scored(&search.search("herbert dune", 20, 0)), [(3, 1), (5, 1)]);
}

#[test]
fn test_tier2_qualifier_aliases() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let search = weighted_search(&registry);
    assert_eq!(ids(&search.search("t:hobbit", 20, 0)), [2]);
    assert_eq!(ids(&search.search("by:herbert", 20, 0)), [3, 5]);
    assert_eq!(ids(&search.search("title,author:tolkien", 20, 0)), [1, 2, 4]);
    assert!(search.search("isbn:tolkien", 20, 0).is_empty());
}

#[test]
fn test_tier2_markers() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let search = weighted_search(&registry);

    assert_eq!(ids(&search.search("by:tolk", 20, 0)), [1, 2]);
    assert!(search.search("by:\"tolk\"", 20, 0).is_empty());
    assert_eq!(ids(&search.search("by:tolkein~", 20, 0)), [1, 2]);
    assert_eq!(ids(&search.search("chil* dune", 20, 0)), [5]);
}

// ============================================================================
// Multiple Indexes
// ============================================================================

#[test]
fn test_tier2_indexes_merge_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());

    let films = MemorySource::new()
        .record(3u64, [("title", "Dune")])
        .record(10u64, [("title", "Dune Part Two")]);
    let films = Index::builder("films", Arc::new(films))
        .category(Category::new("title"))
        .result_identifier("movies")
        .cache_root(dir.path())
        .build()
        .unwrap();
    films.index().unwrap();

    let mut indexes = registry.indexes().to_vec();
    indexes.push(Arc::new(films));
    let search = Search::new(indexes, SearchOptions::new().unwrap());

    let results = search.search("\"dune\"", 20, 0);
    assert_eq!(scored(&results), [(3, 2), (5, 1), (10, 1)]);
    assert_eq!(results.result_identifiers(&results.hits[0]), ["books", "movies"]);
    assert_eq!(results.result_identifiers(&results.hits[2]), ["movies"]);
}

// ============================================================================
// Pagination
// ============================================================================

fn numbered(root: &std::path::Path, count: u64) -> Search {
    let mut source = MemorySource::new();
    for id in 1..=count {
        source.push(id, [("title", format!("volume {id}"))]);
    }
    let index = Index::builder("volumes", Arc::new(source))
        .category(Category::new("title"))
        .cache_root(root)
        .build()
        .unwrap();
    index.index().unwrap();
    Search::new([Arc::new(index)], SearchOptions::new().unwrap())
}

#[test]
fn test_tier2_pagination_25_matches() {
    let dir = tempfile::tempdir().unwrap();
    let search = numbered(dir.path(), 25);

    let first = search.search("volume", 20, 0);
    assert_eq!(first.len(), 20);
    assert_eq!(first.total, 25);

    let rest = search.search("volume", 20, 20);
    assert_eq!(rest.len(), 5);
    assert_eq!(rest.total, 25);

    let mut all = ids(&first);
    all.extend(ids(&rest));
    assert_eq!(all, (1..=25).collect::<Vec<u128>>());
}

#[test]
fn test_tier2_zero_rows() {
    let dir = tempfile::tempdir().unwrap();
    let search = numbered(dir.path(), 0);
    let results = search.search("volume", 20, 0);
    assert!(results.ids.is_empty());
    assert_eq!(results.total, 0);
}

// ============================================================================
// Determinism & Limits
// ============================================================================

#[test]
fn test_tier2_repeated_searches_agree() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let search = weighted_search(&registry);
    let first = search.search("tolkien", 20, 0);
    for _ in 0..5 {
        let again = search.search("tolkien", 20, 0);
        assert_eq!(again.hits, first.hits);
        assert_eq!(again.allocations, first.allocations);
    }
}

#[test]
fn test_tier2_token_cap() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());

    let keep_first = Search::over(
        &registry,
        SearchOptions::new().unwrap().maximum_tokens(1),
    );
    assert_eq!(keep_first.search("hobbit zzz", 20, 0).tokens, ["hobbit"]);
    assert_eq!(ids(&keep_first.search("hobbit zzz", 20, 0)), [2]);

    let keep_last = Search::over(
        &registry,
        SearchOptions::new()
            .unwrap()
            .maximum_tokens(1)
            .token_cap(TokenCap::KeepLast),
    );
    assert!(keep_last.search("hobbit zzz", 20, 0).is_empty());
}

#[test]
fn test_tier2_json_payload() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let results = weighted_search(&registry).search("author:tolkien", 1, 1);
    let json: serde_json::Value = serde_json::from_str(&results.to_json().unwrap()).unwrap();
    assert_eq!(json["ids"], serde_json::json!([2]));
    assert_eq!(json["total"], 2);
    assert_eq!(json["offset"], 1);
    assert_eq!(json["allocations"][0]["result_identifier"], "books");
    assert_eq!(json["allocations"][0]["weight"], 6);
    assert!(json["duration_us"].is_u64());
}

#[test]
fn test_tier2_queries_during_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let search = Search::over(&registry, SearchOptions::new().unwrap().weights(Weights::new()));
    let books = Arc::clone(&registry.indexes()[0]);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..10 {
                books.index().unwrap();
            }
        });
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    assert_eq!(ids(&search.search("tolkien", 20, 0)), [1, 2, 4]);
                }
            });
        }
    });
}
