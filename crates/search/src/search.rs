//! Ranked search over one or more indexes
//!
//! A [`Search`] parses the query once, allocates it against every index,
//! merges the allocations by id and sorts by score. Searching never fails:
//! malformed or empty text gives empty results.

use crate::allocation::{allocate, Allocation};
use crate::query::{Query, TokenCap};
use crate::results::{Hit, SearchResults};
use crate::weights::Weights;
use quarry_analysis::Canonicalizer;
use quarry_core::{ConfigError, DocId};
use quarry_engine::{EngineConfig, Index, Registry, DEFAULT_MAXIMUM_TOKENS};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Instant;

// ============================================================================
// SearchOptions
// ============================================================================

/// Query-time settings
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Combination weights
    pub weights: Weights,
    /// Pipeline applied to query text
    pub canonicalizer: Canonicalizer,
    /// Token cap; 0 disables it
    pub maximum_tokens: usize,
    /// Which tokens survive the cap
    pub token_cap: TokenCap,
    /// Treat the last unmarked token as a partial
    pub partial_last_token: bool,
}

impl SearchOptions {
    /// Default search pipeline, default weights
    pub fn new() -> Result<Self, ConfigError> {
        Ok(SearchOptions::with_canonicalizer(Canonicalizer::for_searching()?))
    }

    /// Options using the `[searching]` pipeline and token cap of a config
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(SearchOptions::with_canonicalizer(config.searching_canonicalizer()?)
            .maximum_tokens(config.maximum_tokens))
    }

    fn with_canonicalizer(canonicalizer: Canonicalizer) -> Self {
        SearchOptions {
            weights: Weights::default(),
            canonicalizer,
            maximum_tokens: DEFAULT_MAXIMUM_TOKENS,
            token_cap: TokenCap::default(),
            partial_last_token: true,
        }
    }

    /// Builder: set weights
    pub fn weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    /// Builder: set the query pipeline
    pub fn canonicalizer(mut self, canonicalizer: Canonicalizer) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    /// Builder: set the token cap
    pub fn maximum_tokens(mut self, maximum_tokens: usize) -> Self {
        self.maximum_tokens = maximum_tokens;
        self
    }

    /// Builder: set the cap policy
    pub fn token_cap(mut self, token_cap: TokenCap) -> Self {
        self.token_cap = token_cap;
        self
    }

    /// Builder: toggle the implicit partial on the last token
    pub fn partial_last_token(mut self, enabled: bool) -> Self {
        self.partial_last_token = enabled;
        self
    }
}

// ============================================================================
// Search
// ============================================================================

/// Search over a fixed set of indexes
///
/// Cheap to share; every call reads the live caches as they are when it
/// starts.
#[derive(Debug, Clone)]
pub struct Search {
    indexes: Vec<Arc<Index>>,
    options: SearchOptions,
}

impl Search {
    /// Search over the given indexes
    pub fn new(indexes: impl IntoIterator<Item = Arc<Index>>, options: SearchOptions) -> Self {
        Search {
            indexes: indexes.into_iter().collect(),
            options,
        }
    }

    /// Search over every index of a registry, in registration order
    pub fn over(registry: &Registry, options: SearchOptions) -> Self {
        Search::new(registry.indexes().iter().cloned(), options)
    }

    /// Indexes searched
    pub fn indexes(&self) -> &[Arc<Index>] {
        &self.indexes
    }

    /// Query-time settings
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Parse query text without searching
    pub fn parse(&self, text: &str) -> Query {
        Query::parse(text, &self.options)
    }

    /// Ranked ids for `text`, `limit` of them starting at `offset`
    pub fn search(&self, text: &str, limit: usize, offset: usize) -> SearchResults {
        let started = Instant::now();
        let query = self.parse(text);

        let allocations: Vec<Allocation> = self
            .indexes
            .iter()
            .flat_map(|index| allocate(index, &query, &self.options.weights))
            .collect();

        let mut hits = merge(&allocations);
        hits.sort_unstable_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        let total = hits.len();
        let page: Vec<Hit> = hits.into_iter().skip(offset).take(limit).collect();

        let duration = started.elapsed();
        tracing::debug!(
            target: "quarry::search",
            query = text,
            tokens = query.len(),
            allocations = allocations.len(),
            total,
            returned = page.len(),
            duration_us = duration.as_micros() as u64,
            "Search finished"
        );

        SearchResults {
            query: text.to_string(),
            tokens: query.texts(),
            ids: page.iter().map(|hit| hit.id).collect(),
            hits: page,
            total,
            offset,
            duration,
            allocations,
        }
    }
}

/// Sum weights per id across allocations of every index
fn merge(allocations: &[Allocation]) -> Vec<Hit> {
    let mut hits: FxHashMap<DocId, Hit> = FxHashMap::default();
    for (position, allocation) in allocations.iter().enumerate() {
        for &id in &allocation.ids {
            let hit = hits.entry(id).or_insert_with(|| Hit {
                id,
                score: 0,
                allocations: Vec::new(),
            });
            hit.score = hit.score.saturating_add(allocation.weight);
            hit.allocations.push(position);
        }
    }
    hits.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{library, places};
    use quarry_analysis::Partial;
    use quarry_engine::{Category, MemorySource};
    use std::path::Path;

    fn ids(results: &SearchResults) -> Vec<u64> {
        results.ids.iter().map(|id| id.as_u128() as u64).collect()
    }

    fn scores(results: &SearchResults) -> Vec<(u64, i64)> {
        results
            .hits
            .iter()
            .map(|hit| (hit.id.as_u128() as u64, hit.score))
            .collect()
    }

    fn search(root: &Path, weights: Weights) -> Search {
        let options = SearchOptions::new().unwrap().weights(weights);
        Search::new([Arc::new(library(root))], options)
    }

    fn weighted() -> Weights {
        Weights::new()
            .with(["author"], 6)
            .with(["title", "author"], 5)
            .with(["author", "year"], 2)
    }

    #[test]
    fn test_single_category_weight() {
        let dir = tempfile::tempdir().unwrap();
        let results = search(dir.path(), weighted()).search("author:tolkien", 20, 0);
        assert_eq!(scores(&results), [(1, 6), (2, 6)]);
        assert_eq!(results.total, 2);
    }

    #[test]
    fn test_combined_category_weight() {
        let dir = tempfile::tempdir().unwrap();
        let results = search(dir.path(), weighted()).search("author:tolkien year:1954", 20, 0);
        assert_eq!(scores(&results), [(1, 2)]);
    }

    #[test]
    fn test_scores_accumulate_across_combinations() {
        let dir = tempfile::tempdir().unwrap();
        // Unqualified: title -> 1, author -> 6
        let results = search(dir.path(), weighted()).search("tolkien", 20, 0);
        assert_eq!(scores(&results), [(1, 6), (2, 6), (4, 1)]);

        let results = search(dir.path(), weighted()).search("hobbit tolkien", 20, 0);
        assert_eq!(scores(&results), [(2, 5)]);
    }

    #[test]
    fn test_merged_scores_saturate() {
        let allocation = |category: &str, weight: i64| Allocation {
            index: "books".to_string(),
            result_identifier: "books".to_string(),
            categories: vec![category.to_string()],
            weight,
            ids: vec![DocId::new(1)],
            count: 1,
        };
        let hits = merge(&[
            allocation("title", i64::MAX),
            allocation("author", i64::MAX),
            allocation("year", 1),
        ]);
        assert_eq!(hits[0].score, i64::MAX);
        assert_eq!(hits[0].allocations, [0, 1, 2]);

        let hits = merge(&[allocation("title", i64::MIN), allocation("author", -1)]);
        assert_eq!(hits[0].score, i64::MIN);
    }

    #[test]
    fn test_ties_break_on_ascending_id() {
        let dir = tempfile::tempdir().unwrap();
        let results = search(dir.path(), Weights::new()).search("the", 20, 0);
        assert_eq!(ids(&results), [1, 2]);
    }

    #[test]
    fn test_phonetic_and_partial_lookups() {
        let dir = tempfile::tempdir().unwrap();
        let search = search(dir.path(), Weights::new());
        assert_eq!(ids(&search.search("by:tolkein~", 20, 0)), [1, 2]);
        assert_eq!(ids(&search.search("title:hob", 20, 0)), [2]);
        assert!(search.search("title:\"hob\"", 20, 0).is_empty());
    }

    #[test]
    fn test_qualifiers_ignore_case() {
        let dir = tempfile::tempdir().unwrap();
        let search = search(dir.path(), Weights::new());
        assert_eq!(ids(&search.search("Title:Dune", 20, 0)), [3]);
        assert_eq!(ids(&search.search("BY:\"Tolkien\"", 20, 0)), [1, 2]);
    }

    #[test]
    fn test_pagination() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MemorySource::new();
        for id in 1..=25u64 {
            source.push(id, [("title", format!("common {id}"))]);
        }
        let index = Index::builder("many", Arc::new(source))
            .category(Category::new("title"))
            .cache_root(dir.path())
            .build()
            .unwrap();
        index.index().unwrap();
        let search = Search::new([Arc::new(index)], SearchOptions::new().unwrap());

        let first = search.search("common", 20, 0);
        assert_eq!(first.len(), 20);
        assert_eq!(first.total, 25);
        assert_eq!(first.ids[0], DocId::new(1));

        let second = search.search("common", 20, 20);
        assert_eq!(ids(&second), [21, 22, 23, 24, 25]);
        assert_eq!(second.total, 25);
        assert_eq!(second.offset, 20);

        let beyond = search.search("common", 20, 40);
        assert!(beyond.is_empty());
        assert_eq!(beyond.total, 25);

        assert!(search.search("common", 0, 0).is_empty());
    }

    #[test]
    fn test_word_shorter_than_partial_minimum() {
        let dir = tempfile::tempdir().unwrap();
        let source = MemorySource::new()
            .record(1u64, [("title", "It")])
            .record(2u64, [("title", "Dune")]);
        let index = Index::builder("short", Arc::new(source))
            .category(Category::new("title").partial(Partial::Substring { from: -3 }))
            .cache_root(dir.path())
            .build()
            .unwrap();
        index.index().unwrap();
        let search = Search::new([Arc::new(index)], SearchOptions::new().unwrap());

        assert_eq!(ids(&search.search("it", 20, 0)), [1]);
        assert_eq!(ids(&search.search("it it", 20, 0)), [1]);
        assert_eq!(ids(&search.search("\"it\"", 20, 0)), [1]);
    }

    #[test]
    fn test_empty_source_returns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let index = Index::builder("empty", Arc::new(MemorySource::new()))
            .category(Category::new("title"))
            .cache_root(dir.path())
            .build()
            .unwrap();
        index.index().unwrap();
        assert!(index.category("title").unwrap().cache().is_empty());

        let search = Search::new([Arc::new(index)], SearchOptions::new().unwrap());
        let results = search.search("anything", 20, 0);
        assert!(results.is_empty());
        assert_eq!(results.total, 0);
    }

    #[test]
    fn test_malformed_queries_never_fail() {
        let dir = tempfile::tempdir().unwrap();
        let search = search(dir.path(), Weights::new());
        for text in ["", "   ", "::", ",:,", "\"", "*~*", "title:", "a:b:c", "☃"] {
            let results = search.search(text, 20, 0);
            assert_eq!(results.total, 0, "query {text:?}");
        }
    }

    #[test]
    fn test_multiple_indexes_merge_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let films = MemorySource::new()
            .record(2u64, [("title", "The Hobbit")])
            .record(9u64, [("title", "The Hobbit: Desolation")]);
        let films = Index::builder("films", Arc::new(films))
            .category(Category::new("title"))
            .result_identifier("movies")
            .cache_root(dir.path())
            .build()
            .unwrap();
        films.index().unwrap();

        let search = Search::new(
            [Arc::new(library(dir.path())), Arc::new(films)],
            SearchOptions::new().unwrap(),
        );
        let results = search.search("\"hobbit\"", 20, 0);
        assert_eq!(scores(&results), [(2, 2), (9, 1)]);
        assert_eq!(results.result_identifiers(&results.hits[0]), ["books", "movies"]);
        assert_eq!(results.result_identifiers(&results.hits[1]), ["movies"]);
    }

    #[test]
    fn test_geo_search() {
        let dir = tempfile::tempdir().unwrap();
        let search = Search::new([Arc::new(places(dir.path()))], SearchOptions::new().unwrap());
        assert_eq!(ids(&search.search("lat:46.948 lng:7.447", 20, 0)), [2]);
        assert!(search.search("lat:46.948", 20, 0).is_empty());
        assert!(search.search("lat:46.948 lng:8.54", 20, 0).is_empty());
    }

    #[test]
    fn test_search_sees_rebuilt_cache() {
        let dir = tempfile::tempdir().unwrap();
        let library = Arc::new(library(dir.path()));
        let search = Search::new([Arc::clone(&library)], SearchOptions::new().unwrap());
        assert_eq!(search.search("dune", 20, 0).total, 1);

        library.clear_caches().unwrap();
        assert_eq!(search.search("dune", 20, 0).total, 0);
    }

    #[test]
    fn test_options_from_config() {
        let mut config = EngineConfig::default();
        config.maximum_tokens = 2;
        let options = SearchOptions::from_config(&config).unwrap();
        assert_eq!(options.maximum_tokens, 2);
        assert!(options.partial_last_token);
        assert_eq!(Query::parse("a b c", &options).len(), 2);
    }
}
