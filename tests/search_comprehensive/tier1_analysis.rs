//! Tier 1: Analysis
//!
//! Canonicalization and expansion as seen from indexing and searching.

use super::test_utils::*;
use quarry::{
    double_metaphone, metaphone, Canonicalizer, CanonicalizerConfig, Category, CharacterSubstituter,
    Index, MemorySource, Partial, Search, SearchOptions,
};
use std::sync::Arc;

// ============================================================================
// Phonetic Vectors
// ============================================================================

#[test]
fn test_tier1_metaphone_vectors() {
    assert_eq!(metaphone("meier"), "MR");
    assert_eq!(metaphone("grossberger"), "KRSBRJR");
    assert_eq!(metaphone("hadelbla"), "HTLBL");
}

#[test]
fn test_tier1_double_metaphone_vectors() {
    assert_eq!(double_metaphone("Smith"), ("SM0".to_string(), "XMT".to_string()));
    assert_eq!(double_metaphone("Schmidt"), ("XMT".to_string(), "SMT".to_string()));
    assert_eq!(double_metaphone("Knight"), ("NT".to_string(), "NT".to_string()));
    assert_eq!(double_metaphone("Thomas"), ("TMS".to_string(), "TMS".to_string()));
}

// ============================================================================
// Canonicalization
// ============================================================================

#[test]
fn test_tier1_canonicalizer_idempotent_on_canonical_tokens() {
    let canonicalizer = Canonicalizer::for_indexing().unwrap();
    let once = canonicalizer.canonicalize("The Lord of the Rings, Vol. 1 (1954)");
    let twice = canonicalizer.canonicalize(&once.join(" "));
    assert_eq!(once, twice);
}

#[test]
fn test_tier1_partial_keys() {
    let suffixes = Partial::substring(1).unwrap().keys("title");
    assert_eq!(suffixes, ["title", "itle", "tle", "le", "e"]);

    let prefixes = Partial::substring(-2).unwrap().keys("author");
    assert_eq!(prefixes, ["author", "autho", "auth", "aut", "au"]);
}

/// The same substituter on both sides lets `müller` find `Mueller`
#[test]
fn test_tier1_substitution_applies_to_queries_and_records() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let indexing = CanonicalizerConfig::indexing().with_substituter(CharacterSubstituter::WestEuropean);
    let searching =
        CanonicalizerConfig::searching().with_substituter(CharacterSubstituter::WestEuropean);

    let source = MemorySource::new()
        .record(1u64, [("name", "Müller")])
        .record(2u64, [("name", "Mueller")]);
    let index = Index::builder("people", Arc::new(source))
        .category(Category::new("name"))
        .canonicalizer(Canonicalizer::new(&indexing).unwrap())
        .cache_root(dir.path())
        .build()
        .unwrap();
    index.index().unwrap();

    let options = SearchOptions::new()
        .unwrap()
        .canonicalizer(Canonicalizer::new(&searching).unwrap());
    let search = Search::new([Arc::new(index)], options);
    assert_eq!(ids(&search.search("müller", 10, 0)), [1, 2]);
    assert_eq!(ids(&search.search("MUELLER", 10, 0)), [1, 2]);
}

/// Query text goes through the searching pipeline, records through the
/// indexing one
#[test]
fn test_tier1_punctuation_is_ignored_both_ways() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let search = weighted_search(&registry);
    assert_eq!(ids(&search.search("J.R.R.", 10, 0)), [1]);
    assert_eq!(ids(&search.search("(Dune)!", 10, 0)), [3, 5]);
}
