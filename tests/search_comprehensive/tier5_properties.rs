//! Tier 5: Properties
//!
//! Invariants that must hold for arbitrary input.

use super::test_utils::*;
use proptest::prelude::*;
use quarry::{Canonicalizer, Registry, Search, SearchOptions};
use std::sync::OnceLock;

/// One built registry shared by every case
fn fixture() -> &'static (tempfile::TempDir, Registry) {
    static FIXTURE: OnceLock<(tempfile::TempDir, Registry)> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let registry = built_registry(dir.path());
        (dir, registry)
    })
}

fn search() -> Search {
    weighted_search(&fixture().1)
}

proptest! {
    #[test]
    fn prop_search_never_panics(text in "\\PC{0,40}") {
        let results = search().search(&text, 10, 0);
        prop_assert!(results.len() <= 10);
        prop_assert!(results.len() <= results.total);
    }

    #[test]
    fn prop_ranking_is_ordered(text in "(tolkien|dune|the|herbert|hob|by:tolk|title:lord|year:1954)( (tolkien|dune|the|lord)){0,2}") {
        let results = search().search(&text, 100, 0);
        for pair in results.hits.windows(2) {
            prop_assert!(
                pair[0].score > pair[1].score
                    || (pair[0].score == pair[1].score && pair[0].id < pair[1].id)
            );
        }
    }

    #[test]
    fn prop_pages_are_slices_of_the_full_ranking(
        text in "(tolkien|the|dune|herbert|t)",
        limit in 0usize..5,
        offset in 0usize..8,
    ) {
        let search = search();
        let full = search.search(&text, usize::MAX, 0);
        let page = search.search(&text, limit, offset);
        prop_assert_eq!(page.total, full.total);
        let expected: Vec<_> = full.ids.iter().skip(offset).take(limit).copied().collect();
        prop_assert_eq!(page.ids, expected);
    }

    #[test]
    fn prop_canonicalizer_idempotent(text in "[A-Za-z\u{e0}-\u{ff}0-9 .,!?()'-]{0,60}") {
        let canonicalizer = Canonicalizer::for_indexing().unwrap();
        let once = canonicalizer.canonicalize(&text);
        let twice = canonicalizer.canonicalize(&once.join(" "));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_token_cap_holds(words in proptest::collection::vec("[a-z]{1,8}", 0..12), cap in 1usize..6) {
        let options = SearchOptions::new().unwrap().maximum_tokens(cap);
        let search = Search::over(&fixture().1, options);
        let query = search.parse(&words.join(" "));
        prop_assert!(query.len() <= cap);
        prop_assert_eq!(query.len() + query.dropped, words.len());
    }
}
