//! Tier 4: Configuration
//!
//! `quarry.toml` declared indexes, built and searched end to end.

use super::test_utils::*;
use quarry::{
    ConfigError, DocId, EngineConfig, IterableSource, KeyFormat, Search, SearchOptions, Weights,
};
use std::path::Path;
use std::sync::Arc;

const BOOKS_JSON: &str = r#"{
    "total_rows": 4, "offset": 0,
    "rows": [
        {"id": "0a", "doc": {"_id": "0a", "title": "The Hobbit", "author": "Tolkien", "year": 1937}},
        {"id": "0b", "doc": {"_id": "0b", "title": "The Lord of the Rings", "author": "Tolkien", "year": 1954}},
        {"id": "1f", "doc": {"_id": "1f", "title": "Dune", "author": "Herbert", "year": 1965}},
        {"id": "20", "doc": {"_id": "20", "title": "Solaris", "author": "Lem", "year": 1961}}
    ]
}"#;

fn write_config(dir: &Path) -> std::path::PathBuf {
    std::fs::write(dir.join("books.json"), BOOKS_JSON).unwrap();
    let toml = format!(
        r#"
cache_root = '{root}'
maximum_tokens = 4

[[index]]
name = "books"
result_identifier = "book"
source = {{ type = "document", location = '{books}' }}

[[index.category]]
name = "title"
partial = {{ substring = {{ from = -1 }} }}

[[index.category]]
name = "author"
qualifiers = ["author", "by"]
similarity = {{ double_metaphone = {{ amount = 3 }} }}

[[index.category]]
name = "decade"
from = "year"
range = {{ bucket_size = 10.0, precision = 0 }}
"#,
        root = dir.join("cache").display(),
        books = dir.join("books.json").display(),
    );
    let path = dir.join("quarry.toml");
    std::fs::write(&path, toml).unwrap();
    path
}

fn hex(raw: &str) -> u128 {
    u128::from_str_radix(raw, 16).unwrap()
}

#[test]
fn test_tier4_declared_registry_builds_and_searches() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::from_file(&write_config(dir.path())).unwrap();
    let registry = config.registry().unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.indexes()[0].key_format(), KeyFormat::Hex);

    assert!(registry.index().is_ok());
    assert!(dir.path().join("cache").join("books").join("title.qcache").exists());

    let options = SearchOptions::from_config(&config)
        .unwrap()
        .weights(Weights::new().with(["author"], 3));
    let search = Search::over(&registry, options);

    let results = search.search("by:tolkin~", 10, 0);
    assert_eq!(ids(&results), [hex("0a"), hex("0b")]);
    assert_eq!(results.hits[0].score, 3);
    assert_eq!(results.allocations[0].result_identifier, "book");

    // Callers reverse hex keys themselves
    assert_eq!(format!("{:x}", results.ids[1].as_u128()), "b");

    // 1950-1959 share a decade bucket
    assert_eq!(ids(&search.search("decade:1950", 10, 0)), [hex("0b")]);
    assert_eq!(ids(&search.search("decade:1963", 10, 0)), [hex("1f"), hex("20")]);
    assert_eq!(ids(&search.search("lord decade:1954", 10, 0)), [hex("0b")]);
}

#[test]
fn test_tier4_config_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::from_file(&write_config(dir.path())).unwrap();
    let copy = dir.path().join("copy.toml");
    config.write_to_file(&copy).unwrap();
    assert_eq!(EngineConfig::from_file(&copy).unwrap(), config);
}

#[test]
fn test_tier4_open_writes_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::open(dir.path()).unwrap();
    assert_eq!(config, EngineConfig::default());
    assert!(dir.path().join("quarry.toml").exists());
    assert!(config.registry().unwrap().is_empty());
}

#[test]
fn test_tier4_configuration_errors() {
    let parse = |toml: &str| -> EngineConfig { toml::from_str(toml).unwrap() };

    let missing_location = parse(
        r#"
[[index]]
name = "books"
source = { type = "document" }
[[index.category]]
name = "title"
"#,
    );
    assert!(matches!(
        missing_location.registry().unwrap_err(),
        ConfigError::MissingParameter { parameter: "location", .. }
    ));

    let ambiguous = parse(
        r#"
[[index]]
name = "books"
source = { type = "document", location = "books.json" }
[[index.category]]
name = "title"
qualifiers = ["t"]
[[index.category]]
name = "tags"
qualifiers = ["t"]
"#,
    );
    assert!(matches!(
        ambiguous.registry().unwrap_err(),
        ConfigError::AmbiguousQualifier { .. }
    ));

    let range_with_partial = parse(
        r#"
[[index]]
name = "books"
source = { type = "document", location = "books.json" }
[[index.category]]
name = "price"
range = { bucket_size = 5.0, precision = 1 }
partial = { substring = { from = 2 } }
"#,
    );
    assert!(matches!(
        range_with_partial.registry().unwrap_err(),
        ConfigError::InvalidStrategy { .. }
    ));

    let no_source = parse(
        r#"
[[index]]
name = "books"
[[index.category]]
name = "title"
"#,
    );
    assert!(matches!(
        no_source.registry().unwrap_err(),
        ConfigError::MissingParameter { parameter: "source", .. }
    ));
}

#[test]
fn test_tier4_explicit_source_overrides_declaration() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EngineConfig::from_file(&write_config(dir.path())).unwrap();
    config.indexes[0].categories.truncate(1);
    let registry = config
        .registry_with(|_| Some(Arc::new(library_source()) as Arc<dyn IterableSource>))
        .unwrap();
    assert!(registry.index().is_ok());
    let search = Search::over(&registry, SearchOptions::new().unwrap());
    let results = search.search("hobbit", 10, 0);
    assert_eq!(results.ids, [DocId::new(2)]);
}
