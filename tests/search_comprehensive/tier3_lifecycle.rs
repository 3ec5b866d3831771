//! Tier 3: Lifecycle
//!
//! Registry fan-out, snapshot ordering and the persisted cache round trips.

use super::test_utils::*;
use quarry::{
    CacheState, Category, DocId, Error, Index, IterableSource, MemorySource, Registry,
    SourceError, SourceRows,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Every (section, key, ids) of every category, sorted
fn content(index: &Index) -> Vec<(String, String, String, Vec<DocId>)> {
    let mut content = Vec::new();
    for category in index.categories() {
        let cache = category.cache();
        for section in cache.sections() {
            for (key, ids) in section.entries {
                content.push((
                    category.name().to_string(),
                    format!("{:?}", section.kind),
                    key.to_string(),
                    ids.to_vec(),
                ));
            }
        }
    }
    content.sort();
    content
}

// ============================================================================
// Build Ordering
// ============================================================================

/// Logs snapshot and iteration calls in order
struct LoggingSource {
    name: &'static str,
    inner: MemorySource,
    log: Arc<Mutex<Vec<String>>>,
}

impl IterableSource for LoggingSource {
    fn each<'a>(&'a self, field: &str) -> Result<SourceRows<'a>, SourceError> {
        self.log.lock().unwrap().push(format!("{}:each", self.name));
        self.inner.each(field)
    }

    fn take_snapshot(&self) -> Result<(), SourceError> {
        self.log.lock().unwrap().push(format!("{}:snapshot", self.name));
        Ok(())
    }
}

#[test]
fn test_tier3_snapshot_once_before_any_build() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut registry = Registry::new();
    for name in ["first", "second"] {
        let source = LoggingSource {
            name,
            inner: MemorySource::new().record(1u64, [("title", "Dune")]),
            log: Arc::clone(&log),
        };
        let index = Index::builder(name, Arc::new(source))
            .category(Category::new("title"))
            .cache_root(dir.path())
            .build()
            .unwrap();
        registry.register(index).unwrap();
    }

    assert!(registry.index_for_tests().is_ok());
    let log = log.lock().unwrap().clone();
    assert_eq!(
        log,
        ["first:snapshot", "second:snapshot", "first:each", "second:each"]
    );
    assert_eq!(registry.generation(), 1);
}

#[test]
fn test_tier3_register_order_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = built_registry(dir.path());
    let books = Arc::clone(&registry.indexes()[0]);
    assert_eq!(books.name(), "books");

    registry.clear();
    assert!(registry.is_empty());
    // The index itself keeps serving
    assert_eq!(books.state(), CacheState::Snapshotted);
    assert!(!books.category("title").unwrap().cache().is_empty());
}

// ============================================================================
// Backup / Restore / Check
// ============================================================================

#[test]
fn test_tier3_backup_clear_restore_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let books = Arc::clone(&registry.indexes()[0]);
    let search = weighted_search(&registry);
    let before = content(&books);
    let results = search.search("tolkien", 20, 0);

    assert!(registry.backup_caches().is_ok());
    assert!(registry.clear_caches().is_ok());
    assert!(content(&books).is_empty());
    assert_eq!(search.search("tolkien", 20, 0).total, 0);

    assert!(registry.restore_caches().is_ok());
    assert_eq!(books.state(), CacheState::Restored);
    assert_eq!(content(&books), before);
    assert_eq!(search.search("tolkien", 20, 0).hits, results.hits);
}

#[test]
fn test_tier3_check_detects_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let books = Arc::clone(&registry.indexes()[0]);
    assert!(registry.check_caches().iter().all(|report| report.is_ok()));
    assert!(registry.backup_caches().is_ok());

    let path = books.store().layout().cache_path("books", "author");
    let mut bytes = std::fs::read(&path).unwrap();
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xFF;
    std::fs::write(&path, &bytes).unwrap();

    let reports = registry.check_caches();
    let failed: Vec<_> = reports[0].failures().map(|c| c.category.as_str()).collect();
    assert_eq!(failed, ["author"]);
    assert_eq!(reports[0].failures().next().unwrap().path, path);
    assert!(reports[0].to_string().contains("FAILED"));

    // Loading refuses the corrupt file and keeps the live caches
    let err = books.load().unwrap_err();
    assert!(matches!(err, Error::CacheIntegrity { .. }));
    assert!(!books.category("author").unwrap().cache().is_empty());

    assert!(registry.restore_caches().is_ok());
    assert!(registry.check_caches()[0].is_ok());
}

#[test]
fn test_tier3_truncated_file_fails_check() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let books = Arc::clone(&registry.indexes()[0]);
    let path = books.store().layout().cache_path("books", "title");
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
    assert!(!registry.check_caches()[0].is_ok());
}

#[test]
fn test_tier3_restore_without_backup_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let registry = built_registry(dir.path());
    let books = Arc::clone(&registry.indexes()[0]);
    let before = content(&books);

    let report = registry.restore_caches();
    assert!(!report.is_ok());
    assert_eq!(content(&books), before);
}

#[test]
fn test_tier3_load_in_a_fresh_registry() {
    let dir = tempfile::tempdir().unwrap();
    let built = built_registry(dir.path());
    let expected = weighted_search(&built).search("tolkien", 20, 0);

    let mut fresh = Registry::new();
    fresh.register(library(dir.path())).unwrap();
    assert!(fresh.create_directory_structure().is_ok());
    assert!(fresh.create_directory_structure().is_ok());
    assert!(fresh.load().is_ok());
    assert_eq!(
        weighted_search(&fresh).search("tolkien", 20, 0).hits,
        expected.hits
    );
}

// ============================================================================
// Failure Isolation
// ============================================================================

/// Source that can be switched off
struct SwitchableSource {
    inner: MemorySource,
    down: AtomicBool,
}

impl IterableSource for SwitchableSource {
    fn each<'a>(&'a self, field: &str) -> Result<SourceRows<'a>, SourceError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("connection refused".to_string()));
        }
        self.inner.each(field)
    }
}

#[test]
fn test_tier3_failed_build_keeps_serving_and_spares_other_indexes() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(SwitchableSource {
        inner: MemorySource::new().record(7u64, [("title", "Solaris")]),
        down: AtomicBool::new(false),
    });
    let flaky = Index::builder("flaky", Arc::clone(&source) as Arc<dyn IterableSource>)
        .category(Category::new("title"))
        .cache_root(dir.path())
        .build()
        .unwrap();

    let mut registry = Registry::new();
    registry.register(flaky).unwrap();
    registry.register(library(dir.path())).unwrap();
    assert!(registry.index().is_ok());

    source.down.store(true, Ordering::SeqCst);
    let report = registry.index();
    let failed: Vec<_> = report.failures().map(|(name, _)| name).collect();
    assert_eq!(failed, ["flaky"]);
    assert!(matches!(
        report.failures().next().unwrap().1,
        Error::SourceIteration { .. }
    ));

    let search = weighted_search(&registry);
    assert_eq!(ids(&search.search("solaris", 20, 0)), [7]);
    assert_eq!(ids(&search.search("hobbit", 20, 0)), [2]);
}
