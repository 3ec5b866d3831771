//! Registry of indexes
//!
//! The registry owns the build generation counter and fans lifecycle
//! operations out to every index in registration order. A failing index
//! never stops the others: outcomes are collected into a
//! [`LifecycleReport`].

use crate::index::{CheckReport, Index, IndexReport};
use quarry_core::{ConfigError, Error};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Per-index outcomes of one registry operation
#[derive(Debug)]
pub struct LifecycleReport<T = ()> {
    /// Operation name, for logs
    pub operation: &'static str,
    /// `(index name, outcome)` in registration order
    pub outcomes: Vec<(String, Result<T, Error>)>,
}

impl<T> LifecycleReport<T> {
    fn new(operation: &'static str) -> Self {
        LifecycleReport {
            operation,
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, index: &Index, outcome: Result<T, Error>) {
        if let Err(e) = &outcome {
            tracing::warn!(
                target: "quarry::registry",
                operation = self.operation,
                index = index.name(),
                error = %e,
                "Lifecycle operation failed"
            );
        }
        self.outcomes.push((index.name().to_string(), outcome));
    }

    /// True when every index succeeded
    pub fn is_ok(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_ok())
    }

    /// Failed indexes and their errors
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|(index, outcome)| outcome.as_ref().err().map(|e| (index.as_str(), e)))
    }

    /// Successful outcomes, or the first error
    pub fn into_result(self) -> Result<Vec<T>, Error> {
        self.outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

/// Ordered set of indexes
#[derive(Debug, Default)]
pub struct Registry {
    indexes: Vec<Arc<Index>>,
    generation: AtomicU64,
}

impl Registry {
    /// Empty registry at generation 0
    pub fn new() -> Self {
        Registry::default()
    }

    /// Add an index; names must be unique
    pub fn register(&mut self, index: impl Into<Arc<Index>>) -> Result<Arc<Index>, ConfigError> {
        let index = index.into();
        if self.find(index.name()).is_some() {
            return Err(ConfigError::DuplicateName {
                kind: "index",
                name: index.name().to_string(),
            });
        }
        tracing::debug!(target: "quarry::registry", index = index.name(), "Registered index");
        self.indexes.push(Arc::clone(&index));
        Ok(index)
    }

    /// Indexes in registration order
    pub fn indexes(&self) -> &[Arc<Index>] {
        &self.indexes
    }

    /// Index by name
    pub fn find(&self, name: &str) -> Option<&Arc<Index>> {
        self.indexes.iter().find(|index| index.name() == name)
    }

    /// Forget every index; caches and files are left alone
    pub fn clear(&mut self) {
        self.indexes.clear();
    }

    /// Number of registered indexes
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Latest generation handed out by [`Registry::take_snapshot`]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Start a new generation on every index
    pub fn take_snapshot(&self) -> LifecycleReport {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(target: "quarry::registry", generation, "Taking snapshot");
        self.each("take_snapshot", |index| index.take_snapshot(generation))
    }

    /// Take a snapshot, then build every index
    ///
    /// Indexes whose snapshot failed are not built; their snapshot error
    /// is reported instead.
    pub fn index(&self) -> LifecycleReport<IndexReport> {
        let snapshot = self.take_snapshot();
        let mut report = LifecycleReport::new("index");
        for (index, (_, snapshotted)) in self.indexes.iter().zip(snapshot.outcomes) {
            let outcome = snapshotted.and_then(|()| index.index());
            report.record(index, outcome);
        }
        report
    }

    /// Same pipeline as [`Registry::index`], for test setup
    pub fn index_for_tests(&self) -> LifecycleReport<IndexReport> {
        self.index()
    }

    /// Back up every index's persisted caches
    pub fn backup_caches(&self) -> LifecycleReport {
        self.each("backup_caches", Index::backup_caches)
    }

    /// Restore every index from its backups
    pub fn restore_caches(&self) -> LifecycleReport {
        self.each("restore_caches", Index::restore_caches)
    }

    /// Verify every index's persisted caches
    pub fn check_caches(&self) -> Vec<CheckReport> {
        self.indexes.iter().map(|index| index.check_caches()).collect()
    }

    /// Delete persisted caches and empty the live ones, everywhere
    pub fn clear_caches(&self) -> LifecycleReport {
        self.each("clear_caches", Index::clear_caches)
    }

    /// Create every index's directories
    pub fn create_directory_structure(&self) -> LifecycleReport {
        self.each("create_directory_structure", Index::create_directory_structure)
    }

    /// Load every index's persisted caches
    pub fn load(&self) -> LifecycleReport {
        self.each("load", Index::load)
    }

    fn each<T>(
        &self,
        operation: &'static str,
        run: impl Fn(&Index) -> Result<T, Error>,
    ) -> LifecycleReport<T> {
        let mut report = LifecycleReport::new(operation);
        for index in &self.indexes {
            report.record(index, run(index.as_ref()));
        }
        report
    }
}
