//! Indexes: a source, its categories and their cache lifecycle
//!
//! An [`Index`] is the unit of build, snapshot, backup and restore.
//! Lifecycle operations on one index are serialized; searches never
//! wait for them because they only clone the categories' live `Arc<Cache>`.
//!
//! # States
//!
//! ```text
//! Empty --index--> Built --persist--> Snapshotted --backup--> BackedUp
//!   ^                                     |                      |
//!   +--------------clear------------------+------restore----> Restored
//! ```

use crate::cache::Cache;
use crate::category::{check_name, BuildContext, BuildStats, Category};
use crate::config::DEFAULT_CACHE_ROOT;
use crate::source::IterableSource;
use parking_lot::Mutex;
use quarry_analysis::{Canonicalizer, RangeBucketing};
use quarry_core::{ConfigError, Error, KeyFormat, Result};
use quarry_durability::layout::BACKUP_DIR;
use quarry_durability::{
    CacheFileError, CacheFileSummary, CacheStore, IndexManifest, ManifestCategory,
};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================================
// States and reports
// ============================================================================

/// Where an index's caches stand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    /// Nothing built or loaded
    Empty,
    /// Live caches built, not yet persisted
    Built,
    /// Live caches match the persisted files
    Snapshotted,
    /// Persisted files copied to the backup location
    BackedUp,
    /// Live caches and persisted files restored from backup
    Restored,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheState::Empty => "empty",
            CacheState::Built => "built",
            CacheState::Snapshotted => "snapshotted",
            CacheState::BackedUp => "backed up",
            CacheState::Restored => "restored",
        };
        f.write_str(name)
    }
}

/// Two range categories searched together as one location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoPair {
    /// Position of the latitude category
    pub latitude: usize,
    /// Position of the longitude category
    pub longitude: usize,
}

impl GeoPair {
    /// The other axis, if `position` belongs to this pair
    pub fn partner(&self, position: usize) -> Option<usize> {
        if position == self.latitude {
            Some(self.longitude)
        } else if position == self.longitude {
            Some(self.latitude)
        } else {
            None
        }
    }
}

/// Outcome of one index build
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    /// Index name
    pub index: String,
    /// Generation the caches were built at
    pub generation: u64,
    /// Per category counters, in definition order
    pub categories: Vec<(String, BuildStats)>,
    /// Build and persist wall time
    #[serde(skip)]
    pub duration: Duration,
}

/// Verification outcome for one category
#[derive(Debug, Clone)]
pub struct CategoryCheck {
    /// Category name
    pub category: String,
    /// Persisted file that was checked
    pub path: PathBuf,
    /// Summary of a sound file, or why it failed
    pub outcome: std::result::Result<CacheFileSummary, String>,
}

/// Verification outcome for one index
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Index name
    pub index: String,
    /// One entry per category, in definition order
    pub categories: Vec<CategoryCheck>,
}

impl CheckReport {
    /// True when every category passed
    pub fn is_ok(&self) -> bool {
        self.categories.iter().all(|c| c.outcome.is_ok())
    }

    /// Categories that failed
    pub fn failures(&self) -> impl Iterator<Item = &CategoryCheck> {
        self.categories.iter().filter(|c| c.outcome.is_err())
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.categories {
            match &check.outcome {
                Ok(summary) => writeln!(
                    f,
                    "{}/{}: ok ({} keys, generation {})",
                    self.index,
                    check.category,
                    summary.total_entries(),
                    summary.header.generation
                )?,
                Err(reason) => writeln!(f, "{}/{}: FAILED {}", self.index, check.category, reason)?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// IndexBuilder
// ============================================================================

/// Builder for [`Index`]
///
/// Setters never fail; every check runs in [`IndexBuilder::build`].
pub struct IndexBuilder {
    name: String,
    source: Arc<dyn IterableSource>,
    categories: Vec<Category>,
    geo: Vec<(String, String)>,
    result_identifier: Option<String>,
    key_format: Option<KeyFormat>,
    canonicalizer: Option<Canonicalizer>,
    cache_root: PathBuf,
    pending: Option<ConfigError>,
}

impl IndexBuilder {
    /// Add a category
    pub fn category(mut self, category: Category) -> Self {
        self.categories.push(category);
        self
    }

    /// Add latitude and longitude range categories searched as one location
    ///
    /// Both axes get `radius_km / 111.32` degree buckets. A query that
    /// uses one axis of the pair must also use the other.
    pub fn geo_categories(
        mut self,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        radius_km: f64,
        precision: u32,
    ) -> Self {
        let (latitude, longitude) = (latitude.into(), longitude.into());
        match RangeBucketing::geo(radius_km, precision) {
            Ok(range) => {
                self.categories.push(Category::new(latitude.clone()).range(range));
                self.categories.push(Category::new(longitude.clone()).range(range));
                self.geo.push((latitude, longitude));
            }
            Err(e) => {
                self.pending.get_or_insert(ConfigError::InvalidStrategy {
                    category: latitude,
                    reason: e.reason,
                });
            }
        }
        self
    }

    /// Pair two existing range categories as one location
    pub fn geo_pair(mut self, latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        self.geo.push((latitude.into(), longitude.into()));
        self
    }

    /// Name reported with results (defaults to the index name)
    pub fn result_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.result_identifier = Some(identifier.into());
        self
    }

    /// Key format (defaults to the source's suggestion, then integers)
    pub fn key_format(mut self, key_format: KeyFormat) -> Self {
        self.key_format = Some(key_format);
        self
    }

    /// Indexing pipeline shared by the categories
    pub fn canonicalizer(mut self, canonicalizer: Canonicalizer) -> Self {
        self.canonicalizer = Some(canonicalizer);
        self
    }

    /// Directory holding persisted caches and backups
    pub fn cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = root.into();
        self
    }

    /// Validate the definition
    pub fn build(self) -> std::result::Result<Index, ConfigError> {
        if let Some(err) = self.pending {
            return Err(err);
        }
        check_name("index", &self.name)?;
        if self.name == BACKUP_DIR {
            return Err(ConfigError::InvalidName {
                kind: "index",
                name: self.name,
                reason: "reserved for backups",
            });
        }
        if self.categories.is_empty() {
            return Err(ConfigError::MissingParameter {
                component: format!("index {}", self.name),
                parameter: "categories",
            });
        }

        let mut positions: FxHashMap<&str, usize> = FxHashMap::default();
        let mut qualifiers: FxHashMap<String, usize> = FxHashMap::default();
        for (position, category) in self.categories.iter().enumerate() {
            category.validate()?;
            if positions.insert(category.name(), position).is_some() {
                return Err(ConfigError::DuplicateName {
                    kind: "category",
                    name: category.name().to_string(),
                });
            }
            for qualifier in category.qualifier_names().iter() {
                if let Some(&first) = qualifiers.get(qualifier) {
                    return Err(ConfigError::AmbiguousQualifier {
                        index: self.name.clone(),
                        qualifier: qualifier.clone(),
                        first: self.categories[first].name().to_string(),
                        second: category.name().to_string(),
                    });
                }
                qualifiers.insert(qualifier.clone(), position);
            }
        }

        let mut geo_pairs = Vec::with_capacity(self.geo.len());
        let mut paired = vec![false; self.categories.len()];
        for (latitude, longitude) in &self.geo {
            let resolve = |name: &str| -> std::result::Result<usize, ConfigError> {
                let invalid = |reason: &str| ConfigError::InvalidStrategy {
                    category: name.to_string(),
                    reason: reason.to_string(),
                };
                let &position = positions
                    .get(name)
                    .ok_or_else(|| invalid("geo axis names no category of this index"))?;
                if !self.categories[position].expansion_strategy().is_range() {
                    return Err(invalid("geo axis must be a range category"));
                }
                Ok(position)
            };
            let pair = GeoPair {
                latitude: resolve(latitude.as_str())?,
                longitude: resolve(longitude.as_str())?,
            };
            for axis in [pair.latitude, pair.longitude] {
                if std::mem::replace(&mut paired[axis], true) {
                    return Err(ConfigError::InvalidStrategy {
                        category: self.categories[axis].name().to_string(),
                        reason: "category belongs to more than one geo pair".to_string(),
                    });
                }
            }
            geo_pairs.push(pair);
        }

        let canonicalizer = match self.canonicalizer {
            Some(canonicalizer) => canonicalizer,
            None => Canonicalizer::for_indexing()?,
        };
        let key_format = self
            .key_format
            .or_else(|| self.source.key_format())
            .unwrap_or_default();

        Ok(Index {
            result_identifier: self.result_identifier.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            source: self.source,
            categories: self.categories,
            qualifiers,
            geo_pairs,
            key_format,
            canonicalizer,
            store: CacheStore::new(self.cache_root),
            state: Mutex::new(CacheState::Empty),
            generation: AtomicU64::new(0),
        })
    }
}

// ============================================================================
// Index
// ============================================================================

/// A source and the categories harvested from it
pub struct Index {
    name: String,
    result_identifier: String,
    source: Arc<dyn IterableSource>,
    categories: Vec<Category>,
    qualifiers: FxHashMap<String, usize>,
    geo_pairs: Vec<GeoPair>,
    key_format: KeyFormat,
    canonicalizer: Canonicalizer,
    store: CacheStore,
    state: Mutex<CacheState>,
    generation: AtomicU64,
}

impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("name", &self.name)
            .field("source", &self.source.describe())
            .field("categories", &self.categories.len())
            .field("key_format", &self.key_format)
            .field("state", &self.state.try_lock().map(|state| *state))
            .finish()
    }
}

impl Index {
    /// Start defining an index
    pub fn builder(name: impl Into<String>, source: Arc<dyn IterableSource>) -> IndexBuilder {
        IndexBuilder {
            name: name.into(),
            source,
            categories: Vec::new(),
            geo: Vec::new(),
            result_identifier: None,
            key_format: None,
            canonicalizer: None,
            cache_root: PathBuf::from(DEFAULT_CACHE_ROOT),
            pending: None,
        }
    }

    /// Index name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name reported with results
    pub fn result_identifier(&self) -> &str {
        &self.result_identifier
    }

    /// Categories in definition order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category by name
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name() == name)
    }

    /// Position of the category a qualifier routes to
    pub fn qualified_category(&self, qualifier: &str) -> Option<usize> {
        self.qualifiers.get(qualifier).copied()
    }

    /// Geo pairs, by category position
    pub fn geo_pairs(&self) -> &[GeoPair] {
        &self.geo_pairs
    }

    /// Effective key format
    pub fn key_format(&self) -> KeyFormat {
        self.key_format
    }

    /// Cache file store
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Current lifecycle state
    pub fn state(&self) -> CacheState {
        *self.state.lock()
    }

    /// Generation the next build runs at
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Live caches of every category, in definition order
    pub fn caches(&self) -> Vec<Arc<Cache>> {
        self.categories.iter().map(Category::cache).collect()
    }

    /// Stamp a new generation and let the source take its snapshot
    pub fn take_snapshot(&self, generation: u64) -> Result<()> {
        let _state = self.state.lock();
        self.store
            .create_directory_structure(&self.name)
            .map_err(|e| self.store_error(self.store.layout().index_dir(&self.name), e))?;
        self.store
            .write_generation(&self.name, generation)
            .map_err(|e| self.store_error(self.store.layout().generation_path(&self.name), e))?;
        self.source
            .take_snapshot()
            .map_err(|e| Error::source_iteration(&self.name, "(snapshot)", e.to_string()))?;
        self.generation.store(generation, Ordering::Release);
        tracing::debug!(target: "quarry::index", index = %self.name, generation, "Took snapshot");
        Ok(())
    }

    /// Build every category and, if all succeed, persist and swap
    ///
    /// The new caches go live only once they are on disk, so a failing
    /// source or a failed write leaves the previous caches serving.
    pub fn index(&self) -> Result<IndexReport> {
        let mut state = self.state.lock();
        let started = Instant::now();
        let generation = self.generation();
        let ctx = BuildContext {
            index: &self.name,
            source: self.source.as_ref(),
            canonicalizer: &self.canonicalizer,
            key_format: self.key_format,
            generation,
        };

        let built: Vec<Result<(Cache, BuildStats)>> =
            self.categories.par_iter().map(|c| c.build(&ctx)).collect();
        let built = match built.into_iter().collect::<Result<Vec<_>>>() {
            Ok(built) => built,
            Err(e) => {
                tracing::warn!(
                    target: "quarry::index",
                    index = %self.name,
                    error = %e,
                    "Index build failed, previous caches keep serving"
                );
                return Err(e);
            }
        };

        let mut caches = Vec::with_capacity(built.len());
        let mut categories = Vec::with_capacity(built.len());
        for (category, (cache, stats)) in self.categories.iter().zip(built) {
            caches.push(Arc::new(cache));
            categories.push((category.name().to_string(), stats));
        }
        *state = CacheState::Built;

        if let Err(e) = self.persist(generation, &caches) {
            tracing::warn!(
                target: "quarry::index",
                index = %self.name,
                error = %e,
                "Persisting failed, previous caches keep serving"
            );
            return Err(e);
        }
        for (category, cache) in self.categories.iter().zip(caches) {
            category.swap(cache);
        }
        *state = CacheState::Snapshotted;

        let report = IndexReport {
            index: self.name.clone(),
            generation,
            categories,
            duration: started.elapsed(),
        };
        tracing::info!(
            target: "quarry::index",
            index = %self.name,
            generation,
            categories = report.categories.len(),
            duration_us = report.duration.as_micros() as u64,
            "Indexed"
        );
        Ok(report)
    }

    fn persist(&self, generation: u64, caches: &[Arc<Cache>]) -> Result<()> {
        self.create_directory_structure()?;
        let mut entries = Vec::with_capacity(caches.len());
        let mut created_at_micros = 0;
        for (category, cache) in self.categories.iter().zip(caches) {
            let info = self
                .store
                .persist(&self.name, category.name(), generation, &cache.sections())
                .map_err(|e| self.category_error(category, e))?;
            created_at_micros = created_at_micros.max(info.created_at_micros);
            entries.push(manifest_entry(category.name(), cache, info.crc));
        }
        self.write_manifest(generation, created_at_micros, entries)
    }

    fn write_manifest(
        &self,
        generation: u64,
        created_at_micros: u64,
        categories: Vec<ManifestCategory>,
    ) -> Result<()> {
        let manifest = IndexManifest {
            index: self.name.clone(),
            generation,
            created_at_micros,
            categories,
        };
        self.store
            .write_manifest(&manifest)
            .map_err(|e| self.store_error(self.store.layout().manifest_path(&self.name), e))
    }

    /// Manifest of the persisted caches
    pub fn manifest(&self) -> Result<IndexManifest> {
        self.store
            .manifest(&self.name)
            .map_err(|e| self.store_error(self.store.layout().manifest_path(&self.name), e))
    }

    /// Copy every persisted cache file to the backup location
    ///
    /// Never touches the live caches. Every persisted file is verified
    /// before any backup is overwritten, so a missing or damaged file
    /// leaves all previous backups in place.
    pub fn backup_caches(&self) -> Result<()> {
        let mut state = self.state.lock();
        for category in &self.categories {
            self.store
                .verify(&self.name, category.name())
                .map_err(|e| self.category_error(category, e))?;
        }
        self.create_directory_structure()?;
        for category in &self.categories {
            self.store
                .backup(&self.name, category.name())
                .map_err(|e| self.category_error(category, e))?;
        }
        *state = CacheState::BackedUp;
        tracing::info!(target: "quarry::index", index = %self.name, "Backed up caches");
        Ok(())
    }

    /// Copy the backups over the persisted files and swap them live
    ///
    /// Every backup is verified before any file is overwritten.
    pub fn restore_caches(&self) -> Result<()> {
        let mut state = self.state.lock();
        for category in &self.categories {
            self.store
                .verify_backup(&self.name, category.name())
                .map_err(|e| {
                    self.store_error(
                        self.store.layout().backup_path(&self.name, category.name()),
                        e,
                    )
                })?;
        }

        let mut caches = Vec::with_capacity(self.categories.len());
        let mut entries = Vec::with_capacity(self.categories.len());
        let mut generation = 0;
        let mut created_at_micros = 0;
        for category in &self.categories {
            let loaded = self
                .store
                .restore(&self.name, category.name())
                .map_err(|e| self.category_error(category, e))?;
            generation = generation.max(loaded.header.generation);
            created_at_micros = created_at_micros.max(loaded.header.created_at_micros);
            let crc = loaded.crc;
            let cache = Cache::from_loaded(loaded);
            entries.push(manifest_entry(category.name(), &cache, crc));
            caches.push(cache);
        }
        self.write_manifest(generation, created_at_micros, entries)?;

        for (category, cache) in self.categories.iter().zip(caches) {
            category.swap(Arc::new(cache));
        }
        *state = CacheState::Restored;
        tracing::info!(target: "quarry::index", index = %self.name, generation, "Restored caches");
        Ok(())
    }

    /// Verify every persisted cache file
    ///
    /// Never stops early and never builds in-memory maps.
    pub fn check_caches(&self) -> CheckReport {
        let categories = self
            .categories
            .iter()
            .map(|category| CategoryCheck {
                category: category.name().to_string(),
                path: self.store.layout().cache_path(&self.name, category.name()),
                outcome: self
                    .store
                    .verify(&self.name, category.name())
                    .map_err(|e| e.to_string()),
            })
            .collect();
        let report = CheckReport {
            index: self.name.clone(),
            categories,
        };
        for failure in report.failures() {
            tracing::warn!(
                target: "quarry::index",
                index = %self.name,
                category = %failure.category,
                path = %failure.path.display(),
                "Cache check failed"
            );
        }
        report
    }

    /// Delete the persisted files and empty the live caches
    ///
    /// Backups survive.
    pub fn clear_caches(&self) -> Result<()> {
        let mut state = self.state.lock();
        for category in &self.categories {
            self.store
                .remove(&self.name, category.name())
                .map_err(|e| self.category_error(category, e))?;
        }
        self.store
            .remove_manifest(&self.name)
            .map_err(|e| self.store_error(self.store.layout().manifest_path(&self.name), e))?;
        for category in &self.categories {
            category.swap(Arc::new(Cache::empty()));
        }
        *state = CacheState::Empty;
        tracing::info!(target: "quarry::index", index = %self.name, "Cleared caches");
        Ok(())
    }

    /// Create the persisted and backup directories (idempotent)
    pub fn create_directory_structure(&self) -> Result<()> {
        self.store
            .create_directory_structure(&self.name)
            .map_err(|e| self.store_error(self.store.layout().index_dir(&self.name), e))
    }

    /// Load the persisted caches without touching the source
    ///
    /// All or nothing: a single unreadable file leaves every live cache as is.
    pub fn load(&self) -> Result<()> {
        let mut state = self.state.lock();
        let caches = self
            .categories
            .iter()
            .map(|category| {
                self.store
                    .load(&self.name, category.name())
                    .map(Cache::from_loaded)
                    .map_err(|e| self.category_error(category, e))
            })
            .collect::<Result<Vec<_>>>()?;
        for (category, cache) in self.categories.iter().zip(caches) {
            category.swap(Arc::new(cache));
        }
        *state = CacheState::Snapshotted;
        tracing::info!(target: "quarry::index", index = %self.name, "Loaded caches");
        Ok(())
    }

    fn category_error(&self, category: &Category, err: CacheFileError) -> Error {
        self.store_error(
            self.store.layout().cache_path(&self.name, category.name()),
            err,
        )
    }

    fn store_error(&self, path: PathBuf, err: CacheFileError) -> Error {
        match err {
            CacheFileError::Io(e) => Error::Io(e),
            CacheFileError::Serialization(reason) => Error::Serialization(reason),
            other => Error::cache_integrity(path, other.to_string()),
        }
    }
}

fn manifest_entry(name: &str, cache: &Cache, crc: u32) -> ManifestCategory {
    let stats = cache.stats();
    ManifestCategory {
        name: name.to_string(),
        exact_keys: stats.exact_keys as u64,
        partial_keys: stats.partial_keys as u64,
        similar_keys: stats.similar_keys as u64,
        crc,
    }
}
