//! File-level cache lifecycle
//!
//! [`CacheStore`] owns no in-memory state. It moves cache files between
//! the persisted and backup locations, verifies them and removes them.
//! The engine decides when to swap live caches.

use std::path::PathBuf;

use crate::atomic::{atomic_copy, remove_if_exists};
use crate::cache_file::CacheSection;
use crate::error::CacheFileError;
use crate::generation::{read_generation, write_generation, GenerationMarker};
use crate::layout::StoreLayout;
use crate::manifest::{load_manifest, write_manifest, IndexManifest};
use crate::reader::{load_cache_file, verify_cache_file, CacheFileSummary, LoadedCacheFile};
use crate::writer::{write_cache_file, CacheFileInfo};

/// Cache file operations for every index under one root
#[derive(Debug, Clone)]
pub struct CacheStore {
    layout: StoreLayout,
}

impl CacheStore {
    /// Store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CacheStore {
            layout: StoreLayout::new(root),
        }
    }

    /// Path resolution
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Create persisted and backup directories (idempotent)
    pub fn create_directory_structure(&self, index: &str) -> Result<(), CacheFileError> {
        self.layout.create_directories(index)?;
        Ok(())
    }

    /// Atomically write one category's cache file
    pub fn persist(
        &self,
        index: &str,
        category: &str,
        generation: u64,
        sections: &[CacheSection<'_>],
    ) -> Result<CacheFileInfo, CacheFileError> {
        write_cache_file(&self.layout.cache_path(index, category), generation, sections)
    }

    /// Atomically write the index manifest
    pub fn write_manifest(&self, manifest: &IndexManifest) -> Result<(), CacheFileError> {
        write_manifest(&self.layout.manifest_path(&manifest.index), manifest)
    }

    /// Read the index manifest
    pub fn manifest(&self, index: &str) -> Result<IndexManifest, CacheFileError> {
        load_manifest(&self.layout.manifest_path(index))
    }

    /// Stamp the index directory with a generation marker
    pub fn write_generation(&self, index: &str, generation: u64) -> Result<(), CacheFileError> {
        write_generation(
            &self.layout.generation_path(index),
            &GenerationMarker::now(generation),
        )
    }

    /// Read the index's generation marker, if any
    pub fn generation(&self, index: &str) -> Result<Option<GenerationMarker>, CacheFileError> {
        read_generation(&self.layout.generation_path(index))
    }

    /// Load a persisted cache file
    pub fn load(&self, index: &str, category: &str) -> Result<LoadedCacheFile, CacheFileError> {
        load_cache_file(&self.layout.cache_path(index, category))
    }

    /// Verify a persisted cache file without loading it
    pub fn verify(&self, index: &str, category: &str) -> Result<CacheFileSummary, CacheFileError> {
        verify_cache_file(&self.layout.cache_path(index, category))
    }

    /// Verify a category's backup without loading it
    pub fn verify_backup(
        &self,
        index: &str,
        category: &str,
    ) -> Result<CacheFileSummary, CacheFileError> {
        verify_cache_file(&self.layout.backup_path(index, category))
    }

    /// Copy the persisted file to the backup location
    ///
    /// The persisted file must exist and verify; a damaged file never
    /// replaces an existing backup. The live cache is never consulted.
    pub fn backup(&self, index: &str, category: &str) -> Result<u64, CacheFileError> {
        let from = self.layout.cache_path(index, category);
        verify_cache_file(&from)?;
        let bytes = atomic_copy(&from, &self.layout.backup_path(index, category))?;
        tracing::debug!(
            target: "quarry::durability",
            index,
            category,
            bytes,
            "Backed up cache file"
        );
        Ok(bytes)
    }

    /// Copy the backup over the persisted file, verify it and load it
    ///
    /// The backup is verified before anything is overwritten.
    pub fn restore(&self, index: &str, category: &str) -> Result<LoadedCacheFile, CacheFileError> {
        let from = self.layout.backup_path(index, category);
        verify_cache_file(&from)?;
        let to = self.layout.cache_path(index, category);
        atomic_copy(&from, &to)?;
        let loaded = load_cache_file(&to)?;
        tracing::debug!(
            target: "quarry::durability",
            index,
            category,
            generation = loaded.header.generation,
            "Restored cache file from backup"
        );
        Ok(loaded)
    }

    /// Delete a category's persisted file; backups are left alone
    pub fn remove(&self, index: &str, category: &str) -> Result<bool, CacheFileError> {
        Ok(remove_if_exists(&self.layout.cache_path(index, category))?)
    }

    /// Delete the index manifest
    pub fn remove_manifest(&self, index: &str) -> Result<bool, CacheFileError> {
        Ok(remove_if_exists(&self.layout.manifest_path(index))?)
    }

    /// Does a backup exist for the category?
    pub fn has_backup(&self, index: &str, category: &str) -> bool {
        self.layout.backup_path(index, category).exists()
    }
}
