//! On-disk layout of persisted caches
//!
//! ```text
//! <root>/<index>/<category>.qcache
//! <root>/<index>/index.manifest
//! <root>/<index>/GENERATION
//! <root>/backup/<index>/<category>.qcache
//! ```

use crate::cache_file::CACHE_FILE_EXTENSION;
use std::io;
use std::path::{Path, PathBuf};

/// Directory under the root that holds backups
pub const BACKUP_DIR: &str = "backup";
/// Manifest file name
pub const MANIFEST_FILE: &str = "index.manifest";
/// Generation marker file name
pub const GENERATION_FILE: &str = "GENERATION";

/// Resolves every path the store uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    /// Layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        StoreLayout { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of an index's persisted caches
    pub fn index_dir(&self, index: &str) -> PathBuf {
        self.root.join(index)
    }

    /// Persisted cache file of a category
    pub fn cache_path(&self, index: &str, category: &str) -> PathBuf {
        self.index_dir(index)
            .join(format!("{}.{}", category, CACHE_FILE_EXTENSION))
    }

    /// Index manifest
    pub fn manifest_path(&self, index: &str) -> PathBuf {
        self.index_dir(index).join(MANIFEST_FILE)
    }

    /// Generation marker
    pub fn generation_path(&self, index: &str) -> PathBuf {
        self.index_dir(index).join(GENERATION_FILE)
    }

    /// Directory of an index's backups
    pub fn backup_dir(&self, index: &str) -> PathBuf {
        self.root.join(BACKUP_DIR).join(index)
    }

    /// Backup file of a category
    pub fn backup_path(&self, index: &str, category: &str) -> PathBuf {
        self.backup_dir(index)
            .join(format!("{}.{}", category, CACHE_FILE_EXTENSION))
    }

    /// Create the persisted and backup directories of an index
    ///
    /// Idempotent.
    pub fn create_directories(&self, index: &str) -> io::Result<()> {
        std::fs::create_dir_all(self.index_dir(index))?;
        std::fs::create_dir_all(self.backup_dir(index))?;
        Ok(())
    }
}
