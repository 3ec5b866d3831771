//! Index manifest
//!
//! The manifest (`index.manifest`) records which categories an index
//! persisted, at which generation, and how many keys each section holds.
//! Layout: magic `QMNF` + version u32 + MessagePack payload.
//! Written atomically after all of the index's cache files.

use crate::atomic::atomic_write;
use crate::error::CacheFileError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Magic bytes for the index manifest
const MANIFEST_MAGIC: &[u8; 4] = b"QMNF";
/// Current manifest version
const MANIFEST_VERSION: u32 = 1;

/// Serializable description of an index's persisted state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Index name
    pub index: String,
    /// Generation the caches were built at
    pub generation: u64,
    /// When the manifest was written (microseconds since epoch)
    pub created_at_micros: u64,
    /// One entry per category, in definition order
    pub categories: Vec<ManifestCategory>,
}

/// Manifest entry for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestCategory {
    /// Category name
    pub name: String,
    /// Keys in the exact section
    pub exact_keys: u64,
    /// Keys in the partial section
    pub partial_keys: u64,
    /// Keys in the similar section
    pub similar_keys: u64,
    /// CRC32 of the category's cache file
    pub crc: u32,
}

impl IndexManifest {
    /// Find a category entry
    pub fn category(&self, name: &str) -> Option<&ManifestCategory> {
        self.categories.iter().find(|c| c.name == name)
    }
}

/// Write the manifest atomically
pub fn write_manifest(path: &Path, manifest: &IndexManifest) -> Result<(), CacheFileError> {
    let payload =
        rmp_serde::to_vec(manifest).map_err(|e| CacheFileError::Serialization(e.to_string()))?;

    let mut buf = Vec::with_capacity(8 + payload.len());
    buf.extend_from_slice(MANIFEST_MAGIC);
    buf.extend_from_slice(&MANIFEST_VERSION.to_le_bytes());
    buf.extend_from_slice(&payload);

    atomic_write(path, &buf)?;
    Ok(())
}

/// Load a manifest
pub fn load_manifest(path: &Path) -> Result<IndexManifest, CacheFileError> {
    let buf = match std::fs::read(path) {
        Ok(buf) => buf,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CacheFileError::Missing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    if buf.len() < 8 {
        return Err(CacheFileError::FileTooSmall { size: buf.len() });
    }
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&buf[0..4]);
    if &magic != MANIFEST_MAGIC {
        return Err(CacheFileError::InvalidMagic {
            expected: *MANIFEST_MAGIC,
            actual: magic,
        });
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&buf[4..8]);
    let version = u32::from_le_bytes(version);
    if version != MANIFEST_VERSION {
        return Err(CacheFileError::UnsupportedVersion(version));
    }
    rmp_serde::from_slice(&buf[8..]).map_err(|e| CacheFileError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> IndexManifest {
        IndexManifest {
            index: "books".into(),
            generation: 3,
            created_at_micros: 1_700_000_000_000_000,
            categories: vec![
                ManifestCategory {
                    name: "title".into(),
                    exact_keys: 120,
                    partial_keys: 800,
                    similar_keys: 0,
                    crc: 0xDEADBEEF,
                },
                ManifestCategory {
                    name: "author".into(),
                    exact_keys: 40,
                    partial_keys: 0,
                    similar_keys: 35,
                    crc: 0x12345678,
                },
            ],
        }
    }

    #[test]
    fn test_write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.manifest");
        let manifest = sample_manifest();

        write_manifest(&path, &manifest).unwrap();
        let loaded = load_manifest(&path).unwrap();

        assert_eq!(loaded, manifest);
        assert_eq!(loaded.category("author").unwrap().similar_keys, 35);
        assert!(loaded.category("isbn").is_none());
    }

    #[test]
    fn test_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.manifest");
        std::fs::write(&path, b"BAAD\x01\x00\x00\x00").unwrap();
        assert!(matches!(
            load_manifest(&path),
            Err(CacheFileError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_bad_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.manifest");
        let mut buf = b"QMNF".to_vec();
        buf.extend_from_slice(&99u32.to_le_bytes());
        std::fs::write(&path, &buf).unwrap();
        assert!(matches!(
            load_manifest(&path),
            Err(CacheFileError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn test_too_small() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.manifest");
        std::fs::write(&path, b"QM").unwrap();
        assert!(matches!(
            load_manifest(&path),
            Err(CacheFileError::FileTooSmall { size: 2 })
        ));
    }

    #[test]
    fn test_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_manifest(&dir.path().join("index.manifest")),
            Err(CacheFileError::Missing { .. })
        ));
    }
}
