//! Cache file writer

use std::path::{Path, PathBuf};

use crate::atomic::atomic_write;
use crate::cache_file::{
    encode_entries, now_micros, CacheFileHeader, CacheSection, SectionHeader,
};
use crate::error::CacheFileError;

/// Information about a written cache file
#[derive(Debug, Clone)]
pub struct CacheFileInfo {
    /// Final path
    pub path: PathBuf,
    /// Generation recorded in the header
    pub generation: u64,
    /// Creation timestamp (microseconds since epoch)
    pub created_at_micros: u64,
    /// Footer CRC32
    pub crc: u32,
    /// Total size in bytes
    pub size_bytes: u64,
}

/// Serialize a cache file into memory
pub fn encode_cache_file(
    generation: u64,
    created_at_micros: u64,
    sections: &[CacheSection<'_>],
) -> (Vec<u8>, u32) {
    let header = CacheFileHeader::new(generation, created_at_micros, sections.len() as u32);
    let mut bytes = header.to_bytes().to_vec();

    for section in sections {
        let data = encode_entries(&section.entries);
        let section_header = SectionHeader::new(section.kind, data.len() as u64);
        bytes.extend_from_slice(&section_header.to_bytes());
        bytes.extend_from_slice(&data);
    }

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&bytes);
    let crc = hasher.finalize();
    bytes.extend_from_slice(&crc.to_le_bytes());
    (bytes, crc)
}

/// Write a cache file with crash-safe semantics
///
/// Either the complete new file is visible at `path` afterwards, or the
/// previous file is untouched.
pub fn write_cache_file(
    path: &Path,
    generation: u64,
    sections: &[CacheSection<'_>],
) -> Result<CacheFileInfo, CacheFileError> {
    let created_at_micros = now_micros();
    let (bytes, crc) = encode_cache_file(generation, created_at_micros, sections);
    atomic_write(path, &bytes)?;

    tracing::debug!(
        target: "quarry::durability",
        path = %path.display(),
        generation,
        size_bytes = bytes.len(),
        "Wrote cache file"
    );

    Ok(CacheFileInfo {
        path: path.to_path_buf(),
        generation,
        created_at_micros,
        crc,
        size_bytes: bytes.len() as u64,
    })
}
