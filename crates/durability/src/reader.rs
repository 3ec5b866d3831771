//! Cache file reader and verifier
//!
//! [`load_cache_file`] materializes every entry; [`verify_cache_file`]
//! walks the same framing without building anything, for integrity checks.

use std::path::Path;

use crate::cache_file::{
    decode_ids, walk_entries, CacheFileHeader, SectionHeader, SectionKind, CACHE_FOOTER_SIZE,
    CACHE_HEADER_SIZE,
};
use crate::error::CacheFileError;
use quarry_core::DocId;

/// Loaded section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSection {
    /// Section kind
    pub kind: SectionKind,
    /// Entries in key order
    pub entries: Vec<(String, Vec<DocId>)>,
}

/// Loaded cache file
#[derive(Debug, Clone)]
pub struct LoadedCacheFile {
    /// File header
    pub header: CacheFileHeader,
    /// Sections in file order
    pub sections: Vec<LoadedSection>,
    /// CRC32 checksum
    pub crc: u32,
}

impl LoadedCacheFile {
    /// Find a section by kind
    pub fn section(&self, kind: SectionKind) -> Option<&LoadedSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Take a section's entries out, leaving it empty
    pub fn take_section(&mut self, kind: SectionKind) -> Vec<(String, Vec<DocId>)> {
        self.sections
            .iter_mut()
            .find(|s| s.kind == kind)
            .map(|s| std::mem::take(&mut s.entries))
            .unwrap_or_default()
    }
}

/// Per-section counts reported by verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSummary {
    /// Section kind
    pub kind: SectionKind,
    /// Number of keys
    pub entries: u64,
    /// Number of (key, id) postings
    pub ids: u64,
}

/// Outcome of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFileSummary {
    /// File header
    pub header: CacheFileHeader,
    /// Per-section counts
    pub sections: Vec<SectionSummary>,
    /// CRC32 checksum
    pub crc: u32,
    /// File size in bytes
    pub size_bytes: u64,
}

impl CacheFileSummary {
    /// Total keys across sections
    pub fn total_entries(&self) -> u64 {
        self.sections.iter().map(|s| s.entries).sum()
    }
}

/// Read a file and validate header and footer; returns header, CRC and
/// the section region
fn open_validated(bytes: &[u8]) -> Result<(CacheFileHeader, u32, &[u8]), CacheFileError> {
    if bytes.len() < CACHE_HEADER_SIZE + CACHE_FOOTER_SIZE {
        return Err(CacheFileError::FileTooSmall { size: bytes.len() });
    }

    let mut header_bytes = [0u8; CACHE_HEADER_SIZE];
    header_bytes.copy_from_slice(&bytes[..CACHE_HEADER_SIZE]);
    let header = CacheFileHeader::from_bytes(&header_bytes);
    header.validate()?;

    let body_end = bytes.len() - CACHE_FOOTER_SIZE;
    let mut footer = [0u8; CACHE_FOOTER_SIZE];
    footer.copy_from_slice(&bytes[body_end..]);
    let stored = u32::from_le_bytes(footer);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&bytes[..body_end]);
    let computed = hasher.finalize();
    if stored != computed {
        return Err(CacheFileError::CrcMismatch { stored, computed });
    }

    Ok((header, stored, &bytes[CACHE_HEADER_SIZE..body_end]))
}

/// Split the section region into (kind, data) pairs
fn split_sections<'a>(
    header: &CacheFileHeader,
    region: &'a [u8],
) -> Result<Vec<(SectionKind, &'a [u8])>, CacheFileError> {
    let mut sections: Vec<(SectionKind, &'a [u8])> = Vec::new();
    let mut cursor = 0;

    while cursor < region.len() {
        if cursor + SectionHeader::SIZE > region.len() {
            return Err(CacheFileError::SectionDataTruncated {
                kind: region[cursor],
                expected: SectionHeader::SIZE,
                available: region.len() - cursor,
            });
        }
        let mut header_bytes = [0u8; SectionHeader::SIZE];
        header_bytes.copy_from_slice(&region[cursor..cursor + SectionHeader::SIZE]);
        let section_header = SectionHeader::from_bytes(&header_bytes);
        cursor += SectionHeader::SIZE;

        let kind = SectionKind::from_u8(section_header.kind).ok_or(
            CacheFileError::InvalidSectionKind {
                kind: section_header.kind,
            },
        )?;
        if sections.iter().any(|(k, _)| *k == kind) {
            return Err(CacheFileError::DuplicateSection {
                kind: section_header.kind,
            });
        }

        let available = region.len() - cursor;
        let data_len = usize::try_from(section_header.data_len).unwrap_or(usize::MAX);
        if data_len > available {
            return Err(CacheFileError::SectionDataTruncated {
                kind: section_header.kind,
                expected: data_len,
                available,
            });
        }
        sections.push((kind, &region[cursor..cursor + data_len]));
        cursor += data_len;
    }

    if sections.len() as u32 != header.section_count {
        return Err(CacheFileError::SectionCountMismatch {
            declared: header.section_count,
            found: sections.len() as u32,
        });
    }
    Ok(sections)
}

fn read_file(path: &Path) -> Result<Vec<u8>, CacheFileError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CacheFileError::Missing {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Decode cache file bytes
pub fn decode_cache_file(bytes: &[u8]) -> Result<LoadedCacheFile, CacheFileError> {
    let (header, crc, region) = open_validated(bytes)?;
    let mut sections = Vec::new();
    for (kind, data) in split_sections(&header, region)? {
        let mut entries = Vec::new();
        walk_entries(kind, data, |key, raw_ids| {
            entries.push((key.to_string(), decode_ids(raw_ids)));
        })?;
        sections.push(LoadedSection { kind, entries });
    }
    Ok(LoadedCacheFile {
        header,
        sections,
        crc,
    })
}

/// Load a cache file from disk
///
/// Validates magic, version, CRC, section and entry framing.
pub fn load_cache_file(path: &Path) -> Result<LoadedCacheFile, CacheFileError> {
    decode_cache_file(&read_file(path)?)
}

/// Verify a cache file without materializing its entries
pub fn verify_cache_file(path: &Path) -> Result<CacheFileSummary, CacheFileError> {
    let bytes = read_file(path)?;
    let (header, crc, region) = open_validated(&bytes)?;
    let mut sections = Vec::new();
    for (kind, data) in split_sections(&header, region)? {
        let (entries, ids) = walk_entries(kind, data, |_, _| {})?;
        sections.push(SectionSummary { kind, entries, ids });
    }
    Ok(CacheFileSummary {
        header,
        sections,
        crc,
        size_bytes: bytes.len() as u64,
    })
}
