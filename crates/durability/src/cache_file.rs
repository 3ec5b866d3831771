//! Cache file format
//!
//! ```text
//! [Header: 32 bytes]
//!   magic "QCAC" | format_version u32 | generation u64
//!   | created_at_micros u64 | section_count u32 | reserved u32
//! For each section:
//!   [kind u8] [data_len u64] [data]
//!   data = entry_count u32, then per entry (keys in byte order):
//!     key_len u32 | key (UTF-8) | id_count u32 | ids (u128 LE each)
//! [Footer: CRC32 of everything above, u32 LE]
//! ```
//!
//! All integers are little-endian. Sorted keys make the output
//! byte-identical for the same logical cache.

use crate::error::CacheFileError;
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use quarry_core::DocId;

/// Magic bytes at the start of every cache file
pub const CACHE_MAGIC: [u8; 4] = *b"QCAC";
/// Current format version
pub const CACHE_FORMAT_VERSION: u32 = 1;
/// Header size in bytes
pub const CACHE_HEADER_SIZE: usize = 32;
/// Footer size in bytes
pub const CACHE_FOOTER_SIZE: usize = 4;
/// File extension for cache files
pub const CACHE_FILE_EXTENSION: &str = "qcache";

const ID_SIZE: usize = 16;

/// The three keyed sections of a category cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SectionKind {
    /// Canonical token -> ids
    Exact = 1,
    /// Partial key -> ids
    Partial = 2,
    /// Phonetic code -> ids
    Similar = 3,
}

impl SectionKind {
    /// All kinds, in file order
    pub const ALL: [SectionKind; 3] = [SectionKind::Exact, SectionKind::Partial, SectionKind::Similar];

    /// Parse a kind byte
    pub fn from_u8(kind: u8) -> Option<Self> {
        match kind {
            1 => Some(SectionKind::Exact),
            2 => Some(SectionKind::Partial),
            3 => Some(SectionKind::Similar),
            _ => None,
        }
    }

    /// Human readable name
    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Exact => "exact",
            SectionKind::Partial => "partial",
            SectionKind::Similar => "similar",
        }
    }
}

/// Cache file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheFileHeader {
    /// Magic bytes
    pub magic: [u8; 4],
    /// Format version
    pub format_version: u32,
    /// Registry build generation that produced the file
    pub generation: u64,
    /// Creation time (microseconds since epoch)
    pub created_at_micros: u64,
    /// Number of sections that follow
    pub section_count: u32,
}

impl CacheFileHeader {
    /// Header for a new file
    pub fn new(generation: u64, created_at_micros: u64, section_count: u32) -> Self {
        CacheFileHeader {
            magic: CACHE_MAGIC,
            format_version: CACHE_FORMAT_VERSION,
            generation,
            created_at_micros,
            section_count,
        }
    }

    /// Serialize to the fixed 32 byte layout
    pub fn to_bytes(&self) -> [u8; CACHE_HEADER_SIZE] {
        let mut buf = [0u8; CACHE_HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.magic);
        LittleEndian::write_u32(&mut buf[4..8], self.format_version);
        LittleEndian::write_u64(&mut buf[8..16], self.generation);
        LittleEndian::write_u64(&mut buf[16..24], self.created_at_micros);
        LittleEndian::write_u32(&mut buf[24..28], self.section_count);
        // 28..32 reserved
        buf
    }

    /// Parse the fixed layout; call [`validate`](Self::validate) afterwards
    pub fn from_bytes(buf: &[u8; CACHE_HEADER_SIZE]) -> Self {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&buf[0..4]);
        CacheFileHeader {
            magic,
            format_version: LittleEndian::read_u32(&buf[4..8]),
            generation: LittleEndian::read_u64(&buf[8..16]),
            created_at_micros: LittleEndian::read_u64(&buf[16..24]),
            section_count: LittleEndian::read_u32(&buf[24..28]),
        }
    }

    /// Check magic and version
    pub fn validate(&self) -> Result<(), CacheFileError> {
        if self.magic != CACHE_MAGIC {
            return Err(CacheFileError::InvalidMagic {
                expected: CACHE_MAGIC,
                actual: self.magic,
            });
        }
        if self.format_version != CACHE_FORMAT_VERSION {
            return Err(CacheFileError::UnsupportedVersion(self.format_version));
        }
        Ok(())
    }
}

/// Section header: kind + data length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Kind byte
    pub kind: u8,
    /// Length of the data that follows
    pub data_len: u64,
}

impl SectionHeader {
    /// Encoded size
    pub const SIZE: usize = 9;

    /// New header
    pub fn new(kind: SectionKind, data_len: u64) -> Self {
        SectionHeader {
            kind: kind as u8,
            data_len,
        }
    }

    /// Serialize
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = self.kind;
        LittleEndian::write_u64(&mut buf[1..9], self.data_len);
        buf
    }

    /// Parse
    pub fn from_bytes(buf: &[u8; Self::SIZE]) -> Self {
        SectionHeader {
            kind: buf[0],
            data_len: LittleEndian::read_u64(&buf[1..9]),
        }
    }
}

/// One section to be written, borrowing from the in-memory cache
#[derive(Debug, Clone)]
pub struct CacheSection<'a> {
    /// Which section
    pub kind: SectionKind,
    /// Keys and their ids, in any order
    pub entries: Vec<(&'a str, &'a [DocId])>,
}

impl<'a> CacheSection<'a> {
    /// New section
    pub fn new(kind: SectionKind, entries: Vec<(&'a str, &'a [DocId])>) -> Self {
        CacheSection { kind, entries }
    }
}

/// Encode section data; entries are sorted by key first
pub fn encode_entries(entries: &[(&str, &[DocId])]) -> Vec<u8> {
    let mut sorted: Vec<&(&str, &[DocId])> = entries.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let size = 4 + sorted
        .iter()
        .map(|(key, ids)| 8 + key.len() + ids.len() * ID_SIZE)
        .sum::<usize>();
    let mut buf = Vec::with_capacity(size);

    // Writes into a Vec cannot fail
    let _ = buf.write_u32::<LittleEndian>(sorted.len() as u32);
    for (key, ids) in sorted {
        let _ = buf.write_u32::<LittleEndian>(key.len() as u32);
        buf.extend_from_slice(key.as_bytes());
        let _ = buf.write_u32::<LittleEndian>(ids.len() as u32);
        for id in ids.iter() {
            buf.extend_from_slice(&id.to_le_bytes());
        }
    }
    buf
}

/// Walk section data, handing each (key, raw id bytes) to `visit`
///
/// Validates entry framing and UTF-8 keys. Returns (entries, ids).
pub(crate) fn walk_entries<F>(
    kind: SectionKind,
    data: &[u8],
    mut visit: F,
) -> Result<(u64, u64), CacheFileError>
where
    F: FnMut(&str, &[u8]),
{
    let malformed = |offset: usize, reason: String| CacheFileError::MalformedEntry {
        section: kind.name(),
        offset,
        reason,
    };
    let take = |pos: usize, len: usize| -> Result<&[u8], CacheFileError> {
        data.get(pos..pos.saturating_add(len)).ok_or_else(|| {
            malformed(
                pos,
                format!("needs {} bytes, {} left", len, data.len().saturating_sub(pos)),
            )
        })
    };

    let mut pos = 0;
    let entry_count = LittleEndian::read_u32(take(pos, 4)?);
    pos += 4;

    let mut ids_total = 0u64;
    let mut previous: Option<&str> = None;
    for _ in 0..entry_count {
        let key_len = LittleEndian::read_u32(take(pos, 4)?) as usize;
        pos += 4;
        let key_bytes = take(pos, key_len)?;
        let key = std::str::from_utf8(key_bytes)
            .map_err(|e| malformed(pos, format!("key is not UTF-8: {}", e)))?;
        if previous.map_or(false, |p| p >= key) {
            return Err(malformed(pos, format!("key '{}' out of order", key)));
        }
        previous = Some(key);
        pos += key_len;

        let id_count = LittleEndian::read_u32(take(pos, 4)?) as usize;
        pos += 4;
        let id_bytes = take(pos, id_count.saturating_mul(ID_SIZE))?;
        pos += id_bytes.len();

        ids_total += id_count as u64;
        visit(key, id_bytes);
    }

    if pos != data.len() {
        return Err(malformed(
            pos,
            format!("{} trailing bytes after last entry", data.len() - pos),
        ));
    }
    Ok((u64::from(entry_count), ids_total))
}

/// Decode raw id bytes written by [`encode_entries`]
pub(crate) fn decode_ids(bytes: &[u8]) -> Vec<DocId> {
    bytes
        .chunks_exact(ID_SIZE)
        .map(|chunk| DocId::new(LittleEndian::read_u128(chunk)))
        .collect()
}

/// Current time in microseconds since the epoch
pub(crate) fn now_micros() -> u64 {
    chrono::Utc::now().timestamp_micros().max(0) as u64
}
