//! Core identifier types
//!
//! - DocId: the integer identifier every cache stores
//! - NativeKey: the identifier a source hands out before key mapping

use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine-wide document identifier
///
/// Identifiers are plain integers. Sources with non-integer keys
/// (hexadecimal, UUID, arbitrary strings) are mapped onto a DocId by a
/// [`KeyFormat`](crate::KeyFormat). 128 bits hold a UUID or a 32 digit hex id
/// without loss.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DocId(u128);

impl DocId {
    /// Create a DocId from a raw integer
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Raw integer value
    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    /// Little-endian byte representation, as written to cache files
    pub fn to_le_bytes(&self) -> [u8; 16] {
        self.0.to_le_bytes()
    }

    /// Parse from the little-endian byte representation
    pub fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_le_bytes(bytes))
    }
}

impl From<u64> for DocId {
    fn from(raw: u64) -> Self {
        Self(raw as u128)
    }
}

impl From<u32> for DocId {
    fn from(raw: u32) -> Self {
        Self(raw as u128)
    }
}

impl From<u128> for DocId {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier as yielded by a data source
///
/// Sources report whatever their backend uses. The owning index's
/// [`KeyFormat`](crate::KeyFormat) turns it into a [`DocId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeKey {
    /// Integer key (relational primary keys, array positions)
    Integer(u128),
    /// Textual key (hex document ids, UUIDs, arbitrary strings)
    Text(String),
}

impl From<u64> for NativeKey {
    fn from(raw: u64) -> Self {
        NativeKey::Integer(raw as u128)
    }
}

impl From<u128> for NativeKey {
    fn from(raw: u128) -> Self {
        NativeKey::Integer(raw)
    }
}

impl From<&str> for NativeKey {
    fn from(raw: &str) -> Self {
        NativeKey::Text(raw.to_string())
    }
}

impl From<String> for NativeKey {
    fn from(raw: String) -> Self {
        NativeKey::Text(raw)
    }
}

impl fmt::Display for NativeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeKey::Integer(n) => write!(f, "{}", n),
            NativeKey::Text(s) => write!(f, "{}", s),
        }
    }
}
