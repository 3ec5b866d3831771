//! Mapping native source keys onto integer DocIds
//!
//! Every mapping is deterministic. Reversing it is the caller's job:
//!
//! | Format    | Forward mapping                   | How callers get the native key back |
//! |-----------|-----------------------------------|-------------------------------------|
//! | `Integer` | integer, or decimal string parsed | `id.to_string()`                    |
//! | `Hex`     | `u128::from_str_radix(key, 16)`   | `format!("{:x}", id.as_u128())`     |
//! | `Uuid`    | 128-bit value of the UUID         | `Uuid::from_u128(id.as_u128())`     |
//! | `Hashed`  | xxh3-128 of the UTF-8 bytes       | not reversible                      |
//!
//! For example the CouchDB id `fa3f2577a8dbc6a91d7f9989cdffd38e` becomes
//! `332634873577882511228481564366832915342`.

use crate::types::{DocId, NativeKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use xxhash_rust::xxh3::xxh3_128;

/// Strategy turning a [`NativeKey`] into a [`DocId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyFormat {
    /// Integers pass through, decimal strings are parsed
    #[default]
    Integer,
    /// Hexadecimal strings (e.g. CouchDB document ids)
    Hex,
    /// RFC 4122 UUID strings
    Uuid,
    /// Any string, hashed with xxh3-128
    Hashed,
}

/// Errors produced when a native key does not fit the configured format
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyFormatError {
    /// Key text is not valid for the format
    #[error("Key '{key}' is not a valid {format:?} key")]
    Invalid {
        /// Offending key
        key: String,
        /// Format that rejected it
        format: KeyFormat,
    },
}

impl KeyFormat {
    /// Map a native key to a DocId
    pub fn to_doc_id(&self, key: &NativeKey) -> Result<DocId, KeyFormatError> {
        match (self, key) {
            (KeyFormat::Integer, NativeKey::Integer(n)) => Ok(DocId::new(*n)),
            (KeyFormat::Integer, NativeKey::Text(s)) => s
                .trim()
                .parse::<u128>()
                .map(DocId::new)
                .map_err(|_| self.invalid(s)),
            (KeyFormat::Hex, NativeKey::Integer(n)) => Ok(DocId::new(*n)),
            (KeyFormat::Hex, NativeKey::Text(s)) => {
                let digits = s.trim();
                let digits = digits
                    .strip_prefix("0x")
                    .or_else(|| digits.strip_prefix("0X"))
                    .unwrap_or(digits);
                if digits.is_empty() {
                    return Err(self.invalid(s));
                }
                u128::from_str_radix(digits, 16)
                    .map(DocId::new)
                    .map_err(|_| self.invalid(s))
            }
            (KeyFormat::Uuid, NativeKey::Integer(n)) => Ok(DocId::new(*n)),
            (KeyFormat::Uuid, NativeKey::Text(s)) => Uuid::parse_str(s.trim())
                .map(|uuid| DocId::new(uuid.as_u128()))
                .map_err(|_| self.invalid(s)),
            (KeyFormat::Hashed, NativeKey::Integer(n)) => {
                Ok(DocId::new(xxh3_128(n.to_string().as_bytes())))
            }
            (KeyFormat::Hashed, NativeKey::Text(s)) => Ok(DocId::new(xxh3_128(s.as_bytes()))),
        }
    }

    fn invalid(&self, key: &str) -> KeyFormatError {
        KeyFormatError::Invalid {
            key: key.to_string(),
            format: *self,
        }
    }
}
