//! Core types for Quarry
//!
//! This crate defines the foundational types used throughout the system:
//! - DocId: Engine-wide integer document identifier
//! - NativeKey: Identifier as yielded by a data source
//! - KeyFormat: Deterministic mapping from native keys to DocIds
//! - Error: Error type hierarchy shared by all crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod key_format;
pub mod types;

pub use error::{ConfigError, Error, Result};
pub use key_format::{KeyFormat, KeyFormatError};
pub use types::{DocId, NativeKey};
