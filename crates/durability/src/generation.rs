//! Generation marker
//!
//! `take_snapshot` on the registry bumps a build generation and stamps
//! every index directory with a small JSON marker:
//!
//! ```json
//! {"generation":4,"taken_at":"2024-05-01T12:00:00Z"}
//! ```

use crate::atomic::atomic_write;
use crate::error::CacheFileError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of a `GENERATION` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMarker {
    /// Registry build generation
    pub generation: u64,
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}

impl GenerationMarker {
    /// Marker stamped now
    pub fn now(generation: u64) -> Self {
        GenerationMarker {
            generation,
            taken_at: Utc::now(),
        }
    }
}

/// Write the marker atomically
pub fn write_generation(path: &Path, marker: &GenerationMarker) -> Result<(), CacheFileError> {
    let json =
        serde_json::to_vec(marker).map_err(|e| CacheFileError::Serialization(e.to_string()))?;
    atomic_write(path, &json)?;
    Ok(())
}

/// Read a marker; `None` when no snapshot has been taken yet
pub fn read_generation(path: &Path) -> Result<Option<GenerationMarker>, CacheFileError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| CacheFileError::Serialization(e.to_string()))
}
