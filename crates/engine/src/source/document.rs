//! JSON document dumps
//!
//! Reads a document store export from disk. Two shapes are accepted:
//!
//! ```text
//! {"rows": [{"id": "...", "doc": {"_id": "...", "title": "..."}}, ...]}
//! [{"_id": "...", "title": "..."}, ...]
//! ```
//!
//! The first is the body of CouchDB's `_all_docs?include_docs=true`.
//! Document ids are hexadecimal by default, matching CouchDB's generated ids.
//! Documents without a usable id are skipped with a warning.

use super::{IterableSource, SourceError, SourceRows};
use parking_lot::RwLock;
use quarry_core::{ConfigError, KeyFormat, NativeKey};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default name of the id field
pub const DEFAULT_ID_FIELD: &str = "_id";

type Documents = Arc<Vec<(NativeKey, Map<String, Value>)>>;

/// Source backed by a JSON document dump
///
/// The dump is read on first use and kept until the next
/// [`IterableSource::take_snapshot`], which re-reads it.
#[derive(Debug)]
pub struct DocumentSource {
    location: PathBuf,
    id_field: String,
    key_format: KeyFormat,
    documents: RwLock<Option<Documents>>,
}

/// Builder for [`DocumentSource`]
#[derive(Debug, Clone, Default)]
pub struct DocumentSourceBuilder {
    location: Option<PathBuf>,
    id_field: Option<String>,
    key_format: Option<KeyFormat>,
}

impl DocumentSourceBuilder {
    /// Path of the JSON dump (required)
    pub fn location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Field holding the document id (default `_id`)
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    /// Key format suggested to the owning index (default hex)
    pub fn key_format(mut self, format: KeyFormat) -> Self {
        self.key_format = Some(format);
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<DocumentSource, ConfigError> {
        let location = self.location.ok_or_else(|| ConfigError::MissingParameter {
            component: "document source".to_string(),
            parameter: "location",
        })?;
        Ok(DocumentSource {
            location,
            id_field: self.id_field.unwrap_or_else(|| DEFAULT_ID_FIELD.to_string()),
            key_format: self.key_format.unwrap_or(KeyFormat::Hex),
            documents: RwLock::new(None),
        })
    }
}

impl DocumentSource {
    /// Start building a source
    pub fn builder() -> DocumentSourceBuilder {
        DocumentSourceBuilder::default()
    }

    /// Source reading `path` with default settings
    pub fn open(path: impl Into<PathBuf>) -> Self {
        DocumentSource {
            location: path.into(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            key_format: KeyFormat::Hex,
            documents: RwLock::new(None),
        }
    }

    /// Path of the dump
    pub fn location(&self) -> &Path {
        &self.location
    }

    fn documents(&self) -> Result<Documents, SourceError> {
        if let Some(docs) = self.documents.read().as_ref() {
            return Ok(Arc::clone(docs));
        }
        let mut slot = self.documents.write();
        if let Some(docs) = slot.as_ref() {
            return Ok(Arc::clone(docs));
        }
        let docs = Arc::new(read_documents(&self.location, &self.id_field)?);
        *slot = Some(Arc::clone(&docs));
        Ok(docs)
    }
}

fn read_documents(
    path: &Path,
    id_field: &str,
) -> Result<Vec<(NativeKey, Map<String, Value>)>, SourceError> {
    let bytes = std::fs::read(path)?;
    let body: Value = serde_json::from_slice(&bytes).map_err(|e| SourceError::Malformed {
        reason: format!("{}: {}", path.display(), e),
    })?;

    let docs = match body {
        Value::Array(docs) => docs,
        Value::Object(mut body) => match body.remove("rows") {
            Some(Value::Array(rows)) => rows
                .into_iter()
                .map(|row| match row {
                    Value::Object(mut row) => row.remove("doc").unwrap_or(Value::Null),
                    _ => Value::Null,
                })
                .collect(),
            _ => {
                return Err(SourceError::Malformed {
                    reason: "expected a 'rows' array".to_string(),
                })
            }
        },
        _ => {
            return Err(SourceError::Malformed {
                reason: "expected an array or an object with 'rows'".to_string(),
            })
        }
    };

    let mut documents = Vec::with_capacity(docs.len());
    for (position, doc) in docs.into_iter().enumerate() {
        let Value::Object(doc) = doc else {
            return Err(SourceError::Malformed {
                reason: format!("row {} carries no document", position),
            });
        };
        let key = match doc.get(id_field) {
            Some(Value::String(id)) => Some(NativeKey::Text(id.clone())),
            Some(Value::Number(n)) => n.as_u64().map(NativeKey::from),
            _ => None,
        };
        match key {
            Some(key) => documents.push((key, doc)),
            None => tracing::warn!(
                target: "quarry::source",
                location = %path.display(),
                position,
                id_field,
                "Skipping document without a usable id"
            ),
        }
    }
    Ok(documents)
}

/// Text of a field value; arrays are joined with spaces
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(field_text).collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        }
        Value::Null | Value::Object(_) => None,
    }
}

impl IterableSource for DocumentSource {
    fn each<'a>(&'a self, field: &str) -> Result<SourceRows<'a>, SourceError> {
        let docs = self.documents()?;
        let field = field.to_string();
        Ok(Box::new((0..docs.len()).map(move |i| {
            let (key, doc) = &docs[i];
            Ok((key.clone(), doc.get(&field).and_then(field_text)))
        })))
    }

    fn take_snapshot(&self) -> Result<(), SourceError> {
        let docs = read_documents(&self.location, &self.id_field)?;
        tracing::debug!(
            target: "quarry::source",
            location = %self.location.display(),
            documents = docs.len(),
            "Re-read document dump"
        );
        *self.documents.write() = Some(Arc::new(docs));
        Ok(())
    }

    fn key_format(&self) -> Option<KeyFormat> {
        Some(self.key_format)
    }

    fn describe(&self) -> String {
        format!("documents at {}", self.location.display())
    }
}
