//! Records held in memory

use super::{IterableSource, SourceError, SourceRows};
use quarry_core::NativeKey;
use rustc_hash::FxHashMap;

/// In-memory source, mostly for tests and small static data sets
///
/// Fields a record does not carry are yielded as `None`.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<(NativeKey, FxHashMap<String, String>)>,
}

impl MemorySource {
    /// Empty source
    pub fn new() -> Self {
        MemorySource::default()
    }

    /// Append a record
    pub fn record<K, F, V>(mut self, key: K, fields: impl IntoIterator<Item = (F, V)>) -> Self
    where
        K: Into<NativeKey>,
        F: Into<String>,
        V: Into<String>,
    {
        self.push(key, fields);
        self
    }

    /// Append a record in place
    pub fn push<K, F, V>(&mut self, key: K, fields: impl IntoIterator<Item = (F, V)>)
    where
        K: Into<NativeKey>,
        F: Into<String>,
        V: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(field, value)| (field.into(), value.into()))
            .collect();
        self.records.push((key.into(), fields));
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IterableSource for MemorySource {
    fn each<'a>(&'a self, field: &str) -> Result<SourceRows<'a>, SourceError> {
        let field = field.to_string();
        Ok(Box::new(self.records.iter().map(move |(key, fields)| {
            Ok((key.clone(), fields.get(&field).cloned()))
        })))
    }

    fn describe(&self) -> String {
        format!("memory ({} records)", self.records.len())
    }
}
