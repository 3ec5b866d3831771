//! Combination weights
//!
//! A combination is the ordered tuple of categories its tokens matched in,
//! one entry per token. `[author]` and `[title, author]` are different
//! combinations and carry different weights; anything not listed scores the
//! default weight.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Weight of combinations nobody configured
pub const DEFAULT_WEIGHT: i64 = 1;

/// Category names never contain control characters
const SEPARATOR: char = '\u{1f}';

/// Weight table keyed by ordered category-name tuples
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WeightTable", into = "WeightTable")]
pub struct Weights {
    table: FxHashMap<String, i64>,
    default: i64,
}

/// One configured weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightEntry {
    /// Category names, in token order
    pub categories: Vec<String>,
    /// Score added by each match
    pub weight: i64,
}

/// Serialized form of [`Weights`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeightTable {
    #[serde(default = "default_weight")]
    default: i64,
    #[serde(default, rename = "weight")]
    entries: Vec<WeightEntry>,
}

fn default_weight() -> i64 {
    DEFAULT_WEIGHT
}

fn key<'a>(categories: impl IntoIterator<Item = &'a str>) -> String {
    let mut key = String::new();
    for (position, name) in categories.into_iter().enumerate() {
        if position > 0 {
            key.push(SEPARATOR);
        }
        key.push_str(name);
    }
    key
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            table: FxHashMap::default(),
            default: DEFAULT_WEIGHT,
        }
    }
}

impl Weights {
    /// Empty table, every combination weighs [`DEFAULT_WEIGHT`]
    pub fn new() -> Self {
        Weights::default()
    }

    /// Builder: weigh one combination
    pub fn with<'a>(mut self, categories: impl IntoIterator<Item = &'a str>, weight: i64) -> Self {
        self.set(categories, weight);
        self
    }

    /// Builder: weight for unlisted combinations
    pub fn default_weight(mut self, weight: i64) -> Self {
        self.default = weight;
        self
    }

    /// Weigh one combination, replacing any previous weight
    pub fn set<'a>(&mut self, categories: impl IntoIterator<Item = &'a str>, weight: i64) {
        self.table.insert(key(categories), weight);
    }

    /// Weight of a combination
    pub fn get<'a>(&self, categories: impl IntoIterator<Item = &'a str>) -> i64 {
        self.table
            .get(&key(categories))
            .copied()
            .unwrap_or(self.default)
    }

    /// Number of configured combinations
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True when only the default applies
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Configured entries, sorted by category tuple
    pub fn entries(&self) -> Vec<WeightEntry> {
        let mut entries: Vec<WeightEntry> = self
            .table
            .iter()
            .map(|(key, weight)| WeightEntry {
                categories: key.split(SEPARATOR).map(str::to_string).collect(),
                weight: *weight,
            })
            .collect();
        entries.sort_by(|a, b| a.categories.cmp(&b.categories));
        entries
    }
}

impl From<WeightTable> for Weights {
    fn from(table: WeightTable) -> Self {
        let mut weights = Weights::new().default_weight(table.default);
        for entry in table.entries {
            weights.set(entry.categories.iter().map(String::as_str), entry.weight);
        }
        weights
    }
}

impl From<Weights> for WeightTable {
    fn from(weights: Weights) -> Self {
        WeightTable {
            default: weights.default,
            entries: weights.entries(),
        }
    }
}

impl<'a, I> FromIterator<(I, i64)> for Weights
where
    I: IntoIterator<Item = &'a str>,
{
    fn from_iter<T: IntoIterator<Item = (I, i64)>>(iter: T) -> Self {
        let mut weights = Weights::new();
        for (categories, weight) in iter {
            weights.set(categories, weight);
        }
        weights
    }
}
