//! Categories: one searchable field of an index
//!
//! A category harvests one source field, canonicalizes each value,
//! expands every token and files the record's id under each key. The
//! result is a private [`Cache`]; the owning index decides when it goes
//! live.

use crate::cache::{Cache, CacheBuilder};
use crate::source::IterableSource;
use parking_lot::RwLock;
use quarry_analysis::{Canonicalizer, Expansion, Partial, RangeBucketing, Similarity};
use quarry_core::{ConfigError, DocId, Error, KeyFormat};
use quarry_durability::SectionKind;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which cache section a query token reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMode {
    /// Whole canonical token
    Exact,
    /// Partial keys
    Partial,
    /// Phonetic codes
    Similar,
}

/// Why a record was left out of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The native key does not fit the key format
    InvalidKey,
    /// A range category got a value that is not a finite number
    NotNumeric,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidKey => f.write_str("invalid key"),
            SkipReason::NotNumeric => f.write_str("not numeric"),
        }
    }
}

/// Counters from one category build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Pairs the source yielded
    pub records: usize,
    /// Records without a value for the field
    pub empty: usize,
    /// Records skipped (see [`SkipReason`])
    pub skipped: usize,
    /// Keys across all sections
    pub keys: usize,
    /// Wall time of the harvest
    #[serde(skip)]
    pub duration: Duration,
}

/// Everything a category needs from its index to build
pub(crate) struct BuildContext<'a> {
    pub index: &'a str,
    pub source: &'a dyn IterableSource,
    pub canonicalizer: &'a Canonicalizer,
    pub key_format: KeyFormat,
    pub generation: u64,
}

/// One searchable field
///
/// Defaults: the source field is the category name, the only qualifier
/// is the category name, and values are plain text with no partial or
/// phonetic keys.
#[derive(Debug)]
pub struct Category {
    name: String,
    from: Option<String>,
    qualifiers: Vec<String>,
    expansion: Expansion,
    canonicalizer: Option<Canonicalizer>,
    key_format: Option<KeyFormat>,
    cache: RwLock<Arc<Cache>>,
}

impl Category {
    /// Category named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Category {
            name: name.into(),
            from: None,
            qualifiers: Vec::new(),
            expansion: Expansion::default(),
            canonicalizer: None,
            key_format: None,
            cache: RwLock::new(Arc::new(Cache::empty())),
        }
    }

    /// Source field to harvest
    pub fn from(mut self, field: impl Into<String>) -> Self {
        self.from = Some(field.into());
        self
    }

    /// Qualifiers routing query tokens here (replaces the default)
    pub fn qualifiers<I, S>(mut self, qualifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.qualifiers = qualifiers.into_iter().map(Into::into).collect();
        self
    }

    /// Partial strategy; turns a range category back into text
    pub fn partial(mut self, partial: Partial) -> Self {
        self.expansion = Expansion::text(partial, self.expansion.similarity());
        self
    }

    /// Similarity strategy; turns a range category back into text
    pub fn similarity(mut self, similarity: Similarity) -> Self {
        self.expansion = Expansion::text(self.expansion.partial(), similarity);
        self
    }

    /// Numeric bucketing instead of text
    pub fn range(mut self, range: RangeBucketing) -> Self {
        self.expansion = Expansion::Range(range);
        self
    }

    /// Whole expansion at once
    pub fn expansion(mut self, expansion: Expansion) -> Self {
        self.expansion = expansion;
        self
    }

    /// Indexing pipeline for this category only
    pub fn canonicalizer(mut self, canonicalizer: Canonicalizer) -> Self {
        self.canonicalizer = Some(canonicalizer);
        self
    }

    /// Key format for this category only
    pub fn key_format(mut self, key_format: KeyFormat) -> Self {
        self.key_format = Some(key_format);
        self
    }

    /// Category name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source field harvested
    pub fn source_field(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.name)
    }

    /// Qualifiers routing query tokens here
    pub fn qualifier_names(&self) -> Cow<'_, [String]> {
        if self.qualifiers.is_empty() {
            Cow::Owned(vec![self.name.clone()])
        } else {
            Cow::Borrowed(&self.qualifiers)
        }
    }

    /// Expansion strategy
    pub fn expansion_strategy(&self) -> &Expansion {
        &self.expansion
    }

    /// Current live cache
    ///
    /// Hold on to the returned `Arc` for a consistent view across lookups.
    pub fn cache(&self) -> Arc<Cache> {
        Arc::clone(&*self.cache.read())
    }

    pub(crate) fn swap(&self, cache: Arc<Cache>) {
        *self.cache.write() = cache;
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        check_name("category", &self.name)?;
        if self.source_field().is_empty() {
            return Err(ConfigError::MissingParameter {
                component: format!("category {}", self.name),
                parameter: "from",
            });
        }
        for qualifier in self.qualifier_names().iter() {
            let malformed = qualifier.is_empty()
                || qualifier.contains([':', ','])
                || qualifier.contains(char::is_whitespace);
            if malformed {
                return Err(ConfigError::InvalidName {
                    kind: "qualifier",
                    name: qualifier.clone(),
                    reason: "must be non-empty without ':', ',' or whitespace",
                });
            }
        }
        self.expansion
            .validate()
            .map_err(|e| ConfigError::InvalidStrategy {
                category: self.name.clone(),
                reason: e.reason,
            })
    }

    /// Harvest the source into a fresh cache
    ///
    /// Key mapping failures and unparseable numbers skip the record.
    /// Only a failing source aborts.
    pub(crate) fn build(&self, ctx: &BuildContext<'_>) -> Result<(Cache, BuildStats), Error> {
        let started = Instant::now();
        let canonicalizer = self.canonicalizer.as_ref().unwrap_or(ctx.canonicalizer);
        let key_format = self.key_format.unwrap_or(ctx.key_format);
        let field = self.source_field();

        let rows = ctx
            .source
            .each(field)
            .map_err(|e| Error::source_iteration(ctx.index, &self.name, e.to_string()))?;

        let mut builder = CacheBuilder::new();
        let mut stats = BuildStats::default();

        for row in rows {
            let (key, value) =
                row.map_err(|e| Error::source_iteration(ctx.index, &self.name, e.to_string()))?;
            stats.records += 1;

            let id = match key_format.to_doc_id(&key) {
                Ok(id) => id,
                Err(e) => {
                    self.skip(ctx.index, &mut stats, SkipReason::InvalidKey, &e.to_string());
                    continue;
                }
            };
            let Some(value) = value else {
                stats.empty += 1;
                continue;
            };

            if self.expansion.is_range() {
                match self.expansion.expand(value.trim()) {
                    Ok(keys) => builder.add_all(SectionKind::Exact, &keys.exact, id),
                    Err(e) => {
                        self.skip(ctx.index, &mut stats, SkipReason::NotNumeric, &e.to_string())
                    }
                }
                continue;
            }

            for token in canonicalizer.canonicalize(&value) {
                // Text expansion never fails
                if let Ok(keys) = self.expansion.expand(&token) {
                    builder.add_all(SectionKind::Exact, &keys.exact, id);
                    builder.add_all(SectionKind::Partial, &keys.partial, id);
                    builder.add_all(SectionKind::Similar, &keys.similar, id);
                }
            }
        }

        let cache = builder.finish(ctx.generation);
        let counts = cache.stats();
        stats.keys = counts.exact_keys + counts.partial_keys + counts.similar_keys;
        stats.duration = started.elapsed();

        tracing::debug!(
            target: "quarry::index",
            index = ctx.index,
            category = %self.name,
            records = stats.records,
            skipped = stats.skipped,
            keys = stats.keys,
            duration_us = stats.duration.as_micros() as u64,
            "Built category cache"
        );
        Ok((cache, stats))
    }

    fn skip(&self, index: &str, stats: &mut BuildStats, reason: SkipReason, detail: &str) {
        stats.skipped += 1;
        tracing::warn!(
            target: "quarry::index",
            index,
            category = %self.name,
            %reason,
            detail,
            "Skipped record"
        );
    }

    /// Ids for a query token in one cache snapshot
    ///
    /// Without a partial strategy, partial lookups read the exact section;
    /// likewise for phonetic lookups without a similarity strategy. Range
    /// categories ignore the mode and read the token's bucket.
    pub fn lookup<'c>(&self, cache: &'c Cache, token: &str, mode: LookupMode) -> Cow<'c, [DocId]> {
        match self.expansion {
            Expansion::Range(range) => match range.query_key(token) {
                Some(key) => Cow::Borrowed(cache.exact(&key)),
                None => Cow::Borrowed(&[]),
            },
            Expansion::Text {
                partial,
                similarity,
            } => match mode {
                LookupMode::Exact => Cow::Borrowed(cache.exact(token)),
                LookupMode::Partial if partial.is_enabled() => Cow::Borrowed(cache.partial(token)),
                LookupMode::Partial => Cow::Borrowed(cache.exact(token)),
                LookupMode::Similar if similarity.is_enabled() => {
                    let codes = similarity.keys(token);
                    match codes.as_slice() {
                        [] => Cow::Borrowed(&[]),
                        [code] => Cow::Borrowed(cache.similar(code)),
                        codes => {
                            let mut seen = FxHashSet::default();
                            let ids = codes
                                .iter()
                                .flat_map(|code| cache.similar(code).iter().copied())
                                .filter(|id| seen.insert(*id))
                                .collect();
                            Cow::Owned(ids)
                        }
                    }
                }
                LookupMode::Similar => Cow::Borrowed(cache.exact(token)),
            },
        }
    }
}

/// Names become path components on disk
pub(crate) fn check_name(kind: &'static str, name: &str) -> Result<(), ConfigError> {
    let reason = if name.is_empty() {
        Some("must not be empty")
    } else if name.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if name.starts_with('.') {
        Some("must not start with '.'")
    } else if name.contains(char::is_control) {
        Some("must not contain control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ConfigError::InvalidName {
            kind,
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
