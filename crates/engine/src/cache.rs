//! In-memory category caches
//!
//! A [`Cache`] holds the three keyed sections of one category:
//! exact, partial and similar. Each maps a key to the ids carrying it,
//! in the order the source yielded them.
//!
//! Caches are immutable once built. A category publishes a new one by
//! swapping an `Arc<Cache>`, so searches running against the previous
//! cache finish undisturbed.

use quarry_core::DocId;
use quarry_durability::{CacheSection, LoadedCacheFile, SectionKind};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

type Postings = FxHashMap<String, Vec<DocId>>;

// ============================================================================
// Cache
// ============================================================================

/// The keyed sections of one category
#[derive(Debug, Clone, Default)]
pub struct Cache {
    exact: Postings,
    partial: Postings,
    similar: Postings,
    generation: u64,
}

/// Key counts per section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Keys in the exact section
    pub exact_keys: usize,
    /// Keys in the partial section
    pub partial_keys: usize,
    /// Keys in the similar section
    pub similar_keys: usize,
}

impl Cache {
    /// Cache with no keys, generation 0
    pub fn empty() -> Self {
        Cache::default()
    }

    /// Generation this cache was built at
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ids stored under `key` in one section
    pub fn ids(&self, kind: SectionKind, key: &str) -> &[DocId] {
        self.section(kind)
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ids stored under `key` in the exact section
    pub fn exact(&self, key: &str) -> &[DocId] {
        self.ids(SectionKind::Exact, key)
    }

    /// Ids stored under `key` in the partial section
    pub fn partial(&self, key: &str) -> &[DocId] {
        self.ids(SectionKind::Partial, key)
    }

    /// Ids stored under `key` in the similar section
    pub fn similar(&self, key: &str) -> &[DocId] {
        self.ids(SectionKind::Similar, key)
    }

    /// Key counts
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            exact_keys: self.exact.len(),
            partial_keys: self.partial.len(),
            similar_keys: self.similar.len(),
        }
    }

    /// True when no section holds a key
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.partial.is_empty() && self.similar.is_empty()
    }

    fn section(&self, kind: SectionKind) -> &Postings {
        match kind {
            SectionKind::Exact => &self.exact,
            SectionKind::Partial => &self.partial,
            SectionKind::Similar => &self.similar,
        }
    }

    /// Borrowed sections, ready to hand to the cache writer
    pub fn sections(&self) -> Vec<CacheSection<'_>> {
        SectionKind::ALL
            .iter()
            .map(|&kind| {
                let entries = self
                    .section(kind)
                    .iter()
                    .map(|(key, ids)| (key.as_str(), ids.as_slice()))
                    .collect();
                CacheSection::new(kind, entries)
            })
            .collect()
    }

    /// Rebuild a cache from a verified cache file
    pub fn from_loaded(mut loaded: LoadedCacheFile) -> Self {
        let mut take = |kind| -> Postings { loaded.take_section(kind).into_iter().collect() };
        let exact = take(SectionKind::Exact);
        let partial = take(SectionKind::Partial);
        let similar = take(SectionKind::Similar);
        Cache {
            exact,
            partial,
            similar,
            generation: loaded.header.generation,
        }
    }
}

// ============================================================================
// CacheBuilder
// ============================================================================

/// Accumulates keys while a category harvests its source
///
/// Ids are appended in source order. Duplicates under one key are
/// removed by [`CacheBuilder::finish`], keeping the first occurrence.
#[derive(Debug, Default)]
pub struct CacheBuilder {
    exact: Postings,
    partial: Postings,
    similar: Postings,
}

impl CacheBuilder {
    /// Empty builder
    pub fn new() -> Self {
        CacheBuilder::default()
    }

    /// Record `id` under `key` in one section
    pub fn add(&mut self, kind: SectionKind, key: &str, id: DocId) {
        let section = match kind {
            SectionKind::Exact => &mut self.exact,
            SectionKind::Partial => &mut self.partial,
            SectionKind::Similar => &mut self.similar,
        };
        match section.get_mut(key) {
            // Repeated tokens of one record arrive back to back
            Some(ids) if ids.last() == Some(&id) => {}
            Some(ids) => ids.push(id),
            None => {
                section.insert(key.to_string(), vec![id]);
            }
        }
    }

    /// Record several keys for `id` in one section
    pub fn add_all<'k>(
        &mut self,
        kind: SectionKind,
        keys: impl IntoIterator<Item = &'k String>,
        id: DocId,
    ) {
        for key in keys {
            self.add(kind, key, id);
        }
    }

    /// Deduplicate and freeze
    pub fn finish(self, generation: u64) -> Cache {
        let mut seen = FxHashSet::default();
        let mut dedup = |mut postings: Postings| {
            for ids in postings.values_mut() {
                seen.clear();
                ids.retain(|id| seen.insert(*id));
                ids.shrink_to_fit();
            }
            postings
        };
        Cache {
            exact: dedup(self.exact),
            partial: dedup(self.partial),
            similar: dedup(self.similar),
            generation,
        }
    }
}
