//! Engine configuration via `quarry.toml`
//!
//! One file describes where caches live, the indexing and query
//! pipelines, and optionally the indexes themselves. A default file is
//! written on first use; edit it and restart to change settings.

use crate::category::Category;
use crate::index::Index;
use crate::registry::Registry;
use crate::source::{DocumentSource, IterableSource};
use quarry_analysis::{Canonicalizer, CanonicalizerConfig, Partial, RangeBucketing, Similarity};
use quarry_core::{ConfigError, Error, KeyFormat, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "quarry.toml";

/// Directory holding persisted caches, unless configured
pub const DEFAULT_CACHE_ROOT: &str = "index";

/// Query tokens kept, unless configured
pub const DEFAULT_MAXIMUM_TOKENS: usize = 5;

fn default_cache_root() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_ROOT)
}

fn default_maximum_tokens() -> usize {
    DEFAULT_MAXIMUM_TOKENS
}

fn default_geo_precision() -> u32 {
    1
}

/// Engine configuration loaded from `quarry.toml`
///
/// # Example
///
/// ```toml
/// cache_root = "index"
/// maximum_tokens = 5
///
/// [[index]]
/// name = "books"
/// source = { type = "document", location = "data/books.json" }
///
/// [[index.category]]
/// name = "title"
/// partial = { substring = { from = -3 } }
/// similarity = { double_metaphone = { amount = 3 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding persisted caches and backups
    #[serde(default = "default_cache_root")]
    pub cache_root: PathBuf,
    /// Query tokens kept per search
    #[serde(default = "default_maximum_tokens")]
    pub maximum_tokens: usize,
    /// Pipeline applied to source values
    #[serde(default = "CanonicalizerConfig::indexing")]
    pub indexing: CanonicalizerConfig,
    /// Pipeline applied to query text
    #[serde(default = "CanonicalizerConfig::searching")]
    pub searching: CanonicalizerConfig,
    /// Declared indexes
    #[serde(default, rename = "index", skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexConfig>,
}

/// One `[[index]]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index name
    pub name: String,
    /// Name reported with results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_identifier: Option<String>,
    /// Key format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_format: Option<KeyFormat>,
    /// Where records come from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceConfig>,
    /// Categories, in definition order
    #[serde(default, rename = "category")]
    pub categories: Vec<CategoryConfig>,
    /// Geo pairs over two coordinate fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geo: Vec<GeoConfig>,
}

/// Declarative sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// A JSON document dump
    Document {
        /// Path of the dump
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<PathBuf>,
        /// Field holding the document id
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id_field: Option<String>,
    },
}

/// One `[[index.category]]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Category name
    pub name: String,
    /// Source field (defaults to the name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Qualifiers (default: the name)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<String>,
    /// Key format override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_format: Option<KeyFormat>,
    /// Partial strategy
    #[serde(default)]
    pub partial: Partial,
    /// Similarity strategy
    #[serde(default)]
    pub similarity: Similarity,
    /// Numeric bucketing; excludes partial and similarity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeBucketing>,
    /// Indexing pipeline override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexing: Option<CanonicalizerConfig>,
}

/// One `[[index.geo]]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Latitude field, also the category name
    pub latitude: String,
    /// Longitude field, also the category name
    pub longitude: String,
    /// Search radius in kilometres
    pub radius_km: f64,
    /// Neighbouring buckets indexed on each side
    #[serde(default = "default_geo_precision")]
    pub precision: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cache_root: default_cache_root(),
            maximum_tokens: DEFAULT_MAXIMUM_TOKENS,
            indexing: CanonicalizerConfig::indexing(),
            searching: CanonicalizerConfig::searching(),
            indexes: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Returns the default config file content with comments
    pub fn default_toml() -> &'static str {
        r#"# Quarry engine configuration
#
# Directory holding persisted caches; backups go to <cache_root>/backup
cache_root = "index"

# Query tokens kept per search; the rest are dropped
maximum_tokens = 5

# Pipelines. A table replaces the whole default pipeline, so repeat
# every stage you want to keep.
#
# [indexing]
# removes_characters = '[^\p{L}\p{N}\s.\-]'
# splits_text_on = '\s+'
# removes_characters_after_splitting = '^\.+|\.+$'
# substitutes_characters_with = "west_european"
# stopwords = '^(and|the|of)$'
#
# [searching]
# removes_characters = '[^\p{L}\p{N}\s.\-"~*]'
# splits_text_on = '\s+'
# removes_characters_after_splitting = '^\.+|\.+$'

# Indexes
#
# [[index]]
# name = "books"
# source = { type = "document", location = "data/books.json" }
#
# [[index.category]]
# name = "title"
# partial = { substring = { from = -3 } }
# similarity = { double_metaphone = { amount = 3 } }
#
# [[index.category]]
# name = "price"
# range = { bucket_size = 5.0, precision = 1 }
#
# [[index.geo]]
# latitude = "lat"
# longitude = "lng"
# radius_km = 1.0
"#
    }

    /// Read and parse config from a file path
    pub fn from_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        toml::from_str(&content).map_err(|e| invalid(e.to_string()))
    }

    /// Write the default config file if it does not already exist
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Config from `dir/quarry.toml`, creating the default file first
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        Self::write_default_if_missing(&path)?;
        Ok(Self::from_file(&path)?)
    }

    /// Compiled indexing pipeline
    pub fn indexing_canonicalizer(&self) -> std::result::Result<Canonicalizer, ConfigError> {
        Canonicalizer::new(&self.indexing)
    }

    /// Compiled query pipeline
    pub fn searching_canonicalizer(&self) -> std::result::Result<Canonicalizer, ConfigError> {
        Canonicalizer::new(&self.searching)
    }

    /// Registry holding every declared index, using declared sources
    pub fn registry(&self) -> std::result::Result<Registry, ConfigError> {
        self.registry_with(|_| None)
    }

    /// Registry holding every declared index
    ///
    /// `sources` may supply a source per index; declared sources are used
    /// otherwise.
    pub fn registry_with(
        &self,
        mut sources: impl FnMut(&IndexConfig) -> Option<Arc<dyn IterableSource>>,
    ) -> std::result::Result<Registry, ConfigError> {
        let mut registry = Registry::new();
        for config in &self.indexes {
            let index = config.build(self, sources(config))?;
            registry.register(index)?;
        }
        Ok(registry)
    }
}

impl IndexConfig {
    /// Compile into an [`Index`]
    ///
    /// An explicit `source` wins over the declared one.
    pub fn build(
        &self,
        engine: &EngineConfig,
        source: Option<Arc<dyn IterableSource>>,
    ) -> std::result::Result<Index, ConfigError> {
        let source = match (source, &self.source) {
            (Some(source), _) => source,
            (None, Some(declared)) => declared.build()?,
            (None, None) => {
                return Err(ConfigError::MissingParameter {
                    component: format!("index {}", self.name),
                    parameter: "source",
                })
            }
        };

        let mut builder = Index::builder(&self.name, source)
            .cache_root(&engine.cache_root)
            .canonicalizer(engine.indexing_canonicalizer()?);
        if let Some(identifier) = &self.result_identifier {
            builder = builder.result_identifier(identifier);
        }
        if let Some(key_format) = self.key_format {
            builder = builder.key_format(key_format);
        }
        for category in &self.categories {
            builder = builder.category(category.build()?);
        }
        for geo in &self.geo {
            builder = builder.geo_categories(
                &geo.latitude,
                &geo.longitude,
                geo.radius_km,
                geo.precision,
            );
        }
        builder.build()
    }
}

impl SourceConfig {
    fn build(&self) -> std::result::Result<Arc<dyn IterableSource>, ConfigError> {
        match self {
            SourceConfig::Document { location, id_field } => {
                let mut builder = DocumentSource::builder();
                if let Some(location) = location {
                    builder = builder.location(location);
                }
                if let Some(id_field) = id_field {
                    builder = builder.id_field(id_field);
                }
                Ok(Arc::new(builder.build()?))
            }
        }
    }
}

impl CategoryConfig {
    /// Compile into a [`Category`]
    pub fn build(&self) -> std::result::Result<Category, ConfigError> {
        let mut category = Category::new(&self.name);
        if let Some(from) = &self.from {
            category = category.from(from);
        }
        if !self.qualifiers.is_empty() {
            category = category.qualifiers(&self.qualifiers);
        }
        category = match self.range {
            Some(range) => {
                if self.partial.is_enabled() || self.similarity.is_enabled() {
                    return Err(ConfigError::InvalidStrategy {
                        category: self.name.clone(),
                        reason: "range categories take no partial or similarity strategy"
                            .to_string(),
                    });
                }
                category.range(range)
            }
            None => category.partial(self.partial).similarity(self.similarity),
        };
        if let Some(key_format) = self.key_format {
            category = category.key_format(key_format);
        }
        if let Some(indexing) = &self.indexing {
            category = category.canonicalizer(Canonicalizer::new(indexing)?);
        }
        Ok(category)
    }
}
