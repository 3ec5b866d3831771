//! Declarative canonicalizer configuration
//!
//! Patterns are kept as strings so the configuration can live in
//! `quarry.toml`. [`Canonicalizer::new`](super::Canonicalizer::new)
//! compiles them and reports bad patterns as configuration errors.

use super::substituter::CharacterSubstituter;
use serde::{Deserialize, Serialize};

/// Default split pattern
pub const DEFAULT_SPLIT_PATTERN: &str = r"\s+";

/// Characters removed before splitting at index time
pub const INDEXING_REMOVES: &str = r"[^\p{L}\p{N}\s.\-]";

/// Characters removed before splitting at query time; keeps the
/// `*`, `~` and `"` markers the query parser needs
pub const SEARCHING_REMOVES: &str = r#"[^\p{L}\p{N}\s.\-"~*]"#;

/// Leading and trailing dots, removed from every token
pub const EDGE_DOTS: &str = r"^\.+|\.+$";

/// Settings for one canonicalization pipeline
///
/// Stages run in this order:
/// 1. `substitutes_characters_with`, then each `normalizes_words` pair
/// 2. `removes_characters`
/// 3. lowercase, unless `case_sensitive`
/// 4. `splits_text_on`
/// 5. `removes_characters_after_splitting`
/// 6. `stopwords`, matched against each whole candidate token
/// 7. blank tokens and the rejection rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalizerConfig {
    /// Transliteration table
    pub substitutes_characters_with: Option<CharacterSubstituter>,
    /// Ordered (pattern, replacement) rewrites; replacements may use `$1`
    pub normalizes_words: Vec<(String, String)>,
    /// Pattern of characters to delete before splitting
    pub removes_characters: Option<String>,
    /// Keep case as given
    pub case_sensitive: bool,
    /// Split pattern
    pub splits_text_on: String,
    /// Pattern deleted from each token after splitting
    pub removes_characters_after_splitting: Option<String>,
    /// Tokens matching this pattern are dropped
    pub stopwords: Option<String>,
}

impl Default for CanonicalizerConfig {
    fn default() -> Self {
        CanonicalizerConfig {
            substitutes_characters_with: None,
            normalizes_words: Vec::new(),
            removes_characters: None,
            case_sensitive: false,
            splits_text_on: DEFAULT_SPLIT_PATTERN.to_string(),
            removes_characters_after_splitting: None,
            stopwords: None,
        }
    }
}

impl CanonicalizerConfig {
    /// Pipeline applied to source values
    pub fn indexing() -> Self {
        CanonicalizerConfig {
            removes_characters: Some(INDEXING_REMOVES.to_string()),
            removes_characters_after_splitting: Some(EDGE_DOTS.to_string()),
            ..Default::default()
        }
    }

    /// Pipeline applied to query text
    pub fn searching() -> Self {
        CanonicalizerConfig {
            removes_characters: Some(SEARCHING_REMOVES.to_string()),
            removes_characters_after_splitting: Some(EDGE_DOTS.to_string()),
            ..Default::default()
        }
    }

    /// Builder: use a transliteration table
    pub fn with_substituter(mut self, substituter: CharacterSubstituter) -> Self {
        self.substitutes_characters_with = Some(substituter);
        self
    }

    /// Builder: add a word rewrite
    pub fn with_normalization(
        mut self,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.normalizes_words
            .push((pattern.into(), replacement.into()));
        self
    }

    /// Builder: set the stopword pattern
    pub fn with_stopwords(mut self, pattern: impl Into<String>) -> Self {
        self.stopwords = Some(pattern.into());
        self
    }

    /// Builder: set the split pattern
    pub fn with_split_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.splits_text_on = pattern.into();
        self
    }

    /// Builder: keep case
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}
