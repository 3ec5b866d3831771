//! Text canonicalization
//!
//! One [`Canonicalizer`] turns raw text into the token sequence that keys
//! a cache. Indexing and searching each get their own instance; they share
//! the algorithm and differ only in configuration.
//!
//! Pipeline (see [`CanonicalizerConfig`] for the knobs):
//!   substitute -> normalize words -> remove characters -> case fold
//!   -> split -> remove characters per token -> stopwords -> reject

mod config;
mod substituter;

pub use config::{
    CanonicalizerConfig, DEFAULT_SPLIT_PATTERN, EDGE_DOTS, INDEXING_REMOVES, SEARCHING_REMOVES,
};
pub use substituter::CharacterSubstituter;

use quarry_core::ConfigError;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use substituter::SubstitutionTable;

/// Final say on a candidate token
///
/// Returning `true` drops the token. Blank tokens are always dropped
/// before the rule is consulted. Any `Fn(&str) -> bool` closure is a rule.
pub trait RejectionRule: Send + Sync {
    /// Should this token be dropped?
    fn rejects(&self, token: &str) -> bool;
}

impl<F> RejectionRule for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn rejects(&self, token: &str) -> bool {
        self(token)
    }
}

/// Compiled canonicalization pipeline
///
/// Cheap to clone; compiled patterns and the rejection rule are shared.
#[derive(Clone)]
pub struct Canonicalizer {
    substitution: Option<SubstitutionTable>,
    normalizers: Vec<(Regex, String)>,
    removes: Option<Regex>,
    case_sensitive: bool,
    splitter: Regex,
    removes_after_splitting: Option<Regex>,
    stopwords: Option<Regex>,
    rejection: Option<Arc<dyn RejectionRule>>,
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        field,
        reason: e.to_string(),
    })
}

impl Canonicalizer {
    /// Compile a configuration
    ///
    /// Fails with [`ConfigError::InvalidPattern`] naming the offending field.
    pub fn new(config: &CanonicalizerConfig) -> Result<Self, ConfigError> {
        let substitution = config
            .substitutes_characters_with
            .as_ref()
            .map(|s| {
                SubstitutionTable::compile(s).map_err(|reason| ConfigError::InvalidPattern {
                    field: "substitutes_characters_with",
                    reason,
                })
            })
            .transpose()?;

        let normalizers = config
            .normalizes_words
            .iter()
            .map(|(pattern, replacement)| {
                compile("normalizes_words", pattern).map(|regex| (regex, replacement.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let removes = config
            .removes_characters
            .as_deref()
            .map(|p| compile("removes_characters", p))
            .transpose()?;
        let splitter = compile("splits_text_on", &config.splits_text_on)?;
        let removes_after_splitting = config
            .removes_characters_after_splitting
            .as_deref()
            .map(|p| compile("removes_characters_after_splitting", p))
            .transpose()?;
        let stopwords = config
            .stopwords
            .as_deref()
            .map(|p| compile("stopwords", p))
            .transpose()?;

        Ok(Canonicalizer {
            substitution,
            normalizers,
            removes,
            case_sensitive: config.case_sensitive,
            splitter,
            removes_after_splitting,
            stopwords,
            rejection: None,
        })
    }

    /// Default pipeline for source values
    pub fn for_indexing() -> Result<Self, ConfigError> {
        Self::new(&CanonicalizerConfig::indexing())
    }

    /// Default pipeline for query text
    pub fn for_searching() -> Result<Self, ConfigError> {
        Self::new(&CanonicalizerConfig::searching())
    }

    /// Attach a rejection rule
    pub fn with_rejection(mut self, rule: impl RejectionRule + 'static) -> Self {
        self.rejection = Some(Arc::new(rule));
        self
    }

    /// Apply the text-level stages (everything before splitting)
    pub fn prepare<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut text = match &self.substitution {
            Some(table) => table.substitute(text),
            None => Cow::Borrowed(text),
        };
        for (regex, replacement) in &self.normalizers {
            if let Cow::Owned(replaced) = regex.replace_all(&text, replacement.as_str()) {
                text = Cow::Owned(replaced);
            }
        }
        if let Some(regex) = &self.removes {
            if let Cow::Owned(removed) = regex.replace_all(&text, "") {
                text = Cow::Owned(removed);
            }
        }
        if !self.case_sensitive {
            text = Cow::Owned(text.to_lowercase());
        }
        text
    }

    /// Turn raw text into canonical tokens, in order
    ///
    /// Duplicates are kept; dropping them is the caller's business.
    pub fn canonicalize(&self, text: &str) -> Vec<String> {
        let prepared = self.prepare(text);
        self.splitter
            .split(&prepared)
            .filter_map(|candidate| self.finish(candidate))
            .collect()
    }

    /// Apply the token-level stages to one candidate
    fn finish(&self, candidate: &str) -> Option<String> {
        let token = match &self.removes_after_splitting {
            Some(regex) => regex.replace_all(candidate, ""),
            None => Cow::Borrowed(candidate),
        };
        if token.trim().is_empty() {
            return None;
        }
        if let Some(stopwords) = &self.stopwords {
            if stopwords.is_match(&token) {
                return None;
            }
        }
        if let Some(rule) = &self.rejection {
            if rule.rejects(&token) {
                return None;
            }
        }
        Some(token.into_owned())
    }

    /// Is this pipeline case sensitive?
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

impl fmt::Debug for Canonicalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canonicalizer")
            .field("substitution", &self.substitution.is_some())
            .field("normalizers", &self.normalizers.len())
            .field("removes", &self.removes.as_ref().map(Regex::as_str))
            .field("case_sensitive", &self.case_sensitive)
            .field("splitter", &self.splitter.as_str())
            .field(
                "removes_after_splitting",
                &self.removes_after_splitting.as_ref().map(Regex::as_str),
            )
            .field("stopwords", &self.stopwords.as_ref().map(Regex::as_str))
            .field("rejection", &self.rejection.is_some())
            .finish()
    }
}
