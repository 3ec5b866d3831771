//! Expansion strategies
//!
//! A category picks exactly one [`Expansion`]. Text categories canonicalize
//! the value into tokens and store exact, partial and similar keys for
//! each. Range categories parse the whole value as a number and store
//! bucket keys.

use crate::partial::Partial;
use crate::range::RangeBucketing;
use crate::similarity::Similarity;
use crate::{ExpansionError, StrategyError};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// How a category derives cache keys from values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expansion {
    /// Tokenized text
    Text {
        /// Substring keys
        #[serde(default)]
        partial: Partial,
        /// Phonetic keys
        #[serde(default)]
        similarity: Similarity,
    },
    /// Numeric buckets (one geo axis is a range category too)
    Range(RangeBucketing),
}

impl Default for Expansion {
    fn default() -> Self {
        Expansion::Text {
            partial: Partial::None,
            similarity: Similarity::None,
        }
    }
}

/// Keys derived from one token (or one numeric value)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedKeys {
    /// Exact section keys
    pub exact: Vec<String>,
    /// Partial section keys
    pub partial: Vec<String>,
    /// Similar section keys
    pub similar: SmallVec<[String; 2]>,
}

impl Expansion {
    /// Text expansion with the given strategies
    pub fn text(partial: Partial, similarity: Similarity) -> Self {
        Expansion::Text {
            partial,
            similarity,
        }
    }

    /// Check every parameter
    pub fn validate(&self) -> Result<(), StrategyError> {
        match self {
            Expansion::Text {
                partial,
                similarity,
            } => {
                partial.validate()?;
                similarity.validate()
            }
            Expansion::Range(range) => range.validate(),
        }
    }

    /// True for range categories
    pub fn is_range(&self) -> bool {
        matches!(self, Expansion::Range(_))
    }

    /// Partial strategy (range categories have none)
    pub fn partial(&self) -> Partial {
        match self {
            Expansion::Text { partial, .. } => *partial,
            Expansion::Range(_) => Partial::None,
        }
    }

    /// Similarity strategy (range categories have none)
    pub fn similarity(&self) -> Similarity {
        match self {
            Expansion::Text { similarity, .. } => *similarity,
            Expansion::Range(_) => Similarity::None,
        }
    }

    /// Keys to store for one canonical token, or one raw numeric value
    pub fn expand(&self, token: &str) -> Result<ExpandedKeys, ExpansionError> {
        match self {
            Expansion::Text {
                partial,
                similarity,
            } => Ok(ExpandedKeys {
                exact: vec![token.to_string()],
                partial: partial.keys(token),
                similar: similarity.keys(token),
            }),
            Expansion::Range(range) => Ok(ExpandedKeys {
                exact: range.index_keys(token)?,
                ..Default::default()
            }),
        }
    }
}
