//! Token analysis for Quarry
//!
//! This crate provides:
//! - Canonicalizer: the configurable text -> token pipeline shared by
//!   indexing and searching
//! - CharacterSubstituter: transliteration applied before anything else
//! - Partial: substring expansion for starts-with / ends-with matching
//! - Similarity: phonetic encoders (Metaphone, Double Metaphone)
//! - RangeBucketing: numeric and geo bucketing
//! - Expansion: the closed set of strategies a category can use

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonicalizer;
pub mod expansion;
pub mod partial;
pub mod range;
pub mod similarity;

use thiserror::Error;

pub use canonicalizer::{
    Canonicalizer, CanonicalizerConfig, CharacterSubstituter, RejectionRule,
};
pub use expansion::{ExpandedKeys, Expansion};
pub use partial::Partial;
pub use range::{RangeBucketing, KM_PER_DEGREE};
pub use similarity::{double_metaphone, metaphone, Similarity, DEFAULT_AMOUNT};

/// Invalid strategy parameters, detected at configuration time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct StrategyError {
    /// What was wrong with the parameters
    pub reason: String,
}

impl StrategyError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        StrategyError {
            reason: reason.into(),
        }
    }
}

/// A single source value that cannot be expanded
///
/// The record is skipped for the category; the build continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    /// Range categories need a finite number
    #[error("Value '{value}' is not a finite number")]
    NotNumeric {
        /// Offending value
        value: String,
    },
}
