//! Phonetic similarity
//!
//! A similarity strategy maps a token to one or two phonetic codes. At
//! index time the codes, truncated to `amount` characters, key the
//! category's similar section. A query token marked `~` is encoded the
//! same way and looked up there.

mod double_metaphone;
mod metaphone;

pub use double_metaphone::double_metaphone;
pub use metaphone::metaphone;

use crate::StrategyError;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

/// Default number of code characters kept as a key
pub const DEFAULT_AMOUNT: usize = 3;

fn default_amount() -> usize {
    DEFAULT_AMOUNT
}

/// Phonetic strategy for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    /// No phonetic keys; similar queries fall back to exact lookups
    #[default]
    None,
    /// Original Metaphone
    Metaphone {
        /// Code characters kept per key
        #[serde(default = "default_amount")]
        amount: usize,
    },
    /// Double Metaphone; both codes become keys
    DoubleMetaphone {
        /// Code characters kept per key
        #[serde(default = "default_amount")]
        amount: usize,
    },
}

impl Similarity {
    /// Metaphone with the default amount
    pub fn metaphone() -> Self {
        Similarity::Metaphone {
            amount: DEFAULT_AMOUNT,
        }
    }

    /// Double Metaphone with the default amount
    pub fn double_metaphone() -> Self {
        Similarity::DoubleMetaphone {
            amount: DEFAULT_AMOUNT,
        }
    }

    /// Same encoder, different amount
    pub fn with_amount(self, amount: usize) -> Self {
        match self {
            Similarity::None => Similarity::None,
            Similarity::Metaphone { .. } => Similarity::Metaphone { amount },
            Similarity::DoubleMetaphone { .. } => Similarity::DoubleMetaphone { amount },
        }
    }

    /// Check the parameters
    pub fn validate(&self) -> Result<(), StrategyError> {
        match self.amount() {
            Some(0) => Err(StrategyError::new("similarity amount must be at least 1")),
            _ => Ok(()),
        }
    }

    /// Truncation length, if an encoder is configured
    pub fn amount(&self) -> Option<usize> {
        match self {
            Similarity::None => None,
            Similarity::Metaphone { amount } | Similarity::DoubleMetaphone { amount } => {
                Some(*amount)
            }
        }
    }

    /// True unless this is [`Similarity::None`]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Similarity::None)
    }

    /// Full phonetic codes, distinct, primary first
    ///
    /// `None` has no codes.
    pub fn encode(&self, token: &str) -> SmallVec<[String; 2]> {
        let codes: SmallVec<[String; 2]> = match self {
            Similarity::None => SmallVec::new(),
            Similarity::Metaphone { .. } => smallvec![metaphone(token)],
            Similarity::DoubleMetaphone { .. } => {
                let (primary, alternate) = double_metaphone(token);
                smallvec![primary, alternate]
            }
        };
        let mut distinct: SmallVec<[String; 2]> = SmallVec::new();
        for code in codes {
            if !code.is_empty() && !distinct.contains(&code) {
                distinct.push(code);
            }
        }
        distinct
    }

    /// Keys stored for (or looked up by) a token: codes cut to `amount`
    pub fn keys(&self, token: &str) -> SmallVec<[String; 2]> {
        let amount = match self.amount() {
            Some(amount) => amount,
            None => return SmallVec::new(),
        };
        let mut keys: SmallVec<[String; 2]> = SmallVec::new();
        for code in self.encode(token) {
            let key: String = code.chars().take(amount).collect();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}
