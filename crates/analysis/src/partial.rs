//! Partial (substring) expansion
//!
//! A category with a partial strategy stores, besides the exact token,
//! every substring the strategy generates. A query token marked partial
//! is then looked up in that table.
//!
//! Lengths are counted in characters, never bytes.

use crate::StrategyError;
use serde::{Deserialize, Serialize};

/// Substring strategy for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partial {
    /// No partial keys; partial queries fall back to exact lookups
    #[default]
    None,
    /// Substrings anchored at one end of the token
    ///
    /// `from >= 1`: every suffix at least `from` characters long
    /// (`"title"`, 1 -> title, itle, tle, le, e).
    /// `from <= -1`: every prefix at least `|from|` characters long
    /// (`"author"`, -2 -> author, autho, auth, aut, au).
    /// `from == 0` is invalid.
    Substring {
        /// Anchor and minimum length, see above
        from: i32,
    },
}

impl Partial {
    /// Validated substring strategy
    pub fn substring(from: i32) -> Result<Self, StrategyError> {
        let partial = Partial::Substring { from };
        partial.validate()?;
        Ok(partial)
    }

    /// Check the parameters
    pub fn validate(&self) -> Result<(), StrategyError> {
        match self {
            Partial::Substring { from: 0 } => Err(StrategyError::new(
                "substring 'from' must be non-zero (>= 1 for suffixes, <= -1 for prefixes)",
            )),
            _ => Ok(()),
        }
    }

    /// True unless this is [`Partial::None`]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Partial::None)
    }

    /// Partial keys for one token, longest first
    ///
    /// The token itself is always included, even when it is shorter than
    /// the minimum. `None` yields nothing.
    pub fn keys(&self, token: &str) -> Vec<String> {
        let from = match self {
            Partial::None => return Vec::new(),
            Partial::Substring { from } => *from,
        };
        let chars: Vec<char> = token.chars().collect();
        let min_len = from.unsigned_abs() as usize;
        if chars.is_empty() {
            return Vec::new();
        }
        if min_len == 0 || chars.len() <= min_len {
            return vec![token.to_string()];
        }
        if from > 0 {
            (0..=chars.len() - min_len)
                .map(|start| chars[start..].iter().collect())
                .collect()
        } else {
            (min_len..=chars.len())
                .rev()
                .map(|end| chars[..end].iter().collect())
                .collect()
        }
    }
}
