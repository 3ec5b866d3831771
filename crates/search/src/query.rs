//! Query parsing
//!
//! Query text is cut into segments at qualified words: `title,author:dune`
//! starts a segment routed to the `title` and `author` qualifiers that runs
//! until the next qualified word. Each segment goes through the search
//! pipeline and its tokens inherit the segment's qualifiers.
//!
//! Markers pick the cache section a token reads:
//! - `dune*` reads partial keys
//! - `dune~` reads phonetic codes
//! - `"dune"` reads the exact section, even in last position
//!
//! Unmarked tokens are exact, except the last one, which is partial unless
//! [`SearchOptions::partial_last_token`](crate::SearchOptions) is off.

use crate::search::SearchOptions;
use once_cell::sync::Lazy;
use quarry_engine::LookupMode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A word of the form `q1,q2:rest`
static QUALIFIED_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([^\s:,"]+(?:,[^\s:,"]+)*):(.*)$"#).expect("qualifier pattern compiles")
});

const MARKERS: [char; 3] = ['"', '*', '~'];

/// Which tokens survive when a query exceeds `maximum_tokens`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenCap {
    /// Drop the excess from the end
    #[default]
    KeepFirst,
    /// Drop the oldest tokens
    KeepLast,
}

/// One canonical query token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryToken {
    /// Canonical text, markers removed
    pub text: String,
    /// Qualifiers of the enclosing segment; empty means every category
    pub qualifiers: SmallVec<[String; 2]>,
    /// Cache section to read
    pub mode: LookupMode,
}

impl QueryToken {
    /// Is this token routed by qualifiers?
    pub fn is_qualified(&self) -> bool {
        !self.qualifiers.is_empty()
    }
}

/// Parsed query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Tokens in query order, after the cap
    pub tokens: Vec<QueryToken>,
    /// Tokens removed by the cap
    pub dropped: usize,
}

struct Segment<'a> {
    qualifiers: SmallVec<[String; 2]>,
    words: Vec<&'a str>,
}

/// Marked token before the last-token rule
struct Marked {
    text: String,
    qualifiers: SmallVec<[String; 2]>,
    mode: Option<LookupMode>,
}

impl Query {
    /// Parse query text with the given options
    ///
    /// Never fails: text that canonicalizes to nothing is an empty query.
    pub fn parse(text: &str, options: &SearchOptions) -> Query {
        let mut marked = Vec::new();
        let fold_case = !options.canonicalizer.is_case_sensitive();
        for segment in segments(text, fold_case) {
            let canonical = options.canonicalizer.canonicalize(&segment.words.join(" "));
            let mut quoted = false;
            for raw in &canonical {
                if let Some((text, mode)) = strip_markers(raw, &mut quoted) {
                    marked.push(Marked {
                        text,
                        qualifiers: segment.qualifiers.clone(),
                        mode,
                    });
                }
            }
        }

        let dropped = cap(&mut marked, options.maximum_tokens, options.token_cap);
        if dropped > 0 {
            tracing::debug!(
                target: "quarry::search",
                dropped,
                maximum_tokens = options.maximum_tokens,
                "Query tokens dropped"
            );
        }

        let last = marked.len().saturating_sub(1);
        let tokens = marked
            .into_iter()
            .enumerate()
            .map(|(position, token)| {
                let mode = match token.mode {
                    Some(mode) => mode,
                    None if position == last && options.partial_last_token => {
                        LookupMode::Partial
                    }
                    None => LookupMode::Exact,
                };
                QueryToken {
                    text: token.text,
                    qualifiers: token.qualifiers,
                    mode,
                }
            })
            .collect();

        Query { tokens, dropped }
    }

    /// True when no token survived parsing
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Canonical token texts, for reporting
    pub fn texts(&self) -> Vec<String> {
        self.tokens.iter().map(|token| token.text.clone()).collect()
    }
}

/// Qualifiers are lowercased like the text unless the pipeline keeps case
fn segments(text: &str, fold_case: bool) -> Vec<Segment<'_>> {
    let mut segments = vec![Segment {
        qualifiers: SmallVec::new(),
        words: Vec::new(),
    }];
    for word in text.split_whitespace() {
        match QUALIFIED_WORD.captures(word) {
            Some(captures) => {
                let qualifiers = captures[1]
                    .split(',')
                    .map(|qualifier| {
                        if fold_case {
                            qualifier.to_lowercase()
                        } else {
                            qualifier.to_string()
                        }
                    })
                    .collect();
                let rest = captures.get(2).map_or("", |rest| rest.as_str());
                let mut segment = Segment {
                    qualifiers,
                    words: Vec::new(),
                };
                if !rest.is_empty() {
                    segment.words.push(rest);
                }
                segments.push(segment);
            }
            None => {
                if let Some(current) = segments.last_mut() {
                    current.words.push(word);
                }
            }
        }
    }
    segments.retain(|segment| !segment.words.is_empty());
    segments
}

/// Remove markers, returning the bare text and any forced mode
///
/// `quoted` carries an open `"` across the tokens of a segment.
fn strip_markers(raw: &str, quoted: &mut bool) -> Option<(String, Option<LookupMode>)> {
    let opens = raw.starts_with('"');
    let inner = raw.trim_start_matches('"');
    let suffix_start = inner.trim_end_matches(MARKERS).len();
    let suffix = &inner[suffix_start..];

    let exact = *quoted || opens || suffix.contains('"');
    if suffix.contains('"') {
        *quoted = false;
    } else if opens {
        *quoted = true;
    }

    let text: String = inner[..suffix_start]
        .chars()
        .filter(|c| !MARKERS.contains(c))
        .collect();
    if text.is_empty() {
        return None;
    }

    let mode = if suffix.contains('~') {
        Some(LookupMode::Similar)
    } else if suffix.contains('*') {
        Some(LookupMode::Partial)
    } else if exact {
        Some(LookupMode::Exact)
    } else {
        None
    };
    Some((text, mode))
}

/// Apply the token cap; 0 means unlimited
fn cap<T>(tokens: &mut Vec<T>, maximum: usize, policy: TokenCap) -> usize {
    if maximum == 0 || tokens.len() <= maximum {
        return 0;
    }
    let excess = tokens.len() - maximum;
    match policy {
        TokenCap::KeepFirst => tokens.truncate(maximum),
        TokenCap::KeepLast => {
            tokens.drain(..excess);
        }
    }
    excess
}
