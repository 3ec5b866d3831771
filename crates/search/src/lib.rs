//! Search for Quarry
//!
//! This crate provides:
//! - Query: qualifier-routed query parsing with partial, phonetic and
//!   exact markers
//! - Weights: scores per ordered category combination
//! - Allocation: tokens placed in categories, ids intersected per
//!   combination
//! - Search: allocations merged across indexes, ranked and paginated
//! - SearchResults: the serializable payload
//!
//! # Usage
//!
//! ```ignore
//! use quarry_search::{Search, SearchOptions, Weights};
//!
//! let options = SearchOptions::new()?.weights(Weights::new().with(["author"], 6));
//! let search = Search::over(&registry, options);
//! let results = search.search("author:tolkien hobbit", 20, 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod allocation;
pub mod query;
pub mod results;
pub mod search;
pub mod weights;

#[cfg(test)]
mod test_support;

pub use allocation::{allocate, Allocation};
pub use query::{Query, QueryToken, TokenCap};
pub use results::{Hit, SearchResults};
pub use search::{Search, SearchOptions};
pub use weights::{WeightEntry, Weights, DEFAULT_WEIGHT};
