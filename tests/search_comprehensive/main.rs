//! Search Comprehensive Test Suite
//!
//! End-to-end tests through the `quarry` facade.
//!
//! ## Test Tier Structure
//!
//! - **Tier 1: Analysis** (canonicalization, phonetic vectors, expansion)
//! - **Tier 2: Ranking** (weights, merge, ordering, pagination)
//! - **Tier 3: Lifecycle** (registry build order, backup, restore, check)
//! - **Tier 4: Configuration** (quarry.toml to searchable registry)
//! - **Tier 5: Properties** (proptest invariants)
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test search_comprehensive
//!
//! # With logs
//! RUST_LOG=quarry=debug cargo test --test search_comprehensive -- --nocapture
//! ```

mod test_utils;

// Tier 1: Analysis
mod tier1_analysis;

// Tier 2: Ranking
mod tier2_ranking;

// Tier 3: Lifecycle
mod tier3_lifecycle;

// Tier 4: Configuration
mod tier4_config;

// Tier 5: Properties
mod tier5_properties;
