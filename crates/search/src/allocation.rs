//! Allocations
//!
//! An allocation places every token of a query in one category of one
//! index. For each index:
//! 1. every token resolves to the categories its qualifiers name, or to
//!    all categories when unqualified
//! 2. categories where the token finds nothing drop out for that token; a
//!    token left with no category rules the index out
//! 3. the cartesian product of the remaining choices gives the
//!    combinations, minus those using half of a geo pair
//! 4. a combination's ids are the intersection of its tokens' id lists

use crate::query::{Query, QueryToken};
use crate::weights::Weights;
use quarry_core::DocId;
use quarry_engine::{Cache, Index};
use rustc_hash::FxHashSet;
use serde::Serialize;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::Arc;

/// One combination with matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// Index name
    pub index: String,
    /// Label the index reports results under
    pub result_identifier: String,
    /// Category per token, in token order
    pub categories: Vec<String>,
    /// Score each id gains from this combination
    pub weight: i64,
    /// Matching ids
    #[serde(skip)]
    pub ids: Vec<DocId>,
    /// Number of matching ids
    pub count: usize,
}

type Positions = SmallVec<[usize; 4]>;

/// Allocate a query against one index
///
/// Caches are read once up front, so a concurrent rebuild cannot mix
/// generations within one query.
pub fn allocate(index: &Index, query: &Query, weights: &Weights) -> Vec<Allocation> {
    if query.is_empty() {
        return Vec::new();
    }
    let caches: Vec<Arc<Cache>> = index.caches();
    let categories = index.categories();

    let mut candidates: Vec<Vec<(usize, Cow<'_, [DocId]>)>> = Vec::with_capacity(query.len());
    for token in &query.tokens {
        let found: Vec<_> = resolve(index, token)
            .into_iter()
            .filter_map(|position| {
                let ids = categories[position].lookup(&caches[position], &token.text, token.mode);
                (!ids.is_empty()).then_some((position, ids))
            })
            .collect();
        if found.is_empty() {
            tracing::trace!(
                target: "quarry::search",
                index = index.name(),
                token = %token.text,
                "Token matched nowhere"
            );
            return Vec::new();
        }
        candidates.push(found);
    }

    let mut allocations = Vec::new();
    let mut choice = vec![0usize; candidates.len()];
    loop {
        let positions: Positions = choice
            .iter()
            .zip(&candidates)
            .map(|(&pick, found)| found[pick].0)
            .collect();

        if completes_geo_pairs(index, &positions) {
            let ids = intersect(
                choice
                    .iter()
                    .zip(&candidates)
                    .map(|(&pick, found)| found[pick].1.as_ref())
                    .collect(),
            );
            if !ids.is_empty() {
                let names: Vec<&str> = positions.iter().map(|&p| categories[p].name()).collect();
                let weight = weights.get(names.iter().copied());
                allocations.push(Allocation {
                    index: index.name().to_string(),
                    result_identifier: index.result_identifier().to_string(),
                    categories: names.iter().map(|name| name.to_string()).collect(),
                    weight,
                    count: ids.len(),
                    ids,
                });
            }
        }

        if !advance(&mut choice, &candidates) {
            break;
        }
    }

    tracing::trace!(
        target: "quarry::search",
        index = index.name(),
        allocations = allocations.len(),
        "Allocated query"
    );
    allocations
}

/// Category positions a token may land in
fn resolve(index: &Index, token: &QueryToken) -> Positions {
    if !token.is_qualified() {
        return (0..index.categories().len()).collect();
    }
    let mut positions = Positions::new();
    for qualifier in &token.qualifiers {
        if let Some(position) = index.qualified_category(qualifier) {
            if !positions.contains(&position) {
                positions.push(position);
            }
        }
    }
    positions
}

/// A combination using one axis of a geo pair must use the other
fn completes_geo_pairs(index: &Index, positions: &[usize]) -> bool {
    positions.iter().all(|&position| {
        index
            .geo_pairs()
            .iter()
            .filter_map(|pair| pair.partner(position))
            .all(|partner| positions.contains(&partner))
    })
}

/// Odometer step over the per-token choices; false once exhausted
fn advance<T>(choice: &mut [usize], candidates: &[Vec<T>]) -> bool {
    for token in (0..choice.len()).rev() {
        choice[token] += 1;
        if choice[token] < candidates[token].len() {
            return true;
        }
        choice[token] = 0;
    }
    false
}

/// Ids present in every list, in the order of the shortest
fn intersect(mut lists: Vec<&[DocId]>) -> Vec<DocId> {
    lists.sort_by_key(|list| list.len());
    let Some((shortest, rest)) = lists.split_first() else {
        return Vec::new();
    };
    let rest: Vec<FxHashSet<DocId>> = rest
        .iter()
        .map(|list| list.iter().copied().collect())
        .collect();
    shortest
        .iter()
        .copied()
        .filter(|id| rest.iter().all(|set| set.contains(id)))
        .collect()
}
