//! Search results
//!
//! Results serialize to the JSON payload handed to callers:
//!
//! ```json
//! {
//!   "query": "tolkien",
//!   "tokens": ["tolkien"],
//!   "ids": [2, 1],
//!   "hits": [{ "id": 2, "score": 7, "allocations": [0, 1] }, ...],
//!   "total": 3,
//!   "offset": 0,
//!   "duration_us": 41,
//!   "allocations": [{ "index": "books", "result_identifier": "books", ... }]
//! }
//! ```

use crate::allocation::Allocation;
use quarry_core::DocId;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// One ranked id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hit {
    /// Document id
    pub id: DocId,
    /// Sum of the weights of every combination it matched
    pub score: i64,
    /// Positions in [`SearchResults::allocations`] it matched in
    pub allocations: Vec<usize>,
}

/// Outcome of one search
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    /// Raw query text
    pub query: String,
    /// Canonical tokens the query was parsed into
    pub tokens: Vec<String>,
    /// The requested page of ids, best first
    pub ids: Vec<DocId>,
    /// The requested page with scores
    pub hits: Vec<Hit>,
    /// Matches before pagination
    pub total: usize,
    /// Offset the page starts at
    pub offset: usize,
    /// Wall time spent
    #[serde(rename = "duration_us", serialize_with = "as_micros")]
    pub duration: Duration,
    /// Every combination that matched, across indexes
    pub allocations: Vec<Allocation>,
}

fn as_micros<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_micros().min(u64::MAX as u128) as u64)
}

impl SearchResults {
    /// No matches
    pub fn empty(query: impl Into<String>, offset: usize) -> Self {
        SearchResults {
            query: query.into(),
            tokens: Vec::new(),
            ids: Vec::new(),
            hits: Vec::new(),
            total: 0,
            offset,
            duration: Duration::ZERO,
            allocations: Vec::new(),
        }
    }

    /// Number of ids on this page
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when this page holds no ids
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Result identifiers of the indexes a hit came from
    pub fn result_identifiers(&self, hit: &Hit) -> Vec<&str> {
        let mut identifiers: Vec<&str> = Vec::new();
        for &position in &hit.allocations {
            if let Some(allocation) = self.allocations.get(position) {
                let identifier = allocation.result_identifier.as_str();
                if !identifiers.contains(&identifier) {
                    identifiers.push(identifier);
                }
            }
        }
        identifiers
    }

    /// Serialize to the JSON payload
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> SearchResults {
        let allocation = |index: &str, categories: &[&str], weight, ids: &[u64]| Allocation {
            index: index.to_string(),
            result_identifier: format!("{index}_result"),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            weight,
            ids: ids.iter().map(|&id| DocId::from(id)).collect(),
            count: ids.len(),
        };
        SearchResults {
            query: "tolkien".to_string(),
            tokens: vec!["tolkien".to_string()],
            ids: vec![DocId::new(2)],
            hits: vec![Hit {
                id: DocId::new(2),
                score: 7,
                allocations: vec![0, 1, 2],
            }],
            total: 1,
            offset: 0,
            duration: Duration::from_micros(41),
            allocations: vec![
                allocation("books", &["author"], 6, &[2]),
                allocation("books", &["title"], 1, &[2]),
                allocation("films", &["title"], 1, &[2]),
            ],
        }
    }

    #[test]
    fn test_json_payload() {
        let json: serde_json::Value = serde_json::from_str(&results().to_json().unwrap()).unwrap();
        assert_eq!(json["ids"], serde_json::json!([2]));
        assert_eq!(json["hits"][0]["score"], 7);
        assert_eq!(json["total"], 1);
        assert_eq!(json["duration_us"], 41);
        assert_eq!(json["allocations"][0]["result_identifier"], "books_result");
        assert_eq!(json["allocations"][0]["categories"], serde_json::json!(["author"]));
        assert_eq!(json["allocations"][0]["count"], 1);
        assert!(json["allocations"][0].get("ids").is_none());
    }

    #[test]
    fn test_result_identifiers() {
        let results = results();
        assert_eq!(
            results.result_identifiers(&results.hits[0]),
            ["books_result", "films_result"]
        );
    }

    #[test]
    fn test_empty() {
        let results = SearchResults::empty("nothing", 20);
        assert!(results.is_empty());
        assert_eq!(results.total, 0);
        assert_eq!(results.offset, 20);
        assert_eq!(results.len(), 0);
    }
}
