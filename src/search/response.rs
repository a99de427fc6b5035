//! Search response shapes.

use serde::Serialize;
use serde_json::Value;

use crate::highlight::HighlightResult;

/// One matching document.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// The original tree, projected through include/exclude fields.
    pub document: Value,
    /// Snippet/full mirror trees plus the matched-token meta block.
    pub highlight: HighlightResult,
    /// Legacy flat highlight list; always empty for nested fields, the
    /// mirror tree is authoritative.
    pub highlights: Vec<Value>,
}

/// Hits sharing one group key.
#[derive(Debug, Clone, Serialize)]
pub struct GroupedHits {
    /// One entry per `group_by` path; nested-array paths contribute their
    /// full value array.
    pub group_key: Vec<Value>,
    /// Hits in this group, capped at `group_limit`.
    pub hits: Vec<SearchHit>,
}

/// The response to one search request.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// Total number of matching documents.
    pub found: usize,
    /// Matching documents, up to the requested limit. Empty when grouping.
    pub hits: Vec<SearchHit>,
    /// Groups in first-seen order; present only for group-by requests.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub grouped_hits: Vec<GroupedHits>,
}
