//! Postings engine interface and an in-memory reference implementation.
//!
//! The core does not own an inverted index; it binds flattened leaves to
//! whatever implements [`PostingsEngine`]. [`MemoryPostings`] is a simple
//! hash-table engine good enough for tests and embedded use. It does no
//! scoring.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use serde_json::Value;

use crate::analysis::Tokenizer;
use crate::error::Result;

/// Internal document identifier. Allocated sequentially per collection, so
/// ascending ids follow insertion order.
pub type DocId = u64;

/// Per-document result of querying one field.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafHit {
    /// The matching document.
    pub doc_id: DocId,
    /// Case-folded query tokens that occurred in this field, in query
    /// order.
    pub matched_tokens: Vec<String>,
}

/// External inverted-index engine the core binds flattened leaves to.
pub trait PostingsEngine: Send + Sync {
    /// Index one flattened leaf value under a field name.
    fn index_leaf(&mut self, field: &str, doc_id: DocId, value: &Value, is_array: bool)
        -> Result<()>;

    /// Drop everything indexed for `(field, doc_id)`.
    fn remove_leaf(&mut self, field: &str, doc_id: DocId) -> Result<()>;

    /// Find documents where any of the (case-folded) tokens occur in the
    /// field. Hits report which tokens matched per document.
    fn query(&self, field: &str, tokens: &[String]) -> Result<Vec<LeafHit>>;
}

#[derive(Default)]
struct FieldPostings {
    /// token -> documents containing it
    terms: AHashMap<String, AHashSet<DocId>>,
    /// document -> tokens it contributed (for removal)
    docs: AHashMap<DocId, AHashSet<String>>,
}

/// Hash-table postings engine holding everything in memory.
pub struct MemoryPostings {
    tokenizer: Arc<dyn Tokenizer>,
    fields: AHashMap<String, FieldPostings>,
}

impl MemoryPostings {
    /// Create an engine that analyzes text values with the given
    /// tokenizer.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        MemoryPostings {
            tokenizer,
            fields: AHashMap::new(),
        }
    }

    fn tokens_of(&self, value: &Value, out: &mut Vec<String>) -> Result<()> {
        match value {
            Value::String(text) => {
                for token in self.tokenizer.tokenize(text)? {
                    out.push(token.folded());
                }
            }
            Value::Number(n) => out.push(n.to_string()),
            Value::Bool(b) => out.push(b.to_string()),
            Value::Array(elements) => {
                for element in elements {
                    self.tokens_of(element, out)?;
                }
            }
            Value::Null | Value::Object(_) => {}
        }
        Ok(())
    }
}

impl PostingsEngine for MemoryPostings {
    fn index_leaf(
        &mut self,
        field: &str,
        doc_id: DocId,
        value: &Value,
        _is_array: bool,
    ) -> Result<()> {
        let mut tokens = Vec::new();
        self.tokens_of(value, &mut tokens)?;

        let postings = self.fields.entry(field.to_string()).or_default();
        let doc_tokens = postings.docs.entry(doc_id).or_default();
        for token in tokens {
            postings
                .terms
                .entry(token.clone())
                .or_default()
                .insert(doc_id);
            doc_tokens.insert(token);
        }
        Ok(())
    }

    fn remove_leaf(&mut self, field: &str, doc_id: DocId) -> Result<()> {
        if let Some(postings) = self.fields.get_mut(field) {
            if let Some(tokens) = postings.docs.remove(&doc_id) {
                for token in tokens {
                    if let Some(docs) = postings.terms.get_mut(&token) {
                        docs.remove(&doc_id);
                        if docs.is_empty() {
                            postings.terms.remove(&token);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn query(&self, field: &str, tokens: &[String]) -> Result<Vec<LeafHit>> {
        let Some(postings) = self.fields.get(field) else {
            return Ok(Vec::new());
        };

        let mut matched: AHashMap<DocId, Vec<String>> = AHashMap::new();
        for token in tokens {
            if let Some(docs) = postings.terms.get(token) {
                for doc_id in docs {
                    let entry = matched.entry(*doc_id).or_default();
                    if !entry.contains(token) {
                        entry.push(token.clone());
                    }
                }
            }
        }

        let mut hits: Vec<LeafHit> = matched
            .into_iter()
            .map(|(doc_id, matched_tokens)| LeafHit {
                doc_id,
                matched_tokens,
            })
            .collect();
        hits.sort_by_key(|h| h.doc_id);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StandardTokenizer;
    use serde_json::json;

    fn engine() -> MemoryPostings {
        MemoryPostings::new(Arc::new(StandardTokenizer::new()))
    }

    #[test]
    fn test_index_and_query() {
        let mut postings = engine();
        postings
            .index_leaf("street", 1, &json!("One Bowerman Drive"), false)
            .unwrap();
        postings
            .index_leaf("street", 2, &json!(["175 Commerce Valley"]), true)
            .unwrap();

        let hits = postings
            .query("street", &["drive".to_string(), "commerce".to_string()])
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].doc_id, 1);
        assert_eq!(hits[0].matched_tokens, vec!["drive"]);
        assert_eq!(hits[1].matched_tokens, vec!["commerce"]);
    }

    #[test]
    fn test_numeric_values_index_as_terms() {
        let mut postings = engine();
        postings
            .index_leaf("pincode", 7, &json!([100, 200]), true)
            .unwrap();
        let hits = postings.query("pincode", &["200".to_string()]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 7);
    }

    #[test]
    fn test_remove_leaf() {
        let mut postings = engine();
        postings
            .index_leaf("name", 3, &json!("nike"), false)
            .unwrap();
        postings.remove_leaf("name", 3).unwrap();
        assert!(postings.query("name", &["nike".to_string()]).unwrap().is_empty());
    }

    #[test]
    fn test_query_unknown_field_is_empty() {
        let postings = engine();
        assert!(postings.query("nope", &["x".to_string()]).unwrap().is_empty());
    }
}
