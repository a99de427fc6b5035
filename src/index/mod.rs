//! Indexer facade.
//!
//! Binds flattened leaves to the external [`PostingsEngine`] and keeps the
//! `doc_id -> augmented document bytes` mapping in the [`DocumentStore`].
//! Write-operation semantics (UPSERT replaces, UPDATE merges, EMPLACE
//! creates or merges) are decided by the collection; the facade only
//! executes the resulting index/remove/store calls.

pub mod postings;
pub mod store;

use serde_json::{Map, Value};

pub use postings::{DocId, LeafHit, MemoryPostings, PostingsEngine};
pub use store::{DocumentStore, MemoryStore};

use crate::error::{KasaneError, Result};
use crate::flatten::FlattenedLeaf;

/// The document write operations accepted on ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    /// Insert a new document; fails when the id already exists.
    Create,
    /// Replace the stored document wholesale; leaves present before but
    /// absent after are removed from the index.
    Upsert,
    /// Merge the partial document into the stored one; absent paths keep
    /// their indexed values. Fails when the id does not exist.
    Update,
    /// UPDATE semantics, creating the document when missing.
    Emplace,
}

/// Facade over the postings engine and the document store.
pub struct Indexer {
    postings: Box<dyn PostingsEngine>,
    store: Box<dyn DocumentStore>,
}

impl Indexer {
    /// Create a facade over the given collaborators.
    pub fn new(postings: Box<dyn PostingsEngine>, store: Box<dyn DocumentStore>) -> Self {
        Indexer { postings, store }
    }

    /// Index every indexable flattened leaf of one document.
    pub fn index_leaves(&mut self, doc_id: DocId, leaves: &[FlattenedLeaf]) -> Result<()> {
        for leaf in leaves {
            if !leaf.field.index {
                continue;
            }
            self.postings.index_leaf(
                &leaf.field.name,
                doc_id,
                &leaf.value,
                leaf.field.field_type.is_array(),
            )?;
        }
        Ok(())
    }

    /// Drop postings for the given field paths of one document.
    pub fn remove_paths<'a, I>(&mut self, doc_id: DocId, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for path in paths {
            self.postings.remove_leaf(path, doc_id)?;
        }
        Ok(())
    }

    /// Query one field of the postings engine.
    pub fn query(&self, field: &str, tokens: &[String]) -> Result<Vec<LeafHit>> {
        self.postings.query(field, tokens)
    }

    /// Persist the augmented document.
    pub fn put_document(&mut self, doc_id: DocId, doc: &Map<String, Value>) -> Result<()> {
        let bytes = serde_json::to_vec(doc)?;
        self.store.put(doc_id, &bytes)
    }

    /// Load the augmented document.
    pub fn get_document(&self, doc_id: DocId) -> Result<Option<Map<String, Value>>> {
        match self.store.get(doc_id)? {
            Some(bytes) => {
                let value: Value = serde_json::from_slice(&bytes)?;
                match value {
                    Value::Object(map) => Ok(Some(map)),
                    _ => Err(KasaneError::storage(format!(
                        "stored document {doc_id} is not a JSON object"
                    ))),
                }
            }
            None => Ok(None),
        }
    }

    /// Remove the stored document.
    pub fn delete_document(&mut self, doc_id: DocId) -> Result<()> {
        self.store.delete(doc_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StandardTokenizer;
    use crate::schema::{Field, FieldType};
    use serde_json::json;
    use std::sync::Arc;

    fn indexer() -> Indexer {
        Indexer::new(
            Box::new(MemoryPostings::new(Arc::new(StandardTokenizer::new()))),
            Box::new(MemoryStore::new()),
        )
    }

    #[test]
    fn test_index_and_remove_leaves() {
        let mut indexer = indexer();
        let leaves = vec![FlattenedLeaf {
            field: Field::new("locations.country", FieldType::StringArray).nested_array(true),
            value: json!(["USA", "Canada"]),
        }];
        indexer.index_leaves(9, &leaves).unwrap();

        let hits = indexer
            .query("locations.country", &["canada".to_string()])
            .unwrap();
        assert_eq!(hits.len(), 1);

        indexer.remove_paths(9, ["locations.country"]).unwrap();
        assert!(indexer
            .query("locations.country", &["canada".to_string()])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_non_indexed_leaf_is_skipped() {
        let mut indexer = indexer();
        let leaves = vec![FlattenedLeaf {
            field: Field::new("company.name", FieldType::String).index(false),
            value: json!("nike"),
        }];
        indexer.index_leaves(1, &leaves).unwrap();
        assert!(indexer
            .query("company.name", &["nike".to_string()])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_document_round_trip() {
        let mut indexer = indexer();
        let doc = match json!({"company": {"name": "nike"}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        indexer.put_document(4, &doc).unwrap();
        assert_eq!(indexer.get_document(4).unwrap().unwrap(), doc);
        assert_eq!(indexer.get_document(5).unwrap(), None);

        indexer.delete_document(4).unwrap();
        assert_eq!(indexer.get_document(4).unwrap(), None);
    }
}
