//! Document store abstraction and the in-memory backend.

use ahash::AHashMap;

use crate::error::Result;
use crate::index::postings::DocId;

/// Key/value backend holding augmented document bytes.
///
/// Storage errors are re-raised to callers without transformation.
pub trait DocumentStore: Send + Sync {
    /// Store the serialized document.
    fn put(&mut self, doc_id: DocId, bytes: &[u8]) -> Result<()>;

    /// Fetch the serialized document, if present.
    fn get(&self, doc_id: DocId) -> Result<Option<Vec<u8>>>;

    /// Remove the document.
    fn delete(&mut self, doc_id: DocId) -> Result<()>;
}

/// A store that keeps documents in a hash map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: AHashMap<DocId, Vec<u8>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        MemoryStore {
            docs: AHashMap::new(),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn put(&mut self, doc_id: DocId, bytes: &[u8]) -> Result<()> {
        self.docs.insert(doc_id, bytes.to_vec());
        Ok(())
    }

    fn get(&self, doc_id: DocId) -> Result<Option<Vec<u8>>> {
        Ok(self.docs.get(&doc_id).cloned())
    }

    fn delete(&mut self, doc_id: DocId) -> Result<()> {
        self.docs.remove(&doc_id);
        Ok(())
    }
}
