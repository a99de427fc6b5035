//! Collections tie the pieces together.
//!
//! A [`Collection`] owns a schema registry, an indexer facade over the
//! postings engine and document store, and a tokenizer. Ingest flattens
//! documents and feeds the facade; search binds field references, gathers
//! hits, then shapes each hit through the projector and the highlight
//! builder.
//!
//! Locking is coarse: ingest takes the write locks, search the read
//! locks. Within one call execution is sequential.

use std::cmp::Ordering;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use log::debug;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::analysis::{StandardTokenizer, Tokenizer};
use crate::document::{self, FLAT_FIELD, ID_FIELD};
use crate::error::{KasaneError, Result};
use crate::flatten;
use crate::highlight::{HighlightBuilder, HighlightConfig, HighlightResult};
use crate::index::{
    DocId, DocumentStore, Indexer, MemoryPostings, MemoryStore, PostingsEngine, WriteOperation,
};
use crate::schema::{CollectionSchema, Field, SchemaRegistry};
use crate::search::{
    filter, parse_sort, prune, GroupedHits, QueryBinder, SearchHit, SearchRequest, SearchResponse,
    SortOrder,
};

/// External id to internal sequence bookkeeping.
#[derive(Default)]
struct DocTable {
    ids: AHashMap<String, DocId>,
    /// Ascending; doc ids are allocated sequentially so this is insertion
    /// order.
    all: Vec<DocId>,
    next_seq: DocId,
}

/// A searchable collection of documents.
pub struct Collection {
    name: String,
    tokenizer: Arc<dyn Tokenizer>,
    registry: RwLock<SchemaRegistry>,
    indexer: RwLock<Indexer>,
    docs: RwLock<DocTable>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).finish()
    }
}

impl Collection {
    /// Create a collection over the given collaborators.
    pub fn new(
        schema: &CollectionSchema,
        postings: Box<dyn PostingsEngine>,
        store: Box<dyn DocumentStore>,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self> {
        let registry = SchemaRegistry::new(schema)?;
        Ok(Collection {
            name: schema.name.clone(),
            tokenizer,
            registry: RwLock::new(registry),
            indexer: RwLock::new(Indexer::new(postings, store)),
            docs: RwLock::new(DocTable::default()),
        })
    }

    /// Create a collection backed by the in-memory reference
    /// implementations and the standard tokenizer.
    pub fn with_memory(schema: &CollectionSchema) -> Result<Self> {
        let tokenizer: Arc<dyn Tokenizer> = Arc::new(StandardTokenizer::new());
        Collection::new(
            schema,
            Box::new(MemoryPostings::new(Arc::clone(&tokenizer))),
            Box::new(MemoryStore::new()),
            tokenizer,
        )
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stored documents.
    pub fn num_documents(&self) -> usize {
        self.docs.read().all.len()
    }

    /// Snapshot of the registered fields, declaration/synthesis order.
    pub fn fields(&self) -> Vec<Field> {
        self.registry.read().fields().into_iter().cloned().collect()
    }

    /// Fetch a stored document by external id, flattened keys stripped.
    pub fn get(&self, id: &str) -> Result<Option<Value>> {
        let indexer = self.indexer.read();
        let docs = self.docs.read();
        match docs.ids.get(id) {
            Some(&doc_id) => Ok(indexer.get_document(doc_id)?.map(|mut stored| {
                document::strip_flattened(&mut stored);
                Value::Object(stored)
            })),
            None => Ok(None),
        }
    }

    /// Ingest one document under the given write operation. Returns the
    /// stored document (without the flattening internals).
    pub fn add(&self, body: Value, op: WriteOperation) -> Result<Value> {
        let Value::Object(mut incoming) = body else {
            return Err(KasaneError::invalid_request(
                "The document body must be a JSON object",
            ));
        };
        // reserved; regenerated below
        incoming.remove(FLAT_FIELD);

        let explicit_id = match incoming.get(ID_FIELD) {
            None => None,
            Some(Value::String(id)) => Some(id.clone()),
            Some(_) => {
                return Err(KasaneError::invalid_request("Document `id` must be a string"));
            }
        };

        let mut registry = self.registry.write();
        let mut indexer = self.indexer.write();
        let mut docs = self.docs.write();

        let existing = explicit_id
            .as_ref()
            .and_then(|id| docs.ids.get(id).copied());

        match op {
            WriteOperation::Create if existing.is_some() => {
                return Err(KasaneError::invalid_request(format!(
                    "A document with id {} already exists",
                    explicit_id.unwrap_or_default()
                )));
            }
            WriteOperation::Update if existing.is_none() => {
                return Err(KasaneError::invalid_request(format!(
                    "Could not find a document with id: {}",
                    explicit_id.unwrap_or_default()
                )));
            }
            _ => {}
        }

        if explicit_id.is_none() {
            // skip sequence values claimed earlier as explicit ids
            while docs.ids.contains_key(&docs.next_seq.to_string()) {
                docs.next_seq += 1;
            }
        }
        let external_id = explicit_id.unwrap_or_else(|| docs.next_seq.to_string());
        let old_doc = match existing {
            Some(doc_id) => indexer.get_document(doc_id)?,
            None => None,
        };

        let mut working = match (op, &old_doc) {
            (WriteOperation::Update | WriteOperation::Emplace, Some(old)) => {
                let mut merged = old.clone();
                document::strip_flattened(&mut merged);
                document::merge_partial(&mut merged, &incoming);
                merged
            }
            _ => incoming,
        };
        working.insert(ID_FIELD.to_string(), Value::String(external_id.clone()));

        let mut requested: Vec<Field> =
            registry.explicit_fields().into_iter().cloned().collect();
        if registry.has_wildcard() {
            let discovered = flatten::discover_fields(&working, &registry);
            for field in &discovered {
                registry.declare_synthesized(field.clone())?;
            }
            requested.extend(discovered);
        }

        let leaves = flatten::flatten_document(&mut working, &requested)?;
        for leaf in &leaves {
            registry.declare_synthesized(leaf.field.clone())?;
        }

        let doc_id = existing.unwrap_or(docs.next_seq);
        if let Some(old) = &old_doc {
            let mut stale = document::flat_paths(old);
            for key in old.keys() {
                if key != FLAT_FIELD
                    && registry.resolve(key).is_some()
                    && !stale.contains(key)
                {
                    stale.push(key.clone());
                }
            }
            indexer.remove_paths(doc_id, stale.iter().map(String::as_str))?;
        }
        indexer.index_leaves(doc_id, &leaves)?;
        indexer.put_document(doc_id, &working)?;

        if existing.is_none() {
            docs.ids.insert(external_id.clone(), doc_id);
            docs.all.push(doc_id);
            docs.next_seq += 1;
        }
        debug!(
            "collection `{}`: indexed document `{external_id}` ({} leaves)",
            self.name,
            leaves.len()
        );

        let mut result = working;
        document::strip_flattened(&mut result);
        Ok(Value::Object(result))
    }

    /// Ingest a batch, surfacing success or failure per document. The
    /// batch itself never fails.
    pub fn add_batch(&self, bodies: Vec<Value>, op: WriteOperation) -> Vec<Result<Value>> {
        bodies.into_iter().map(|body| self.add(body, op)).collect()
    }

    /// Execute a search request.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let registry = self.registry.read();
        let indexer = self.indexer.read();
        let docs = self.docs.read();
        let binder = QueryBinder::new(&registry);

        let wildcard = request.query == "*";
        let search_fields: Vec<String> = if wildcard {
            Vec::new()
        } else {
            if request.query_by.is_empty() {
                return Err(KasaneError::invalid_request(
                    "No fields given in `query_by`",
                ));
            }
            binder.bind_query_fields(&request.query_by)?
        };

        let clauses = match &request.filter_by {
            Some(expr) => {
                let clauses = filter::parse(expr)?;
                for clause in &clauses {
                    binder.bind_path(&clause.path)?;
                }
                clauses
            }
            None => Vec::new(),
        };

        let mut sorts: Vec<(String, SortOrder)> = Vec::new();
        for spec in &request.sort_by {
            let (path, order) = parse_sort(spec)?;
            binder.bind_path(&path)?;
            sorts.push((path, order));
        }

        for group in &request.group_by {
            binder.bind_path(group)?;
        }

        let mut query_tokens: Vec<String> = Vec::new();
        if !wildcard {
            for token in self.tokenizer.tokenize(&request.query)? {
                let folded = token.folded();
                if !query_tokens.contains(&folded) {
                    query_tokens.push(folded);
                }
            }
        }

        // every query token must match in at least one searched field
        let candidates: Vec<DocId> = if wildcard {
            docs.all.clone()
        } else {
            let mut matched: AHashMap<DocId, AHashSet<String>> = AHashMap::new();
            for field in &search_fields {
                for hit in indexer.query(field, &query_tokens)? {
                    matched
                        .entry(hit.doc_id)
                        .or_default()
                        .extend(hit.matched_tokens);
                }
            }
            let mut ids: Vec<DocId> = matched
                .into_iter()
                .filter(|(_, tokens)| query_tokens.iter().all(|t| tokens.contains(t)))
                .map(|(doc_id, _)| doc_id)
                .collect();
            ids.sort_unstable();
            ids
        };

        let mut matches: Vec<(DocId, Map<String, Value>)> = Vec::new();
        for doc_id in candidates {
            let Some(stored) = indexer.get_document(doc_id)? else {
                continue;
            };
            if clauses.is_empty() || filter::matches_document(&stored, &clauses) {
                matches.push((doc_id, stored));
            }
        }
        let found = matches.len();
        debug!("collection `{}`: {found} hits for `{}`", self.name, request.query);

        if !sorts.is_empty() {
            matches.sort_by(|a, b| {
                for (path, order) in &sorts {
                    let ord = compare_sort_keys(
                        sort_key(&a.1, path).as_ref(),
                        sort_key(&b.1, path).as_ref(),
                        *order,
                    );
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.0.cmp(&b.0)
            });
        }

        let config = HighlightConfig {
            start_tag: request.highlight_start_tag.clone(),
            end_tag: request.highlight_end_tag.clone(),
            snippet_threshold: request.snippet_threshold,
        };
        let highlighter = HighlightBuilder::new(&config, self.tokenizer.as_ref());
        let full_paths: Vec<String> = request
            .full_highlight_list()
            .map(|list| binder.expand_highlight_fields(list))
            .unwrap_or_default();
        let token_set: AHashSet<String> = query_tokens.iter().cloned().collect();

        let build_hit = |stored: &Map<String, Value>| -> Result<SearchHit> {
            let mut tree = stored.clone();
            document::strip_flattened(&mut tree);
            let highlight = if wildcard {
                HighlightResult::empty()
            } else {
                highlighter.build(&tree, &search_fields, &full_paths, &token_set)?
            };
            let mut projected = tree;
            prune(
                &mut projected,
                &request.include_fields,
                &request.exclude_fields,
            );
            Ok(SearchHit {
                document: Value::Object(projected),
                highlight,
                highlights: Vec::new(),
            })
        };

        if request.group_by.is_empty() {
            let mut hits = Vec::new();
            for (_, stored) in matches.iter().take(request.limit) {
                hits.push(build_hit(stored)?);
            }
            return Ok(SearchResponse {
                found,
                hits,
                grouped_hits: Vec::new(),
            });
        }

        let mut group_order: Vec<String> = Vec::new();
        let mut groups: AHashMap<String, GroupedHits> = AHashMap::new();
        for (_, stored) in &matches {
            let key: Vec<Value> = request
                .group_by
                .iter()
                .map(|path| group_key(stored, path))
                .collect();
            let key_repr = serde_json::to_string(&key)?;
            if !groups.contains_key(&key_repr) {
                group_order.push(key_repr.clone());
                groups.insert(
                    key_repr.clone(),
                    GroupedHits {
                        group_key: key,
                        hits: Vec::new(),
                    },
                );
            }
            let group = groups.get_mut(&key_repr).expect("group just recorded");
            if group.hits.len() < request.group_limit {
                group.hits.push(build_hit(stored)?);
            }
        }
        let grouped_hits: Vec<GroupedHits> = group_order
            .into_iter()
            .take(request.limit)
            .map(|key| groups.remove(&key).expect("group recorded"))
            .collect();

        Ok(SearchResponse {
            found,
            hits: Vec::new(),
            grouped_hits,
        })
    }
}

/// The value a document sorts by for one path. Nested-array paths sort by
/// their first element.
fn sort_key(doc: &Map<String, Value>, path: &str) -> Option<Value> {
    let values = flatten::leaf_values(doc, path);
    let first = values.first()?;
    match first {
        Value::Array(elements) => elements.first().cloned(),
        scalar => Some((*scalar).clone()),
    }
}

fn compare_sort_keys(a: Option<&Value>, b: Option<&Value>, order: SortOrder) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        // missing values sort last regardless of direction
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = compare_values(a, b);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// The grouping key a document contributes for one path. Nested-array
/// paths contribute their full value array.
fn group_key(doc: &Map<String, Value>, path: &str) -> Value {
    let values = flatten::leaf_values(doc, path);
    match values.as_slice() {
        [] => Value::Null,
        [single] => (*single).clone(),
        many => Value::Array(many.iter().map(|v| (*v).clone()).collect()),
    }
}
