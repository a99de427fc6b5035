//! Field-reference resolution for search requests.
//!
//! Every dotted name arriving in `query_by`, `sort_by`, `group_by` or
//! `filter_by` must resolve against the schema registry before execution;
//! unknown paths are hard errors carrying the offending name. Highlight
//! and include/exclude lists are lenient: unknown entries simply expand to
//! nothing.

use crate::document::ID_FIELD;
use crate::error::{KasaneError, Result};
use crate::schema::{Field, SchemaRegistry};

/// Resolves request field references against one registry snapshot.
pub struct QueryBinder<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> QueryBinder<'a> {
    /// Create a binder over the given registry.
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        QueryBinder { registry }
    }

    /// Resolve `query_by` names to searchable leaf paths.
    ///
    /// A primitive path binds to itself; an object or object[] path
    /// expands to every scalar leaf registered beneath it. A name with no
    /// leaves is an error.
    pub fn bind_query_fields(&self, names: &[String]) -> Result<Vec<String>> {
        let mut bound: Vec<String> = Vec::new();
        for name in names {
            let leaves = self.registry.expand_to_leaves(name);
            if leaves.is_empty() {
                return Err(KasaneError::unknown_field(name));
            }
            for field in leaves {
                if !bound.contains(&field.name) {
                    bound.push(field.name.clone());
                }
            }
        }
        Ok(bound)
    }

    /// Resolve a single path for sort/group/filter use.
    pub fn bind_path(&self, name: &str) -> Result<&Field> {
        self.registry
            .resolve(name)
            .ok_or_else(|| KasaneError::unknown_field(name))
    }

    /// Expand a comma-separated highlight field list to leaf paths.
    ///
    /// Unknown names and the synthetic `id` field expand to nothing rather
    /// than erroring.
    pub fn expand_highlight_fields(&self, list: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for raw in list.split(',') {
            let name = raw.trim();
            if name.is_empty() || name == ID_FIELD {
                continue;
            }
            for field in self.registry.expand_to_leaves(name) {
                if field.name != ID_FIELD && !out.contains(&field.name) {
                    out.push(field.name.clone());
                }
            }
        }
        out
    }
}
