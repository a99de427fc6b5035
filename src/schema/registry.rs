//! Schema registry: explicit field declarations plus the wildcard
//! auto-schema.
//!
//! The registry keeps one concrete table of fields keyed by dotted path.
//! The `.*` wildcard entry is second-class: it is consulted only when a
//! concrete lookup misses during ingest, and every path it synthesizes is
//! inserted into the concrete table so subsequent lookups are O(1).

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{KasaneError, Result};
use crate::path;
use crate::schema::field::{Field, FieldType};

/// A collection declaration, as accepted over the ingest API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Collection name.
    pub name: String,

    /// Must be true for dotted paths and object/object[] types to be
    /// accepted.
    #[serde(default)]
    pub enable_nested_fields: bool,

    /// Declared fields, possibly including the `.*` wildcard entry.
    pub fields: Vec<Field>,
}

/// Per-collection field registry.
#[derive(Debug)]
pub struct SchemaRegistry {
    /// Concrete entries keyed by dotted path.
    fields: AHashMap<String, Field>,
    /// Field names in declaration / synthesis order.
    field_names: Vec<String>,
    /// Names that were declared explicitly at creation time. Explicit
    /// entries always win over wildcard synthesis for their exact path.
    explicit: AHashSet<String>,
    /// The `.*` entry, when declared.
    wildcard: Option<Field>,
    /// Whether dotted paths are accepted at all.
    enable_nested_fields: bool,
}

impl SchemaRegistry {
    /// Validate a declaration set and build the registry.
    pub fn new(schema: &CollectionSchema) -> Result<Self> {
        let mut registry = SchemaRegistry {
            fields: AHashMap::new(),
            field_names: Vec::new(),
            explicit: AHashSet::new(),
            wildcard: None,
            enable_nested_fields: schema.enable_nested_fields,
        };

        for declared in &schema.fields {
            let mut field = declared.clone();
            field.normalize();

            if field.name.is_empty() {
                return Err(KasaneError::invalid_request("Field name cannot be empty"));
            }

            if field.is_wildcard() {
                if registry.wildcard.is_some() {
                    return Err(KasaneError::invalid_request(
                        "Only one wildcard `.*` field can be declared",
                    ));
                }
                registry.wildcard = Some(field);
                continue;
            }

            if !schema.enable_nested_fields
                && (field.nested || field.field_type.is_object_kind())
            {
                return Err(KasaneError::nested_not_enabled(&field.name));
            }

            if registry.fields.contains_key(&field.name) {
                return Err(KasaneError::invalid_request(format!(
                    "Field `{}` is declared more than once",
                    field.name
                )));
            }

            registry.explicit.insert(field.name.clone());
            registry.field_names.push(field.name.clone());
            registry.fields.insert(field.name.clone(), field);
        }

        Ok(registry)
    }

    /// Exact-path lookup in the concrete table.
    ///
    /// Wildcard-synthesized paths appear here once they have been observed
    /// by the flattener, so a miss means the path is genuinely unknown.
    pub fn resolve(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Whether a field was declared explicitly at creation time.
    pub fn is_explicit(&self, name: &str) -> bool {
        self.explicit.contains(name)
    }

    /// Whether the `.*` auto-schema entry is active.
    pub fn has_wildcard(&self) -> bool {
        self.wildcard.is_some()
    }

    /// Whether dotted paths are accepted.
    pub fn nested_enabled(&self) -> bool {
        self.enable_nested_fields
    }

    /// Register a field discovered by the flattener.
    ///
    /// Explicit declarations take precedence over synthesized entries with
    /// the same path. A synthesized entry that disagrees with an earlier
    /// one on primitive type is rejected; inferred types are never widened.
    pub fn declare_synthesized(&mut self, mut field: Field) -> Result<()> {
        field.normalize();
        field.optional = true;

        if let Some(existing) = self.fields.get(&field.name) {
            if self.explicit.contains(&field.name) {
                return Ok(());
            }
            if existing.field_type != field.field_type {
                return Err(KasaneError::type_mismatch(
                    &field.name,
                    existing.field_type.name(),
                    field.field_type.name(),
                ));
            }
            return Ok(());
        }

        log::debug!("synthesized field `{}` ({})", field.name, field.field_type.name());
        self.field_names.push(field.name.clone());
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }

    /// All scalar leaves at or below the given dotted path, in registration
    /// order.
    ///
    /// A primitive field expands to itself; an object or object[] path
    /// expands to every primitive field registered underneath it. An empty
    /// result means the path has no searchable leaves.
    pub fn expand_to_leaves(&self, prefix: &str) -> Vec<&Field> {
        let mut leaves = Vec::new();
        for name in &self.field_names {
            let field = &self.fields[name];
            if field.field_type.is_object_kind() || field.field_type == FieldType::Auto {
                continue;
            }
            if path::starts_with_path(name, prefix) {
                leaves.push(field);
            }
        }
        leaves
    }

    /// The explicitly declared fields, in declaration order. These are the
    /// fields every ingest must satisfy; synthesized entries are excluded.
    pub fn explicit_fields(&self) -> Vec<&Field> {
        self.field_names
            .iter()
            .filter(|name| self.explicit.contains(*name))
            .map(|name| &self.fields[name])
            .collect()
    }

    /// All fields in declaration / synthesis order.
    pub fn fields(&self) -> Vec<&Field> {
        self.field_names
            .iter()
            .map(|name| &self.fields[name])
            .collect()
    }

    /// Number of registered fields (the wildcard entry excluded).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the registry has no concrete fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
