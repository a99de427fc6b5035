//! Schema module.
//!
//! Field declarations, the per-collection registry, and the wildcard
//! auto-schema live here. Dotted paths address leaves inside nested
//! objects; the registry decides which paths exist and with what type.

pub mod field;
pub mod registry;

pub use field::{json_type_name, Field, FieldType, WILDCARD_NAME};
pub use registry::{CollectionSchema, SchemaRegistry};
