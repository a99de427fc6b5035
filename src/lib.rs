//! # Kasane
//!
//! A nested-field document indexing, search and highlighting core.
//!
//! Kasane accepts tree-shaped JSON documents, flattens their leaves under
//! dotted paths (`locations.address.street`), and answers keyword queries
//! with filter, sort, group-by and include/exclude projections. Search
//! hits carry mirror trees that point at the matching leaves inside the
//! original document shape, arrays kept aligned element by element.
//!
//! ## Features
//!
//! - Explicit schemas and a `.*` wildcard auto-schema with type inference
//! - Array-of-object flattening with document-order value aggregation
//! - Dotted-key precedence over nested values
//! - Include/exclude projection that preserves array structure
//! - Snippet and full highlight mirror trees with matched-token metadata
//! - Pluggable postings engine, document store and tokenizer
//!
//! ## Example
//!
//! ```
//! use kasane::collection::Collection;
//! use kasane::index::WriteOperation;
//! use kasane::schema::{CollectionSchema, Field, FieldType};
//! use kasane::search::SearchRequest;
//! use serde_json::json;
//!
//! # fn main() -> kasane::error::Result<()> {
//! let schema = CollectionSchema {
//!     name: "companies".to_string(),
//!     enable_nested_fields: true,
//!     fields: vec![Field::new(".*", FieldType::Auto)],
//! };
//! let collection = Collection::with_memory(&schema)?;
//!
//! collection.add(
//!     json!({
//!         "company": {"name": "Nike Inc."},
//!         "locations": [{"address": {"street": "One Bowerman Drive"}}]
//!     }),
//!     WriteOperation::Create,
//! )?;
//!
//! let request = SearchRequest::new("bowerman").query_by(["locations.address.street"]);
//! let results = collection.search(&request)?;
//! assert_eq!(results.found, 1);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod collection;
pub mod document;
pub mod error;
pub mod flatten;
pub mod highlight;
pub mod index;
pub mod path;
pub mod schema;
pub mod search;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
