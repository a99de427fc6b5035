//! Error types for the Kasane library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`KasaneError`] enum. Field-related errors deliberately use the same
//! user-visible wording for "missing" and "wrong shape" so that a document
//! rejection never leaks whether a path existed with a different type.
//!
//! # Examples
//!
//! ```
//! use kasane::error::{KasaneError, Result};
//!
//! fn lookup(path: &str) -> Result<()> {
//!     Err(KasaneError::unknown_field(path))
//! }
//!
//! let err = lookup("company.ceo").unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "Could not find a field named `company.ceo` in the schema."
//! );
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Kasane operations.
#[derive(Error, Debug)]
pub enum KasaneError {
    /// A query or ingest referenced a path with no schema entry.
    #[error("Could not find a field named `{path}` in the schema.")]
    UnknownField {
        /// The offending dotted path.
        path: String,
    },

    /// A value's shape violates the declared or inferred type.
    #[error("Field `{path}` was not found or has an incorrect type.")]
    TypeMismatch {
        /// The dotted path of the field.
        path: String,
        /// The type the schema declared or previously inferred.
        expected: &'static str,
        /// The type actually found in the document.
        found: &'static str,
    },

    /// A non-optional field was absent on ingest.
    #[error("Field `{path}` was not found or has an incorrect type.")]
    MissingRequiredField {
        /// The dotted path of the field.
        path: String,
    },

    /// A dotted path was used without `enable_nested_fields`.
    #[error("Field `{path}` uses a nested path but `enable_nested_fields` is false.")]
    NestedNotEnabled {
        /// The dotted path of the field.
        path: String,
    },

    /// Malformed search parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// I/O errors (file operations, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors surfaced by the document store, re-raised without
    /// transformation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`KasaneError`].
pub type Result<T> = std::result::Result<T, KasaneError>;

impl KasaneError {
    /// Create a new unknown-field error.
    pub fn unknown_field<S: Into<String>>(path: S) -> Self {
        KasaneError::UnknownField { path: path.into() }
    }

    /// Create a new type-mismatch error.
    pub fn type_mismatch<S: Into<String>>(
        path: S,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        KasaneError::TypeMismatch {
            path: path.into(),
            expected,
            found,
        }
    }

    /// Create a new missing-required-field error.
    pub fn missing_required<S: Into<String>>(path: S) -> Self {
        KasaneError::MissingRequiredField { path: path.into() }
    }

    /// Create a new nested-not-enabled error.
    pub fn nested_not_enabled<S: Into<String>>(path: S) -> Self {
        KasaneError::NestedNotEnabled { path: path.into() }
    }

    /// Create a new invalid-request error.
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        KasaneError::InvalidRequest(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        KasaneError::Storage(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        KasaneError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = KasaneError::unknown_field("locations.address.str");
        assert_eq!(
            error.to_string(),
            "Could not find a field named `locations.address.str` in the schema."
        );

        let error = KasaneError::type_mismatch("locations", "object[]", "string");
        assert_eq!(
            error.to_string(),
            "Field `locations` was not found or has an incorrect type."
        );

        let error = KasaneError::missing_required("details");
        assert_eq!(
            error.to_string(),
            "Field `details` was not found or has an incorrect type."
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let kasane_error = KasaneError::from(io_error);

        match kasane_error {
            KasaneError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
