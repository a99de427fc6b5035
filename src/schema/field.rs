//! Field declarations for collection schemas.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The name of the wildcard (auto-schema) entry.
pub const WILDCARD_NAME: &str = ".*";

/// Declared or inferred type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// UTF-8 string.
    #[serde(rename = "string")]
    String,
    /// 32-bit signed integer.
    #[serde(rename = "int32")]
    Int32,
    /// 64-bit signed integer.
    #[serde(rename = "int64")]
    Int64,
    /// 64-bit float.
    #[serde(rename = "float")]
    Float,
    /// Boolean.
    #[serde(rename = "bool")]
    Bool,
    /// Array of strings.
    #[serde(rename = "string[]")]
    StringArray,
    /// Array of 32-bit integers.
    #[serde(rename = "int32[]")]
    Int32Array,
    /// Array of 64-bit integers.
    #[serde(rename = "int64[]")]
    Int64Array,
    /// Array of floats.
    #[serde(rename = "float[]")]
    FloatArray,
    /// Array of booleans.
    #[serde(rename = "bool[]")]
    BoolArray,
    /// Nested object; its scalar leaves are flattened under dotted paths.
    #[serde(rename = "object")]
    Object,
    /// Array of nested objects; leaves are flattened as arrays of values in
    /// document order.
    #[serde(rename = "object[]")]
    ObjectArray,
    /// Type inferred from the first document that carries the path.
    #[serde(rename = "auto")]
    Auto,
}

impl FieldType {
    /// The serialized type tag, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::StringArray => "string[]",
            FieldType::Int32Array => "int32[]",
            FieldType::Int64Array => "int64[]",
            FieldType::FloatArray => "float[]",
            FieldType::BoolArray => "bool[]",
            FieldType::Object => "object",
            FieldType::ObjectArray => "object[]",
            FieldType::Auto => "auto",
        }
    }

    /// True for array types, including `object[]`.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            FieldType::StringArray
                | FieldType::Int32Array
                | FieldType::Int64Array
                | FieldType::FloatArray
                | FieldType::BoolArray
                | FieldType::ObjectArray
        )
    }

    /// True for `object` and `object[]`.
    pub fn is_object_kind(&self) -> bool {
        matches!(self, FieldType::Object | FieldType::ObjectArray)
    }

    /// Promote a scalar type to its array variant. Array and object types
    /// are returned unchanged.
    pub fn to_array(&self) -> FieldType {
        match self {
            FieldType::String => FieldType::StringArray,
            FieldType::Int32 => FieldType::Int32Array,
            FieldType::Int64 => FieldType::Int64Array,
            FieldType::Float => FieldType::FloatArray,
            FieldType::Bool => FieldType::BoolArray,
            other => *other,
        }
    }

    /// The element type of an array variant; scalar types return themselves.
    pub fn element(&self) -> FieldType {
        match self {
            FieldType::StringArray => FieldType::String,
            FieldType::Int32Array => FieldType::Int32,
            FieldType::Int64Array => FieldType::Int64,
            FieldType::FloatArray => FieldType::Float,
            FieldType::BoolArray => FieldType::Bool,
            other => *other,
        }
    }

    /// Shape-check a single scalar against this (scalar) type.
    pub fn matches_scalar(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Int32 => value
                .as_i64()
                .map(|n| i32::try_from(n).is_ok())
                .unwrap_or(false),
            FieldType::Int64 => value.is_i64() || value.is_u64(),
            // integers are acceptable where a float is declared
            FieldType::Float => value.is_number(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Auto => !value.is_object() && !value.is_array() && !value.is_null(),
            _ => false,
        }
    }

    /// Infer a concrete type from a JSON value.
    ///
    /// Returns `None` for nulls and empty arrays, where no element type can
    /// be determined yet.
    pub fn infer(value: &Value) -> Option<FieldType> {
        match value {
            Value::String(_) => Some(FieldType::String),
            Value::Bool(_) => Some(FieldType::Bool),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i32::try_from(i).is_ok() {
                        Some(FieldType::Int32)
                    } else {
                        Some(FieldType::Int64)
                    }
                } else {
                    Some(FieldType::Float)
                }
            }
            Value::Array(elements) => {
                if crate::path::is_object_array(elements) {
                    Some(FieldType::ObjectArray)
                } else {
                    let first = elements.iter().find(|v| !v.is_null())?;
                    FieldType::infer(first).map(|t| t.to_array())
                }
            }
            Value::Object(_) => Some(FieldType::Object),
            Value::Null => None,
        }
    }
}

/// JSON type tag of a value, for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn default_index() -> bool {
    true
}

/// An entry in the schema registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Dotted path of the field; `.*` denotes the wildcard entry.
    pub name: String,

    /// Declared or inferred type.
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Whether the field may be absent from a document.
    #[serde(default)]
    pub optional: bool,

    /// Whether the field participates in faceting (delegated to the
    /// postings engine).
    #[serde(default)]
    pub facet: bool,

    /// Whether the field is indexed.
    #[serde(default = "default_index")]
    pub index: bool,

    /// Whether the field supports sorting (delegated to the postings
    /// engine).
    #[serde(default)]
    pub sort: bool,

    /// True when the field's logical value lives under at least one
    /// array-of-objects ancestor or inside a nested object. Computed from
    /// the name and the documents seen.
    #[serde(default)]
    pub nested: bool,

    /// True when any ancestor on the path is an array.
    #[serde(default)]
    pub nested_array: bool,
}

impl Field {
    /// Create a field with the given name and type. `nested` is derived
    /// from the name; flags default to non-facet, indexed, non-sort.
    pub fn new<S: Into<String>>(name: S, field_type: FieldType) -> Self {
        let name = name.into();
        let nested = name != WILDCARD_NAME && name.contains('.');
        Field {
            name,
            field_type,
            optional: false,
            facet: false,
            index: true,
            sort: false,
            nested,
            nested_array: false,
        }
    }

    /// Set whether this field is optional.
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Set whether this field is faceted.
    pub fn facet(mut self, facet: bool) -> Self {
        self.facet = facet;
        self
    }

    /// Set whether this field is indexed.
    pub fn index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    /// Set whether this field is sortable.
    pub fn sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    /// Mark this field as sourced from under an array ancestor.
    pub fn nested_array(mut self, nested_array: bool) -> Self {
        self.nested_array = nested_array;
        self
    }

    /// True for the `.*` wildcard entry.
    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD_NAME
    }

    /// Recompute the `nested` flag after deserialization.
    pub(crate) fn normalize(&mut self) {
        self.nested = !self.is_wildcard() && self.name.contains('.');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_tags_round_trip() {
        for (tag, expected) in [
            ("\"string\"", FieldType::String),
            ("\"int32[]\"", FieldType::Int32Array),
            ("\"object[]\"", FieldType::ObjectArray),
            ("\"auto\"", FieldType::Auto),
        ] {
            let parsed: FieldType = serde_json::from_str(tag).unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(serde_json::to_string(&parsed).unwrap(), tag);
        }
    }

    #[test]
    fn test_array_promotion() {
        assert_eq!(FieldType::Int32.to_array(), FieldType::Int32Array);
        assert_eq!(FieldType::String.to_array(), FieldType::StringArray);
        assert_eq!(FieldType::ObjectArray.to_array(), FieldType::ObjectArray);
        assert_eq!(FieldType::Int32Array.element(), FieldType::Int32);
    }

    #[test]
    fn test_scalar_shape_checks() {
        assert!(FieldType::Int32.matches_scalar(&json!(100)));
        assert!(!FieldType::Int32.matches_scalar(&json!(i64::MAX)));
        assert!(FieldType::Int64.matches_scalar(&json!(i64::MAX)));
        assert!(FieldType::Float.matches_scalar(&json!(1.5)));
        assert!(FieldType::Float.matches_scalar(&json!(3)));
        assert!(FieldType::String.matches_scalar(&json!("USA")));
        assert!(!FieldType::String.matches_scalar(&json!(1)));
    }

    #[test]
    fn test_type_inference() {
        assert_eq!(FieldType::infer(&json!("x")), Some(FieldType::String));
        assert_eq!(FieldType::infer(&json!(2000)), Some(FieldType::Int32));
        assert_eq!(
            FieldType::infer(&json!(10_000_000_000_i64)),
            Some(FieldType::Int64)
        );
        assert_eq!(FieldType::infer(&json!(1.5)), Some(FieldType::Float));
        assert_eq!(
            FieldType::infer(&json!(["a", "b"])),
            Some(FieldType::StringArray)
        );
        assert_eq!(
            FieldType::infer(&json!([{"a": 1}])),
            Some(FieldType::ObjectArray)
        );
        assert_eq!(FieldType::infer(&json!({"a": 1})), Some(FieldType::Object));
        assert_eq!(FieldType::infer(&json!(null)), None);
        assert_eq!(FieldType::infer(&json!([])), None);
    }

    #[test]
    fn test_field_nested_flag() {
        assert!(!Field::new("company", FieldType::Object).nested);
        assert!(Field::new("company.name", FieldType::String).nested);
        assert!(!Field::new(".*", FieldType::Auto).nested);
    }
}
