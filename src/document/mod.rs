//! Augmented-document helpers.
//!
//! Documents are plain JSON object trees (`serde_json::Map`). The stored
//! form is *augmented*: the flattener inserts each generated leaf as a
//! literal top-level dotted key, plus a synthetic [`FLAT_FIELD`] entry
//! listing those keys. Stripping the manifest and the keys it lists
//! restores the original tree byte for byte.

use serde_json::{Map, Value};

/// The synthetic key listing the dotted paths generated by flattening.
pub const FLAT_FIELD: &str = ".flat";

/// The reserved document identifier field. Never flattened or highlighted.
pub const ID_FIELD: &str = "id";

/// The dotted paths recorded in a stored document's manifest.
pub fn flat_paths(doc: &Map<String, Value>) -> Vec<String> {
    match doc.get(FLAT_FIELD) {
        Some(Value::Array(paths)) => paths
            .iter()
            .filter_map(|p| p.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Remove the manifest and every flattened key it lists, restoring the
/// original document tree.
pub fn strip_flattened(doc: &mut Map<String, Value>) {
    if let Some(Value::Array(paths)) = doc.remove(FLAT_FIELD) {
        for p in paths {
            if let Value::String(p) = p {
                doc.remove(&p);
            }
        }
    }
}

/// Merge a partial document into a stored one (UPDATE / EMPLACE).
///
/// Objects merge key-wise and recursively; arrays and scalars replace
/// wholesale. An empty object on the incoming side therefore changes
/// nothing under that subtree.
pub fn merge_partial(stored: &mut Map<String, Value>, update: &Map<String, Value>) {
    for (key, incoming) in update {
        match (stored.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(partial)) => {
                merge_partial(existing, partial);
            }
            _ => {
                stored.insert(key.clone(), incoming.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_strip_restores_original() {
        let original = json!({
            "company": {"name": "nike"},
            "locations": [{"country": "USA"}]
        });
        let mut augmented = as_map(original.clone());
        augmented.insert("locations.country".to_string(), json!(["USA"]));
        augmented.insert(FLAT_FIELD.to_string(), json!(["locations.country"]));

        strip_flattened(&mut augmented);
        assert_eq!(Value::Object(augmented), original);
    }

    #[test]
    fn test_strip_without_manifest_is_noop() {
        let mut doc = as_map(json!({"a": 1}));
        strip_flattened(&mut doc);
        assert_eq!(Value::Object(doc), json!({"a": 1}));
    }

    #[test]
    fn test_merge_partial_objects() {
        let mut stored = as_map(json!({
            "company": {"num_employees": 2000, "founded": 1976},
            "studies": [{"name": "College 1"}]
        }));
        let update = as_map(json!({
            "company": {"num_employees": 3000},
            "studies": [{"name": "College Alpha", "year": 1967}]
        }));

        merge_partial(&mut stored, &update);
        assert_eq!(
            Value::Object(stored),
            json!({
                "company": {"num_employees": 3000, "founded": 1976},
                "studies": [{"name": "College Alpha", "year": 1967}]
            })
        );
    }

    #[test]
    fn test_merge_empty_object_changes_nothing() {
        let mut stored = as_map(json!({"company": {"num_employees": 2000}}));
        let update = as_map(json!({"company": {}}));
        merge_partial(&mut stored, &update);
        assert_eq!(
            Value::Object(stored),
            json!({"company": {"num_employees": 2000}})
        );
    }
}
