//! Include/exclude projection over tree documents.
//!
//! `prune` reshapes a document to the requested result shape. Includes
//! graft sub-trees while preserving every intervening object and array
//! (arrays keep their length; unselected elements become empty objects so
//! positions stay aligned). Excludes always win, even below an included
//! path. Neither set may reference array indices.

use serde_json::{Map, Value};

use crate::document;
use crate::path;

/// Apply include/exclude field sets to a document, in place.
///
/// With a non-empty include set the result starts empty and selected
/// sub-trees are grafted in; otherwise it starts as the full document.
/// Exclusions are applied afterwards, then objects left empty are pruned
/// recursively. Empty arrays are kept; arrays whose every element pruned
/// down to an empty object are dropped. The synthetic `.flat` manifest and
/// the keys it lists never survive projection.
pub fn prune(doc: &mut Map<String, Value>, include: &[String], exclude: &[String]) {
    document::strip_flattened(doc);
    if include.is_empty() && exclude.is_empty() {
        return;
    }

    if !include.is_empty() {
        let mut result = Map::new();
        for field in include {
            graft(doc, &mut result, &path::split(field));
        }
        *doc = result;
    }

    for field in exclude {
        remove_path(doc, &path::split(field));
    }

    prune_empties(doc);
}

/// Copy the sub-tree at the segment path from `source` into `target`,
/// rebuilding the intervening objects and arrays.
fn graft(source: &Map<String, Value>, target: &mut Map<String, Value>, segments: &[&str]) {
    let key = segments[0];
    let Some(value) = source.get(key) else {
        return;
    };

    if segments.len() == 1 {
        target.insert(key.to_string(), value.clone());
        return;
    }

    match value {
        Value::Object(child) => {
            let slot = target
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(slot) = slot {
                graft(child, slot, &segments[1..]);
            }
        }
        Value::Array(elements) => {
            // one mirror element per source element keeps positions aligned
            let slot = target
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(vec![Value::Object(Map::new()); elements.len()]));
            if let Value::Array(slots) = slot {
                for (i, element) in elements.iter().enumerate() {
                    if let (Value::Object(element), Some(Value::Object(slot))) =
                        (element, slots.get_mut(i))
                    {
                        graft(element, slot, &segments[1..]);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Remove the sub-tree at the segment path, descending transparently
/// through arrays of objects.
fn remove_path(doc: &mut Map<String, Value>, segments: &[&str]) {
    let key = segments[0];
    if segments.len() == 1 {
        doc.remove(key);
        return;
    }
    match doc.get_mut(key) {
        Some(Value::Object(child)) => remove_path(child, &segments[1..]),
        Some(Value::Array(elements)) => {
            for element in elements {
                if let Value::Object(element) = element {
                    remove_path(element, &segments[1..]);
                }
            }
        }
        _ => {}
    }
}

/// Drop keys whose value pruned down to nothing: empty objects, and
/// non-empty arrays whose every element is an empty object. Arrays that
/// were empty to begin with are information and stay.
fn prune_empties(doc: &mut Map<String, Value>) {
    let keys: Vec<String> = doc.keys().cloned().collect();
    for key in keys {
        let empty = match doc.get_mut(&key).expect("key just listed") {
            Value::Object(child) => {
                prune_empties(child);
                child.is_empty()
            }
            Value::Array(elements) => {
                for element in elements.iter_mut() {
                    if let Value::Object(element) = element {
                        prune_empties(element);
                    }
                }
                !elements.is_empty()
                    && elements
                        .iter()
                        .all(|e| matches!(e, Value::Object(o) if o.is_empty()))
            }
            _ => false,
        };
        if empty {
            doc.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nike_doc() -> Map<String, Value> {
        match json!({
            "company": {"name": "Nike Inc."},
            "employees": {
                "num": 1200,
                "tags": ["senior plumber", "electrician"]
            },
            "employee": true,
            "locations": [
                { "pincode": 100, "country": "USA",
                  "address": { "street": "One Bowerman Drive", "city": "Beaverton",
                               "products": ["shoes", "tshirts"] }
                },
                { "pincode": 200, "country": "Canada",
                  "address": { "street": "175 Commerce Valley", "city": "Thornhill",
                               "products": ["sneakers", "shoes"] }
                }
            ],
            "one_obj_arr": [{"foo": "bar"}]
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn s(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_exclude_empties_array_of_objects() {
        let mut doc = nike_doc();
        prune(&mut doc, &[], &s(&["one_obj_arr.foo"]));
        assert!(!doc.contains_key("one_obj_arr"));
    }

    #[test]
    fn test_unknown_exclude_is_ignored() {
        let mut doc = nike_doc();
        prune(&mut doc, &s(&["employees.num", "employees.tags"]), &s(&["foobar"]));
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["employees"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_include_leaf_inside_array_of_objects() {
        let mut doc = nike_doc();
        prune(&mut doc, &s(&["locations.address.city"]), &[]);
        assert_eq!(
            Value::Object(doc),
            json!({"locations":[
                {"address":{"city":"Beaverton"}},
                {"address":{"city":"Thornhill"}}
            ]})
        );
    }

    #[test]
    fn test_include_two_leaves_inside_array_of_objects() {
        let mut doc = nike_doc();
        prune(
            &mut doc,
            &s(&["locations.address.city", "locations.address.products"]),
            &[],
        );
        assert_eq!(
            Value::Object(doc),
            json!({"locations":[
                {"address":{"city":"Beaverton","products":["shoes","tshirts"]}},
                {"address":{"city":"Thornhill","products":["sneakers","shoes"]}}
            ]})
        );
    }

    #[test]
    fn test_exclusion_wins_over_inclusion() {
        let mut doc = nike_doc();
        prune(
            &mut doc,
            &s(&["locations.address.city"]),
            &s(&["locations.address.city"]),
        );
        assert_eq!(Value::Object(doc), json!({}));
    }

    #[test]
    fn test_include_then_exclude_subfield() {
        let mut doc = nike_doc();
        prune(
            &mut doc,
            &s(&["locations.address.city", "locations.address.products"]),
            &s(&["locations.address.city"]),
        );
        assert_eq!(
            Value::Object(doc),
            json!({"locations":[
                {"address":{"products":["shoes","tshirts"]}},
                {"address":{"products":["sneakers","shoes"]}}
            ]})
        );
    }

    #[test]
    fn test_projection_composes() {
        let include = s(&["locations.address.city", "locations.address.products"]);
        let exclude = s(&["locations.address.products"]);

        let mut once = nike_doc();
        prune(&mut once, &include, &exclude);

        let mut staged = nike_doc();
        prune(&mut staged, &include, &[]);
        prune(&mut staged, &[], &exclude);

        assert_eq!(Value::Object(once), Value::Object(staged));
    }

    #[test]
    fn test_flat_manifest_never_survives() {
        let mut doc = nike_doc();
        doc.insert("company.name".to_string(), json!("Nike Inc."));
        doc.insert(
            crate::document::FLAT_FIELD.to_string(),
            json!(["company.name"]),
        );
        prune(&mut doc, &[], &[]);
        assert!(!doc.contains_key(crate::document::FLAT_FIELD));
        assert!(!doc.contains_key("company.name"));
        assert!(doc.contains_key("company"));
    }

    #[test]
    fn test_empty_arrays_are_retained() {
        let mut doc = match json!({"tags": [], "company": {"name": "nike"}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        prune(&mut doc, &[], &s(&["company.name"]));
        assert_eq!(Value::Object(doc), json!({"tags": []}));
    }
}
