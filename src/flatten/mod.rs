//! Document flattening: nested trees to dotted-path leaves.
//!
//! The flattener walks a document along each requested field, emits one
//! [`FlattenedLeaf`] per produced dotted path, and augments the document
//! with the generated keys plus the `.flat` manifest listing them. Values
//! reached through array-of-object ancestors are appended in document order
//! and the leaf type is promoted to its array variant.
//!
//! A literal top-level dotted key (e.g. `"company.num_employees": 2000`
//! next to `"company": {"num_employees": 1000}`) shadows the nested walk
//! for that exact path, both here and downstream in filtering.

use ahash::AHashMap;
use serde_json::{Map, Value};

use crate::document::{FLAT_FIELD, ID_FIELD};
use crate::error::{KasaneError, Result};
use crate::path::{self, Segment};
use crate::schema::{json_type_name, Field, FieldType, SchemaRegistry};

/// A single flattened leaf: a dotted path, its (possibly array-promoted)
/// field descriptor, and the value to index.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedLeaf {
    /// Descriptor carrying the dotted path, leaf type and nested flags.
    pub field: Field,
    /// Scalar or array of scalars, in document order.
    pub value: Value,
}

/// Flatten a document against the requested fields.
///
/// On success the document has been augmented in place: every generated
/// leaf is inserted as a literal top-level dotted key and `.flat` lists the
/// inserted paths (sorted). Leaves whose path already exists as a literal
/// key are indexed but not re-inserted, so stripping `.flat` and the keys
/// it lists always restores the original tree.
pub fn flatten_document(
    doc: &mut Map<String, Value>,
    fields: &[Field],
) -> Result<Vec<FlattenedLeaf>> {
    let mut leaves: Vec<FlattenedLeaf> = Vec::new();
    let mut by_path: AHashMap<String, usize> = AHashMap::new();

    for field in fields {
        if field.is_wildcard() || field.name == ID_FIELD || !field.index {
            continue;
        }
        for (leaf, from_exact) in flatten_field(doc, field)? {
            match by_path.get(&leaf.field.name) {
                Some(&i) => {
                    // an exact declaration wins over a subtree-derived leaf
                    if from_exact {
                        leaves[i] = leaf;
                    }
                }
                None => {
                    by_path.insert(leaf.field.name.clone(), leaves.len());
                    leaves.push(leaf);
                }
            }
        }
    }

    let mut generated: Vec<String> = Vec::new();
    for leaf in &leaves {
        if !doc.contains_key(&leaf.field.name) {
            doc.insert(leaf.field.name.clone(), leaf.value.clone());
            generated.push(leaf.field.name.clone());
        }
    }
    if !generated.is_empty() {
        generated.sort();
        doc.insert(
            FLAT_FIELD.to_string(),
            Value::Array(generated.into_iter().map(Value::String).collect()),
        );
    }

    Ok(leaves)
}

/// Wildcard pre-pass: infer a field for every top-level key the explicit
/// declarations do not cover.
///
/// With nested fields disabled, object-shaped values are skipped; plain
/// scalar keys (dotted or not) are still inferred.
pub fn discover_fields(doc: &Map<String, Value>, registry: &SchemaRegistry) -> Vec<Field> {
    let mut discovered = Vec::new();
    for (key, value) in doc {
        if key == ID_FIELD || key == FLAT_FIELD || registry.is_explicit(key) {
            continue;
        }
        let Some(inferred) = FieldType::infer(value) else {
            log::debug!("skipping key `{key}`: no type can be inferred yet");
            continue;
        };
        if inferred.is_object_kind() && !registry.nested_enabled() {
            log::debug!("skipping object key `{key}`: nested fields are disabled");
            continue;
        }
        discovered.push(Field::new(key.clone(), inferred).optional(true));
    }
    discovered
}

/// Flatten one requested field. Returns produced leaves paired with
/// whether each comes from the field's exact declared path.
fn flatten_field(
    doc: &Map<String, Value>,
    field: &Field,
) -> Result<Vec<(FlattenedLeaf, bool)>> {
    // literal top-level key shadows the nested walk for this path
    let matches: Vec<(&Value, usize)> = if let Some(value) = doc.get(&field.name) {
        vec![(value, 0)]
    } else {
        let segments = path::split(&field.name);
        let mut collected = Vec::new();
        if let Some(child) = doc.get(segments[0]) {
            collect_matches(child, &segments[1..], 0, &mut collected);
        }
        collected
    };

    let matches: Vec<(&Value, usize)> =
        matches.into_iter().filter(|(v, _)| !v.is_null()).collect();

    if matches.is_empty() {
        if field.optional {
            log::debug!("optional field `{}` absent", field.name);
            return Ok(Vec::new());
        }
        return Err(KasaneError::missing_required(&field.name));
    }

    flatten_matches(doc, field, field.field_type, &matches)
}

fn flatten_matches(
    doc: &Map<String, Value>,
    field: &Field,
    field_type: FieldType,
    matches: &[(&Value, usize)],
) -> Result<Vec<(FlattenedLeaf, bool)>> {
    match field_type {
        FieldType::Object => {
            if matches.len() != 1 || matches[0].1 != 0 || !matches[0].0.is_object() {
                return Err(KasaneError::type_mismatch(
                    &field.name,
                    "object",
                    json_type_name(matches[0].0),
                ));
            }
            let mut acc = SubtreeAcc::default();
            flatten_subtree(doc, field, matches[0].0, 0, &mut acc)?;
            Ok(acc.emit(field))
        }
        FieldType::ObjectArray => {
            let mut elements: Vec<&Value> = Vec::new();
            for (value, depth) in matches {
                match value {
                    Value::Object(_) if *depth > 0 => elements.push(*value),
                    Value::Array(els) if path::is_object_array(els) => {
                        elements.extend(els.iter().filter(|e| e.is_object()));
                    }
                    other => {
                        return Err(KasaneError::type_mismatch(
                            &field.name,
                            "object[]",
                            json_type_name(other),
                        ));
                    }
                }
            }
            let mut acc = SubtreeAcc::default();
            for element in elements {
                flatten_subtree(doc, field, element, 1, &mut acc)?;
            }
            Ok(acc.emit(field))
        }
        FieldType::Auto => {
            let inferred = FieldType::infer(matches[0].0).ok_or_else(|| {
                KasaneError::type_mismatch(&field.name, "auto", json_type_name(matches[0].0))
            })?;
            flatten_matches(doc, field, inferred, matches)
        }
        declared => flatten_primitive(field, declared, matches),
    }
}

/// Navigate the remaining path segments, fanning out across arrays of
/// objects without consuming a segment.
fn collect_matches<'a>(
    value: &'a Value,
    segments: &[&str],
    depth: usize,
    matches: &mut Vec<(&'a Value, usize)>,
) {
    if depth >= path::MAX_DEPTH {
        return;
    }
    if segments.is_empty() {
        matches.push((value, depth));
        return;
    }
    match value {
        Value::Object(map) => {
            if let Some(child) = map.get(segments[0]) {
                collect_matches(child, &segments[1..], depth, matches);
            }
        }
        Value::Array(elements) => {
            for element in elements {
                if element.is_object() {
                    collect_matches(element, segments, depth + 1, matches);
                }
            }
        }
        _ => {}
    }
}

/// Per-path accumulation while descending an object/object[] subtree.
#[derive(Default)]
struct SubtreeAcc {
    order: Vec<String>,
    entries: AHashMap<String, Entry>,
}

#[derive(Default)]
struct Entry {
    /// Depth-0 value kept in its original shape (plain `object` walks).
    direct: Option<Value>,
    /// Appended values for array-sourced leaves, in document order.
    values: Vec<Value>,
    element_type: Option<FieldType>,
}

impl SubtreeAcc {
    fn entry(&mut self, full_path: &str) -> &mut Entry {
        if !self.entries.contains_key(full_path) {
            self.order.push(full_path.to_string());
            self.entries.insert(full_path.to_string(), Entry::default());
        }
        self.entries.get_mut(full_path).unwrap()
    }

    fn emit(self, parent: &Field) -> Vec<(FlattenedLeaf, bool)> {
        let mut out = Vec::new();
        for name in self.order {
            let entry = &self.entries[&name];
            let (value, leaf_type, nested_array) = if let Some(direct) = &entry.direct {
                match FieldType::infer(direct) {
                    Some(t) => (direct.clone(), t, false),
                    None => continue,
                }
            } else {
                let Some(element_type) = entry.element_type else {
                    continue;
                };
                (
                    Value::Array(entry.values.clone()),
                    element_type.to_array(),
                    true,
                )
            };
            let field = Field::new(name, leaf_type)
                .optional(true)
                .facet(parent.facet)
                .index(parent.index)
                .sort(parent.sort)
                .nested_array(nested_array);
            out.push((FlattenedLeaf { field, value }, false));
        }
        out
    }
}

/// Collect every leaf under a field root into the accumulator, letting the
/// path walker supply index-erased paths and array depths.
///
/// `base_depth` is 1 when the root itself is an element of an object
/// array; any positive total depth forces array accumulation for a leaf.
fn flatten_subtree(
    doc: &Map<String, Value>,
    field: &Field,
    root: &Value,
    base_depth: usize,
    acc: &mut SubtreeAcc,
) -> Result<()> {
    let mut collected: Vec<(String, usize, Value)> = Vec::new();
    path::for_each_leaf(root, &mut |segments, leaf| {
        collected.push((
            Segment::erase(segments),
            Segment::array_depth(segments),
            leaf.clone(),
        ));
    });

    for (suffix, depth, leaf) in collected {
        if leaf.is_null() {
            continue;
        }
        let full_path = if suffix.is_empty() {
            field.name.clone()
        } else {
            format!("{}.{suffix}", field.name)
        };
        // a literal top-level dotted key suppresses the generated leaf
        if doc.contains_key(&full_path) {
            continue;
        }

        let depth = base_depth + depth;
        if depth == 0 {
            acc.entry(&full_path).direct = Some(leaf);
            continue;
        }

        let scalars: Vec<Value> = match leaf {
            Value::Array(items) => items.into_iter().filter(|v| !v.is_null()).collect(),
            scalar => vec![scalar],
        };
        let entry = acc.entry(&full_path);
        for scalar in scalars {
            let inferred = FieldType::infer(&scalar).ok_or_else(|| {
                KasaneError::type_mismatch(full_path.clone(), "auto", json_type_name(&scalar))
            })?;
            entry.element_type = Some(match entry.element_type {
                Some(existing) => reconcile(&full_path, existing, inferred)?,
                None => inferred,
            });
            entry.values.push(scalar);
        }
    }
    Ok(())
}

/// Flatten a field declared with a primitive (or primitive-array) type.
fn flatten_primitive(
    field: &Field,
    declared: FieldType,
    matches: &[(&Value, usize)],
) -> Result<Vec<(FlattenedLeaf, bool)>> {
    let element = declared.element();

    if matches.len() == 1 && matches[0].1 == 0 {
        let value = matches[0].0;
        let leaf_value = if declared.is_array() {
            let Value::Array(items) = value else {
                return Err(KasaneError::type_mismatch(
                    &field.name,
                    declared.name(),
                    json_type_name(value),
                ));
            };
            for item in items.iter().filter(|v| !v.is_null()) {
                check_scalar(&field.name, element, item)?;
            }
            value.clone()
        } else {
            // a sole scalar inside a one-element array is coerced to its
            // scalar form when no array ancestors exist
            let scalar = match value {
                Value::Array(items) if items.len() == 1 => &items[0],
                other => other,
            };
            check_scalar(&field.name, element, scalar)?;
            scalar.clone()
        };
        let leaf = Field::new(&field.name, declared)
            .optional(field.optional)
            .facet(field.facet)
            .index(field.index)
            .sort(field.sort);
        return Ok(vec![(FlattenedLeaf { field: leaf, value: leaf_value }, true)]);
    }

    // reached through array ancestors: append values in document order and
    // promote the declared type to its array variant
    let mut values = Vec::new();
    for (value, _) in matches {
        match value {
            Value::Array(items) => {
                for item in items.iter().filter(|v| !v.is_null()) {
                    check_scalar(&field.name, element, item)?;
                    values.push((*item).clone());
                }
            }
            scalar => {
                check_scalar(&field.name, element, scalar)?;
                values.push((*scalar).clone());
            }
        }
    }
    let leaf = Field::new(&field.name, declared.to_array())
        .optional(field.optional)
        .facet(field.facet)
        .index(field.index)
        .sort(field.sort)
        .nested_array(true);
    Ok(vec![(
        FlattenedLeaf {
            field: leaf,
            value: Value::Array(values),
        },
        true,
    )])
}

fn check_scalar(path: &str, element: FieldType, value: &Value) -> Result<()> {
    if element.matches_scalar(value) {
        Ok(())
    } else {
        Err(KasaneError::type_mismatch(
            path.to_string(),
            element.name(),
            json_type_name(value),
        ))
    }
}

fn reconcile(path: &str, a: FieldType, b: FieldType) -> Result<FieldType> {
    use FieldType::{Float, Int32, Int64};
    if a == b {
        return Ok(a);
    }
    match (a, b) {
        (Int32, Int64) | (Int64, Int32) => Ok(Int64),
        (Int32 | Int64, Float) | (Float, Int32 | Int64) => Ok(Float),
        _ => Err(KasaneError::type_mismatch(path.to_string(), a.name(), b.name())),
    }
}

/// All values at a dotted path, a literal top-level key shadowing the
/// nested walk. Values reached through array-of-object ancestors are
/// returned one per element, in document order.
pub fn leaf_values<'a>(doc: &'a Map<String, Value>, path: &str) -> Vec<&'a Value> {
    if let Some(value) = doc.get(path) {
        return vec![value];
    }
    let segments = path::split(path);
    let mut matches = Vec::new();
    if let Some(child) = doc.get(segments[0]) {
        collect_matches(child, &segments[1..], 0, &mut matches);
    }
    matches.into_iter().map(|(value, _)| value).collect()
}
