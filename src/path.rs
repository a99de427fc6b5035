//! Dotted-path model for addressing leaves inside nested documents.
//!
//! A path like `locations.address.street` is a sequence of [`Segment`]s.
//! Key segments name object members; index segments record positions inside
//! arrays of objects. Array indices are erased for schema lookups
//! ([`Segment::erase`]) but preserved while walking so that projection and
//! highlighting can keep array elements aligned with the source document.

use serde_json::Value;
use std::fmt;

/// Maximum tree depth the leaf walker descends before treating a value as a
/// leaf. Guards against adversarial deeply-nested inputs.
pub const MAX_DEPTH: usize = 32;

/// One step of a path through a document tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// An object member name.
    Key(String),
    /// A position inside an array of objects.
    Index(usize),
}

impl Segment {
    /// Render a segment list as a dotted path with array indices erased.
    ///
    /// `[Key("locations"), Index(1), Key("country")]` becomes
    /// `"locations.country"`, the form used for schema lookups.
    pub fn erase(segments: &[Segment]) -> String {
        let keys: Vec<&str> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Key(k) => Some(k.as_str()),
                Segment::Index(_) => None,
            })
            .collect();
        keys.join(".")
    }

    /// Number of array-of-object ancestors recorded in a segment list.
    pub fn array_depth(segments: &[Segment]) -> usize {
        segments
            .iter()
            .filter(|s| matches!(s, Segment::Index(_)))
            .count()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => write!(f, "{k}"),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Split a dotted path into its key segments.
pub fn split(dotted: &str) -> Vec<&str> {
    dotted.split('.').collect()
}

/// Join key segments back into a dotted path.
pub fn join(parts: &[&str]) -> String {
    parts.join(".")
}

/// Segment-wise prefix test.
///
/// `locations.address` is a prefix of `locations.address.city` but not of
/// `locations.address_old`, which a plain string prefix test would accept.
pub fn starts_with_path(path: &str, prefix: &str) -> bool {
    if path == prefix {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.starts_with('.'),
        None => false,
    }
}

/// True when every non-null element of the array is an object.
///
/// Such arrays are descended element by element; anything else (including an
/// empty array) is treated as a scalar-array leaf.
pub fn is_object_array(elements: &[Value]) -> bool {
    !elements.is_empty()
        && elements
            .iter()
            .filter(|v| !v.is_null())
            .all(|v| v.is_object())
}

/// Walk a document tree in document order, invoking `cb` for every leaf.
///
/// Leaves are scalars and scalar arrays; arrays of objects are descended one
/// element at a time, pushing an index segment so callers can tell how many
/// array ancestors a leaf has. Object keys are visited in insertion order.
pub fn for_each_leaf<F>(root: &Value, cb: &mut F)
where
    F: FnMut(&[Segment], &Value),
{
    let mut segments = Vec::new();
    walk(root, &mut segments, cb);
}

fn walk<F>(value: &Value, segments: &mut Vec<Segment>, cb: &mut F)
where
    F: FnMut(&[Segment], &Value),
{
    if segments.len() >= MAX_DEPTH {
        cb(segments, value);
        return;
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                segments.push(Segment::Key(key.clone()));
                walk(child, segments, cb);
                segments.pop();
            }
        }
        Value::Array(elements) if is_object_array(elements) => {
            for (i, element) in elements.iter().enumerate() {
                segments.push(Segment::Index(i));
                walk(element, segments, cb);
                segments.pop();
            }
        }
        _ => cb(segments, value),
    }
}
