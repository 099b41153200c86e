//! Dotted field paths for document updates
//!
//! Merge keys may address nested fields with dots (`rr_indexes.sub_preventive`),
//! matching the update surface the desk expects from its document store.

use serde_json::{Map, Value};

/// Read the value at a dotted path, if present.
pub fn get_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write `value` at a dotted path, creating intermediate objects as needed.
///
/// A non-object encountered along the way is replaced by an object; the last
/// writer wins, which is the merge semantics callers rely on.
pub fn set_path(doc: &mut Value, path: &str, value: Value) {
    if !doc.is_object() {
        *doc = Value::Object(Map::new());
    }
    let mut current = doc;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let map = current.as_object_mut().expect("object ensured above");
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        let entry = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = entry;
    }
}

/// Merge a field map into a document. Keys may be dotted paths.
pub fn merge_fields(doc: &mut Value, fields: &Map<String, Value>) {
    for (key, value) in fields {
        set_path(doc, key, value.clone());
    }
}
