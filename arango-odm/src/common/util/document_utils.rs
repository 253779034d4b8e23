use serde_json::{Map, Value};

use crate::common::DOC_KEY;

/// A stored record: a JSON object keyed by attribute name.
pub type Document = Map<String, Value>;

/// Returns the `_key` of a document if it carries a string key.
pub fn document_key(document: &Document) -> Option<&str> {
    document.get(DOC_KEY).and_then(|value| value.as_str())
}

/// Resolves a dot separated attribute path inside a document.
pub fn field_value<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = document.get(first)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Returns the values a document holds for the given index fields.
///
/// Missing attributes yield `Value::Null` so sparse handling can be decided
/// by the caller.
pub fn field_values(document: &Document, fields: &[String]) -> Vec<Value> {
    fields
        .iter()
        .map(|field| field_value(document, field).cloned().unwrap_or(Value::Null))
        .collect()
}
