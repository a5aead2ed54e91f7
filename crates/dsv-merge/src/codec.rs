//! Canonical JSON encoding of metadata documents.
//!
//! Encoded documents have keys sorted at every depth, 2-space indentation,
//! and are UTF-8. Two equal documents always encode to identical bytes.

use serde_json::{Map, Value};

use crate::error::{MergeError, MergeResult};
use crate::metadata::{shape_name, Metadata};

/// Encode metadata as canonical JSON bytes.
pub fn encode(metadata: &Metadata) -> MergeResult<Vec<u8>> {
    let canonical = Value::Object(sort_keys(metadata));
    serde_json::to_vec_pretty(&canonical).map_err(|e| MergeError::Serialization(e.to_string()))
}

/// Decode a stored metadata document. The top level must be a JSON object.
pub fn decode(bytes: &[u8]) -> MergeResult<Metadata> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| MergeError::Serialization(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(MergeError::InvalidShape {
            found: shape_name(&other).to_string(),
        }),
    }
}

// Sorted explicitly: with serde_json's `preserve_order`, `Map` keeps insertion order.
fn sort_keys(map: &Map<String, Value>) -> Map<String, Value> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys.into_iter()
        .map(|k| (k.clone(), sort_value(&map[k])))
        .collect()
}

fn sort_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(sort_keys(map)),
        Value::Array(items) => Value::Array(items.iter().map(sort_value).collect()),
        other => other.clone(),
    }
}
