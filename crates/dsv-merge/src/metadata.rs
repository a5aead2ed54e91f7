//! Canonical metadata mapping and the conversions into it.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{MergeError, MergeResult};

/// Canonical metadata: a string-keyed JSON object.
pub type Metadata = Map<String, Value>;

/// Conversion of caller input into canonical [`Metadata`].
///
/// Mapping-like values are copied as-is; structured records go through
/// [`Record`], which flattens their serialized fields into a mapping. Any
/// input whose JSON shape is not an object fails with
/// [`MergeError::InvalidShape`].
pub trait IntoMetadata {
    fn into_metadata(self) -> MergeResult<Metadata>;
}

/// Adapter for structured records: any `Serialize` type whose serialized form
/// is a JSON object.
///
/// ```
/// use dsv_merge::{normalize, Record};
///
/// #[derive(serde::Serialize)]
/// struct Sample { name: &'static str, version: u32 }
///
/// let meta = normalize(Record(Sample { name: "demo", version: 2 })).unwrap();
/// assert_eq!(meta["name"], "demo");
/// assert_eq!(meta["version"], 2);
/// ```
#[derive(Clone, Debug)]
pub struct Record<T>(pub T);

/// Normalize any supported input into canonical [`Metadata`].
pub fn normalize(input: impl IntoMetadata) -> MergeResult<Metadata> {
    input.into_metadata()
}

impl IntoMetadata for Metadata {
    fn into_metadata(self) -> MergeResult<Metadata> {
        Ok(self)
    }
}

impl IntoMetadata for &Metadata {
    fn into_metadata(self) -> MergeResult<Metadata> {
        Ok(self.clone())
    }
}

impl IntoMetadata for Value {
    fn into_metadata(self) -> MergeResult<Metadata> {
        match self {
            Value::Object(map) => Ok(map),
            other => Err(MergeError::InvalidShape {
                found: shape_name(&other).to_string(),
            }),
        }
    }
}

impl<V: Serialize> IntoMetadata for BTreeMap<String, V> {
    fn into_metadata(self) -> MergeResult<Metadata> {
        self.into_iter()
            .map(|(k, v)| Ok((k, to_value(&v)?)))
            .collect()
    }
}

impl<V: Serialize, S: BuildHasher> IntoMetadata for HashMap<String, V, S> {
    fn into_metadata(self) -> MergeResult<Metadata> {
        self.into_iter()
            .map(|(k, v)| Ok((k, to_value(&v)?)))
            .collect()
    }
}

impl<T: Serialize> IntoMetadata for Record<T> {
    fn into_metadata(self) -> MergeResult<Metadata> {
        to_value(&self.0)?.into_metadata()
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> MergeResult<Value> {
    serde_json::to_value(value).map_err(|e| MergeError::Serialization(e.to_string()))
}

/// JSON type name used in shape errors.
pub(crate) fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct SampleMetadata {
        name: String,
        version: u32,
    }

    #[derive(Serialize)]
    struct Unit;

    #[test]
    fn json_object_copied_as_is() {
        let meta = normalize(json!({"name": "demo", "tags": ["a", "b"]})).unwrap();
        assert_eq!(Value::Object(meta), json!({"name": "demo", "tags": ["a", "b"]}));
    }

    #[test]
    fn record_is_flattened() {
        let meta = normalize(Record(SampleMetadata {
            name: "demo".into(),
            version: 2,
        }))
        .unwrap();
        assert_eq!(Value::Object(meta), json!({"name": "demo", "version": 2}));
    }

    #[test]
    fn string_keyed_maps() {
        let mut btree = BTreeMap::new();
        btree.insert("a".to_string(), 1);
        assert_eq!(Value::Object(normalize(btree).unwrap()), json!({"a": 1}));

        let mut hash = HashMap::new();
        hash.insert("b".to_string(), vec!["x"]);
        assert_eq!(Value::Object(normalize(hash).unwrap()), json!({"b": ["x"]}));
    }

    #[test]
    fn non_mapping_values_rejected() {
        for (input, found) in [
            (json!(null), "null"),
            (json!(3), "number"),
            (json!("text"), "string"),
            (json!([1, 2]), "array"),
        ] {
            let err = normalize(input).unwrap_err();
            assert_eq!(err, MergeError::InvalidShape { found: found.into() });
        }
    }

    #[test]
    fn record_with_non_object_shape_rejected() {
        let err = normalize(Record(Unit)).unwrap_err();
        assert!(matches!(err, MergeError::InvalidShape { .. }));
        let err = normalize(Record((1, 2))).unwrap_err();
        assert!(matches!(err, MergeError::InvalidShape { .. }));
    }
}
