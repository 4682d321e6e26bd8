//! Enum-keyed mappings flattened to string-keyed JSON objects.
//!
//! Request builders usually name their fields with a fieldless enum rather
//! than string literals. `ParamKey` gives such an enum its wire name, and
//! `normalize` rewrites a (possibly nested) enum-keyed mapping into a
//! `serde_json::Map` ready for encoding.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// A key with a string representation on the wire.
pub trait ParamKey {
    fn as_key(&self) -> &str;
}

impl ParamKey for str {
    fn as_key(&self) -> &str {
        self
    }
}

impl ParamKey for String {
    fn as_key(&self) -> &str {
        self
    }
}

impl<K: ParamKey + ?Sized> ParamKey for &K {
    fn as_key(&self) -> &str {
        (**self).as_key()
    }
}

/// A value in an enum-keyed mapping: either a JSON leaf or another mapping
/// keyed by the same type.
#[derive(Debug, Clone)]
pub enum Keyed<K> {
    Leaf(Value),
    Nested(HashMap<K, Keyed<K>>),
}

impl<K> Keyed<K> {
    pub fn leaf(value: impl Into<Value>) -> Self {
        Keyed::Leaf(value.into())
    }
}

impl<K> From<HashMap<K, Keyed<K>>> for Keyed<K> {
    fn from(map: HashMap<K, Keyed<K>>) -> Self {
        Keyed::Nested(map)
    }
}

/// Convert an enum-keyed mapping into a string-keyed JSON object, recursing
/// into nested mappings. Leaves are copied unchanged.
pub fn normalize<K: ParamKey>(map: &HashMap<K, Keyed<K>>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| {
            let value = match value {
                Keyed::Leaf(leaf) => leaf.clone(),
                Keyed::Nested(inner) => Value::Object(normalize(inner)),
            };
            (key.as_key().to_string(), value)
        })
        .collect()
}
