//! Dynamic JSON value with total accessors.
//!
//! # Design
//! `JsonValue` classifies decoded JSON into five shapes. Containers keep their
//! elements as untyped `serde_json::Value` and wrap them on access, so every
//! lookup returns an owned `JsonValue` and lookups chain freely:
//!
//! ```
//! use jsonres_core::{Decodable, JsonValue};
//!
//! let json = JsonValue::decode(br#"{"user":{"tags":["a","b"]}}"#).unwrap();
//! assert_eq!(json.get("user").get("tags").at(1).as_string(), "b");
//! assert!(json.get("missing").at(3).get("deeper").is_null());
//! ```
//!
//! No accessor fails. A shape mismatch, missing key, out-of-range index or
//! unparsable scalar resolves to `Null` or to the zero value of the requested
//! type. Scalars are kept opaque and converted through their textual form, so
//! `"42"` reads as `42` through `as_int` just like the number `42` does.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::decode::Decodable;
use crate::keys::{normalize, Keyed, ParamKey};

/// A decoded JSON document or fragment.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JsonValue {
    /// Ordered sequence of untyped elements.
    Array(Vec<Value>),
    /// String-keyed mapping of untyped values.
    Object(Map<String, Value>),
    /// A `JsonValue` embedded as a payload of its own.
    Wrapped(Box<JsonValue>),
    /// A string, number or boolean leaf.
    Scalar(Value),
    /// Absence of a value.
    #[default]
    Null,
}

impl JsonValue {
    pub fn wrapped(inner: JsonValue) -> Self {
        JsonValue::Wrapped(Box::new(inner))
    }

    /// Build an object from an enum-keyed mapping.
    pub fn from_keyed<K: ParamKey>(map: &HashMap<K, Keyed<K>>) -> Self {
        JsonValue::Object(normalize(map))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }

    /// Member lookup. `Null` unless `self` is an object containing `key`.
    pub fn get<K: ParamKey + ?Sized>(&self, key: &K) -> JsonValue {
        match self {
            JsonValue::Object(map) => JsonValue::from(map.get(key.as_key()).cloned()),
            _ => JsonValue::Null,
        }
    }

    /// Element lookup. `Null` unless `self` is an array and `index` is in
    /// bounds.
    pub fn at(&self, index: usize) -> JsonValue {
        match self {
            JsonValue::Array(items) => JsonValue::from(items.get(index).cloned()),
            _ => JsonValue::Null,
        }
    }

    /// Scalar text, or `""`.
    pub fn as_string(&self) -> String {
        self.scalar_text().unwrap_or_default()
    }

    /// Scalar parsed as an integer, or `0`. Numbers with an integral value
    /// convert even when written as `1.0` or `1e2`; fractional values such as
    /// `3.5` or `"3.5"` yield `0`.
    pub fn as_int(&self) -> i64 {
        match self {
            JsonValue::Scalar(Value::Number(number)) => number
                .as_i64()
                .or_else(|| number.as_f64().and_then(integral))
                .unwrap_or(0),
            _ => self
                .scalar_text()
                .and_then(|text| text.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Scalar parsed as a float, or `0.0`.
    pub fn as_double(&self) -> f64 {
        self.scalar_text()
            .and_then(|text| text.parse().ok())
            .unwrap_or(0.0)
    }

    /// Scalar parsed as an exact decimal, or zero. Accepts plain and
    /// scientific notation.
    pub fn as_decimal(&self) -> Decimal {
        self.scalar_text()
            .and_then(|text| {
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .ok()
            })
            .unwrap_or(Decimal::ZERO)
    }

    /// Boolean scalar, or `false`.
    pub fn as_bool(&self) -> bool {
        matches!(self, JsonValue::Scalar(Value::Bool(true)))
    }

    /// Array elements wrapped one by one; empty for any other shape.
    pub fn as_array(&self) -> Vec<JsonValue> {
        match self {
            JsonValue::Array(items) => items.iter().cloned().map(JsonValue::from).collect(),
            _ => Vec::new(),
        }
    }

    /// Best-effort pretty-printed form for diagnostics. Not guaranteed to
    /// parse back; empty when the `redact-describe` feature is enabled.
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Convert back into a `serde_json::Value` for re-encoding.
    pub fn to_value(&self) -> Value {
        match self {
            JsonValue::Array(items) => Value::Array(items.clone()),
            JsonValue::Object(map) => Value::Object(map.clone()),
            JsonValue::Wrapped(inner) => inner.to_value(),
            JsonValue::Scalar(value) => value.clone(),
            JsonValue::Null => Value::Null,
        }
    }

    fn scalar_text(&self) -> Option<String> {
        match self {
            JsonValue::Scalar(Value::String(text)) => Some(text.clone()),
            JsonValue::Scalar(Value::Number(number)) => Some(number.to_string()),
            JsonValue::Scalar(Value::Bool(flag)) => Some(flag.to_string()),
            _ => None,
        }
    }
}

/// `value` as an `i64` when it has no fractional part and is in range.
fn integral(value: f64) -> Option<i64> {
    // i64::MAX rounds up to 2^63 as f64, hence the exclusive upper bound.
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then_some(value as i64)
}

/// Only top-level objects and arrays keep their shape; any other valid JSON
/// document decodes to `Null`. Invalid JSON is `None`.
impl Decodable for JsonValue {
    fn decode(bytes: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(bytes).ok()?;
        Some(match value {
            Value::Object(map) => JsonValue::Object(map),
            Value::Array(items) => JsonValue::Array(items),
            _ => JsonValue::Null,
        })
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => JsonValue::Null,
            Value::Array(items) => JsonValue::Array(items),
            Value::Object(map) => JsonValue::Object(map),
            scalar => JsonValue::Scalar(scalar),
        }
    }
}

impl<T: Into<JsonValue>> From<Option<T>> for JsonValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(JsonValue::Null, Into::into)
    }
}

impl From<Vec<Value>> for JsonValue {
    fn from(items: Vec<Value>) -> Self {
        JsonValue::Array(items)
    }
}

impl From<Map<String, Value>> for JsonValue {
    fn from(map: Map<String, Value>) -> Self {
        JsonValue::Object(map)
    }
}

/// Raw bytes are parsed as a JSON document; anything that is not an object
/// or array becomes `Null`.
impl From<&[u8]> for JsonValue {
    fn from(bytes: &[u8]) -> Self {
        JsonValue::decode(bytes).unwrap_or_default()
    }
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if cfg!(feature = "redact-describe") {
            return Ok(());
        }
        match self {
            JsonValue::Array(items) => write_pretty(f, items),
            JsonValue::Object(map) => write_pretty(f, map),
            JsonValue::Wrapped(inner) => fmt::Display::fmt(inner, f),
            JsonValue::Scalar(_) => f.write_str(&self.as_string()),
            JsonValue::Null => f.write_str("null"),
        }
    }
}

fn write_pretty<S: Serialize>(f: &mut fmt::Formatter<'_>, value: &S) -> fmt::Result {
    match serde_json::to_string_pretty(value) {
        Ok(text) => f.write_str(&text),
        Err(_) => f.write_str("null"),
    }
}
