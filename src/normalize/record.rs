//! Flat, lower-cased key/value view over a JSON object.

use serde_json::{Map, Value};

/// Reads a boolean, accepting `true`/`false`, `"true"`/`"false"`, `"1"`/`"0"`
/// and the numbers `1`/`0`.
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(true),
            Some(f) if f == 0.0 => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Reads a number, parsing numeric strings.
pub fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse().ok()
            }
        }
        _ => None,
    }
}

/// Reads a string. Other scalars are not stringified.
pub fn as_str(value: &Value) -> Option<&str> {
    value.as_str()
}

/// Flat mapping of lower-cased field name to value.
///
/// Lookups are case-insensitive. A missing key or a value of the wrong type
/// yields `None`; neither is an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecord {
    fields: Map<String, Value>,
}

impl NormalizedRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from one JSON object.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let mut record = Self::new();
        record.merge(object);
        record
    }

    /// Copies every member of `object` into the record, overriding existing keys.
    pub fn merge(&mut self, object: &Map<String, Value>) {
        for (key, value) in object {
            self.fields.insert(key.to_lowercase(), value.clone());
        }
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(&key.to_lowercase())
    }

    /// Boolean value for `key`, see [`as_bool`].
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(as_bool)
    }

    /// Numeric value for `key`, see [`as_float`].
    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(as_float)
    }

    /// String value for `key`.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(as_str)
    }

    /// First key in `keys` that holds a number.
    pub fn first_float(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| self.get_float(k))
    }

    /// First key in `keys` that holds a string.
    pub fn first_string(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get_string(k))
    }

    /// Returns true if `key` is present, whatever its type.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(lower-cased key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
