use crate::{Error, Result};
use serde_json::{Map, Value};

/// One physical item to render, as loaded from a release file.
///
/// Keys are stored lower-case at every nesting level so lookups are case-insensitive in
/// practice (`Catalog:` and `catalog:` resolve the same way).
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseRecord(Value);

impl Default for ReleaseRecord {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl ReleaseRecord {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps a JSON value. Non-object roots are rejected: a record is always a mapping.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(_) => Ok(Self(lowercase_keys(value))),
            // An empty YAML document deserializes to null; treat it as an empty record.
            Value::Null => Ok(Self::default()),
            other => Err(Error::InvalidRecord {
                message: format!("expected a mapping at the document root, found {}", kind(&other)),
            }),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| Error::InvalidRecordYaml {
                message: e.to_string(),
            })?;
        let value = serde_json::to_value(raw).map_err(|e| Error::InvalidRecordYaml {
            message: e.to_string(),
        })?;
        Self::from_value(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Top-level lookup. `key` is lower-cased before the lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.as_object()?.get(&key.to_ascii_lowercase())
    }

    /// Dotted-path lookup (`coords.lat`).
    pub fn get_path(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(&segment.to_ascii_lowercase())?;
        }
        Some(cur)
    }
}

fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.to_ascii_lowercase(), lowercase_keys(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Renders a scalar record value as display text.
///
/// Returns `None` for null and for containers; those never stand in for a scalar field.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Mirrors the loose truthiness used for nested sub-fields: null, `""`, `false`, `0` and empty
/// containers all count as "not provided".
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
