//! Raw, untyped settings supplied by the caller.

use {
    plinth_common::key_path,
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

use crate::error::{Error, Result};

/// Raw key/value settings for one discovery run.
///
/// Settings are a nested JSON table addressed with dotted keys. They are
/// assembled before a run and treated as read-only while it executes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(Map<String, Value>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(Error::NotATable {
                found: value_kind(&other),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        key_path::lookup(&self.0, key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `key`, returning the previous value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<Option<Value>> {
        Ok(key_path::insert(&mut self.0, key, value.into())?)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn from_value_requires_a_table() {
        assert!(Settings::from_value(json!({"a": 1})).is_ok());
        assert_eq!(Settings::from_value(Value::Null).unwrap(), Settings::new());
        let err = Settings::from_value(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }
}
