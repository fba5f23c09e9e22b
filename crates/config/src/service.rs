//! The merged, mutable configuration shared by a discovery run.

use std::sync::Arc;

use {
    plinth_common::key_path,
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    serde_json::{Map, Value},
    tokio::sync::RwLock,
    tracing::debug,
};

use crate::{defaults, error::Result, normalize, settings::Settings};

/// Configuration shared by reference between the caller and a discovery run.
pub type SharedConfig = Arc<RwLock<ConfigService>>;

/// Merged settings that module specs contribute to and are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigService {
    values: Map<String, Value>,
}

impl ConfigService {
    /// An empty configuration with no defaults applied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from raw settings: deprecated keys are renamed,
    /// then the default schema fills whatever the settings leave out.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut values = settings.as_map().clone();
        let renames = normalize::normalize_deprecated(&mut values)?;
        defaults::apply_defaults(&mut values);
        debug!(
            keys = values.len(),
            renamed = renames.len(),
            "built configuration from settings"
        );
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        key_path::lookup(&self.values, key)
    }

    /// Deserialize the value at `key`, or `None` when absent or mistyped.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `key`, returning the previous value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<Option<Value>> {
        Ok(key_path::insert(&mut self.values, key, value.into())?)
    }

    /// Set `key` only when it has no value yet. Returns whether it was set.
    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) -> Result<bool> {
        if self.contains(key) {
            return Ok(false);
        }
        key_path::insert(&mut self.values, key, value.into())?;
        Ok(true)
    }

    /// Append `value` to the array at `key`. A missing key starts a new array;
    /// a scalar becomes the first element.
    pub fn push(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let mut items = match key_path::remove(&mut self.values, key) {
            None => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
        };
        items.push(value.into());
        key_path::insert(&mut self.values, key, Value::Array(items))?;
        Ok(())
    }

    /// Remove `key`, pruning parent tables it leaves empty.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        key_path::remove(&mut self.values, key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    pub fn into_shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }
}
