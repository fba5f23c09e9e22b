//! Dotted key paths over nested JSON tables.
//!
//! Settings and the configuration service both store nested objects and
//! address them with keys like `plugins.directories`. These helpers keep the
//! addressing rules in one place.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Split a dotted key into its segments, rejecting empty segments.
pub fn split(key: &str) -> Result<Vec<&str>> {
    if key.is_empty() {
        return Err(Error::invalid_key_path(key, "key is empty"));
    }
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(Error::invalid_key_path(key, "key contains an empty segment"));
    }
    Ok(segments)
}

/// Look up the value stored at `key`.
pub fn lookup<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let first = segments.next()?;
    segments.try_fold(root.get(first)?, |value, segment| {
        value.as_object()?.get(segment)
    })
}

/// Store `value` at `key`, creating intermediate tables as needed.
///
/// Returns the previous value. Fails when an intermediate segment already
/// holds a non-table value.
pub fn insert(root: &mut Map<String, Value>, key: &str, value: Value) -> Result<Option<Value>> {
    let segments = split(key)?;
    let Some((last, parents)) = segments.split_last() else {
        return Err(Error::invalid_key_path(key, "key is empty"));
    };

    let mut table = root;
    for segment in parents {
        let entry = table
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        table = entry.as_object_mut().ok_or_else(|| {
            Error::invalid_key_path(key, "an intermediate segment is not a table")
        })?;
    }
    Ok(table.insert((*last).to_string(), value))
}

/// Remove the value stored at `key`.
///
/// Parent tables left empty by the removal are removed as well, so a key
/// namespace disappears once its last entry is gone.
pub fn remove(root: &mut Map<String, Value>, key: &str) -> Option<Value> {
    let segments = split(key).ok()?;
    remove_segments(root, &segments)
}

fn remove_segments(table: &mut Map<String, Value>, segments: &[&str]) -> Option<Value> {
    let (first, rest) = segments.split_first()?;
    if rest.is_empty() {
        return table.remove(*first);
    }
    let child = table.get_mut(*first)?.as_object_mut()?;
    let removed = remove_segments(child, rest);
    if removed.is_some() && child.is_empty() {
        table.remove(*first);
    }
    removed
}

/// Deep-merge `defaults` into `target` without overwriting existing values.
pub fn merge_defaults(target: &mut Map<String, Value>, defaults: &Map<String, Value>) {
    for (key, default) in defaults {
        match (target.get_mut(key), default) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_defaults(existing, nested);
            },
            (Some(_), _) => {},
            (None, _) => {
                target.insert(key.clone(), default.clone());
            },
        }
    }
}
