//! Rewrites deprecated settings keys to their current names.

use {
    plinth_common::key_path,
    serde_json::{Map, Value},
    tracing::warn,
};

use crate::{
    defaults::{PKG_VERSION_KEY, PLUGIN_DIRECTORIES_KEY, PLUGIN_PATHS_KEY},
    error::Result,
};

/// Deprecated key → current key.
pub const DEPRECATED_KEYS: &[(&str, &str)] = &[
    ("pluginSearchDirs", PLUGIN_DIRECTORIES_KEY),
    ("pluginPaths", PLUGIN_PATHS_KEY),
    ("hostVersion", PKG_VERSION_KEY),
];

/// One deprecated key found in the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRename {
    pub from: &'static str,
    pub to: &'static str,
    /// False when the current key was already set and the old value was dropped.
    pub applied: bool,
}

/// Move every deprecated key to its current name.
///
/// When both names are present the current key wins and the deprecated value
/// is discarded.
pub fn normalize_deprecated(values: &mut Map<String, Value>) -> Result<Vec<KeyRename>> {
    let mut renames = Vec::new();
    for &(from, to) in DEPRECATED_KEYS {
        let Some(value) = key_path::remove(values, from) else {
            continue;
        };
        let applied = key_path::lookup(values, to).is_none();
        if applied {
            warn!(from, to, "deprecated settings key renamed");
            key_path::insert(values, to, value)?;
        } else {
            warn!(from, to, "deprecated settings key ignored, current key already set");
        }
        renames.push(KeyRename { from, to, applied });
    }
    Ok(renames)
}
