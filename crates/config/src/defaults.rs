//! Default configuration schema.

use serde_json::{Map, Value, json};

/// Host package name.
pub const PKG_NAME_KEY: &str = "pkg.name";
/// Host version that module specs declare compatibility against.
pub const PKG_VERSION_KEY: &str = "pkg.version";
/// Explicit package directories to load.
pub const PLUGIN_PATHS_KEY: &str = "plugins.paths";
/// Directories scanned for packages.
pub const PLUGIN_DIRECTORIES_KEY: &str = "plugins.directories";
/// How many descriptors are turned into packs at once.
pub const PLUGIN_CONCURRENCY_KEY: &str = "plugins.concurrency";

pub const DEFAULT_CONCURRENCY: usize = 8;

/// The defaults applied underneath caller settings.
pub fn default_schema() -> Map<String, Value> {
    let schema = json!({
        "pkg": {
            "name": "plinth",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "plugins": {
            "paths": [],
            "directories": [],
            "concurrency": DEFAULT_CONCURRENCY,
        },
    });
    match schema {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Fill in every default the caller did not provide.
pub fn apply_defaults(values: &mut Map<String, Value>) {
    plinth_common::key_path::merge_defaults(values, &default_schema());
}

#[cfg(test)]
mod tests {
    use {super::*, plinth_common::key_path::lookup};

    #[test]
    fn defaults_fill_gaps_only() {
        let mut values = Map::new();
        values.insert("pkg".into(), json!({"version": "9.9.9"}));
        apply_defaults(&mut values);

        assert_eq!(lookup(&values, PKG_VERSION_KEY), Some(&json!("9.9.9")));
        assert_eq!(lookup(&values, PKG_NAME_KEY), Some(&json!("plinth")));
        assert_eq!(lookup(&values, PLUGIN_PATHS_KEY), Some(&json!([])));
        assert_eq!(
            lookup(&values, PLUGIN_CONCURRENCY_KEY),
            Some(&json!(DEFAULT_CONCURRENCY))
        );
    }
}
