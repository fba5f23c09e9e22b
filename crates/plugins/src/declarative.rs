//! Module specs declared as data in a package manifest.
//!
//! A declaration looks like:
//!
//! ```json
//! {
//!   "id": "lint",
//!   "engine": "^0.3",
//!   "settings": { "enabled": true, "level": "warn" },
//!   "renamed": { "severity": "level" },
//!   "enabledBy": "lint.enabled"
//! }
//! ```
//!
//! Every key the spec owns lives under the `<id>` table of the configuration.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use {
    async_trait::async_trait,
    plinth_config::ConfigService,
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    tracing::{debug, warn},
};

use crate::spec::{ExtendContext, ModuleSpec};

/// One entry of a manifest's `plinth.specs` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDeclaration {
    pub id: String,
    /// Host version range; defaults to the package's `engines.plinth`.
    #[serde(default)]
    pub engine: Option<String>,
    /// Defaults contributed under `<id>.`.
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// Deprecated setting name → current name, both relative to `<id>.`.
    #[serde(default)]
    pub renamed: BTreeMap<String, String>,
    /// Boolean key gating the spec; defaults to `<id>.enabled`.
    #[serde(default)]
    pub enabled_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeclarativeSpec {
    id: String,
    path: PathBuf,
    version_range: String,
    settings: Map<String, Value>,
    renamed: BTreeMap<String, String>,
    enabled_by: String,
}

impl DeclarativeSpec {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let id = id.into();
        Self {
            enabled_by: format!("{id}.enabled"),
            id,
            path: path.into(),
            version_range: "*".into(),
            settings: Map::new(),
            renamed: BTreeMap::new(),
        }
    }

    /// Build a spec from its manifest declaration. `default_engine` applies
    /// when the declaration names no engine range of its own.
    pub fn from_declaration(
        declaration: SpecDeclaration,
        path: impl Into<PathBuf>,
        default_engine: &str,
    ) -> Self {
        let mut spec = Self::new(declaration.id, path)
            .with_engine(declaration.engine.as_deref().unwrap_or(default_engine));
        spec.settings = declaration.settings;
        spec.renamed = declaration.renamed;
        if let Some(key) = declaration.enabled_by {
            spec.enabled_by = key;
        }
        spec
    }

    pub fn with_engine(mut self, range: impl Into<String>) -> Self {
        self.version_range = range.into();
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn with_rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renamed.insert(from.into(), to.into());
        self
    }

    pub fn enabled_by(mut self, key: impl Into<String>) -> Self {
        self.enabled_by = key.into();
        self
    }

    fn key(&self, name: &str) -> String {
        format!("{}.{name}", self.id)
    }
}

#[async_trait]
impl ModuleSpec for DeclarativeSpec {
    fn id(&self) -> &str {
        &self.id
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn version_range(&self) -> &str {
        &self.version_range
    }

    async fn extend_config(&self, cx: &mut ExtendContext<'_>) -> anyhow::Result<()> {
        for (old, new) in &self.renamed {
            let old_key = self.key(old);
            let Some(value) = cx.settings().get(&old_key).cloned() else {
                continue;
            };
            let new_key = self.key(new);
            cx.deprecate(format!("`{old_key}` is deprecated, use `{new_key}` instead"));
            if !cx.settings().contains(&new_key) {
                cx.config_mut().set(&new_key, value)?;
            }
            cx.config_mut().remove(&old_key);
        }

        for (name, value) in &self.settings {
            cx.config_mut().set_default(&self.key(name), value.clone())?;
        }
        debug!(id = %self.id, defaults = self.settings.len(), "extended configuration");
        Ok(())
    }

    async fn disable_config(&self, config: &mut ConfigService) -> anyhow::Result<()> {
        config.remove(&self.id);
        Ok(())
    }

    async fn is_enabled(&self, config: &ConfigService) -> bool {
        match config.get(&self.enabled_by) {
            None | Some(Value::Null) => true,
            Some(Value::Bool(enabled)) => *enabled,
            Some(other) => {
                warn!(
                    id = %self.id,
                    key = %self.enabled_by,
                    value = %other,
                    "enablement key is not a boolean, treating spec as disabled"
                );
                false
            },
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        plinth_config::Settings,
        serde_json::json,
    };

    fn settings(value: Value) -> Settings {
        Settings::from_value(value).unwrap()
    }

    async fn extend(spec: &DeclarativeSpec, settings: &Settings) -> (ConfigService, Vec<String>) {
        let mut config = ConfigService::from_settings(settings).unwrap();
        let mut cx = ExtendContext::new(&mut config, settings);
        spec.extend_config(&mut cx).await.unwrap();
        let deprecations = cx.into_deprecations();
        (config, deprecations)
    }

    #[tokio::test]
    async fn defaults_never_override_caller_settings() {
        let spec = DeclarativeSpec::new("lint", "/p/lint")
            .with_setting("level", "warn")
            .with_setting("fix", false);
        let input = settings(json!({"lint": {"level": "error"}}));

        let (config, deprecations) = extend(&spec, &input).await;
        assert_eq!(config.get_str("lint.level"), Some("error"));
        assert_eq!(config.get_bool("lint.fix"), Some(false));
        assert!(deprecations.is_empty());
    }

    #[tokio::test]
    async fn renamed_settings_are_migrated_and_reported() {
        let spec = DeclarativeSpec::new("lint", "/p/lint")
            .with_setting("level", "warn")
            .with_rename("severity", "level");
        let input = settings(json!({"lint": {"severity": "error"}}));

        let (config, deprecations) = extend(&spec, &input).await;
        assert_eq!(config.get_str("lint.level"), Some("error"));
        assert!(!config.contains("lint.severity"));
        assert_eq!(deprecations.len(), 1);
        assert!(deprecations[0].contains("lint.severity"));
    }

    #[tokio::test]
    async fn current_name_wins_over_renamed_one() {
        let spec = DeclarativeSpec::new("lint", "/p/lint").with_rename("severity", "level");
        let input = settings(json!({"lint": {"severity": "error", "level": "info"}}));

        let (config, deprecations) = extend(&spec, &input).await;
        assert_eq!(config.get_str("lint.level"), Some("info"));
        assert!(!config.contains("lint.severity"));
        assert_eq!(deprecations.len(), 1);
    }

    #[tokio::test]
    async fn enablement_and_rollback() {
        let spec = DeclarativeSpec::new("fmt", "/p/fmt").with_setting("width", 100);
        let mut config = ConfigService::new();
        assert!(spec.is_enabled(&config).await);

        config.set("fmt.enabled", false).unwrap();
        assert!(!spec.is_enabled(&config).await);

        config.set("fmt.enabled", "yes").unwrap();
        assert!(!spec.is_enabled(&config).await);

        config.set("fmt.width", 80).unwrap();
        spec.disable_config(&mut config).await.unwrap();
        assert!(!config.contains("fmt"));
    }

    #[tokio::test]
    async fn custom_enablement_key() {
        let spec = DeclarativeSpec::new("fmt", "/p/fmt").enabled_by("features.formatting");
        let mut config = ConfigService::new();
        config.set("fmt.enabled", false).unwrap();
        assert!(spec.is_enabled(&config).await);

        config.set("features.formatting", false).unwrap();
        assert!(!spec.is_enabled(&config).await);
    }

    #[test]
    fn declaration_falls_back_to_package_engine() {
        let declaration: SpecDeclaration = serde_json::from_value(json!({
            "id": "lint",
            "settings": {"enabled": true},
            "enabledBy": "lint.on"
        }))
        .unwrap();
        let spec = DeclarativeSpec::from_declaration(declaration, "/p/lint", "^0.3");
        assert_eq!(spec.version_range(), "^0.3");
        assert_eq!(spec.enabled_by, "lint.on");

        let pinned: SpecDeclaration =
            serde_json::from_value(json!({"id": "fmt", "engine": ">=1"})).unwrap();
        let spec = DeclarativeSpec::from_declaration(pinned, "/p/fmt", "^0.3");
        assert_eq!(spec.version_range(), ">=1");
    }
}
