//! The module-spec contract every plugin module implements.

use std::{fmt, path::Path};

use {
    async_trait::async_trait,
    plinth_config::{ConfigService, Settings},
};

use crate::version::{Version, VersionReq};

/// A single plugin module: its identity, version constraint, and the routines
/// that contribute to, retract from, and are evaluated against the shared
/// configuration.
///
/// Specs are immutable once a pack produces them; all state lives in the
/// configuration they are handed.
#[async_trait]
pub trait ModuleSpec: Send + Sync + fmt::Debug {
    /// Identifier, unique across every discovered spec.
    fn id(&self) -> &str;

    /// Directory the spec was loaded from.
    fn path(&self) -> &Path;

    /// Range of host versions this spec works with.
    fn version_range(&self) -> &str {
        "*"
    }

    /// Whether this spec supports `host_version`.
    ///
    /// Unparsable ranges never match. Without a usable host version only
    /// wildcard ranges match.
    fn is_version_compatible(&self, host_version: Option<&str>) -> bool {
        let Ok(req) = VersionReq::parse(self.version_range()) else {
            return false;
        };
        match host_version.and_then(Version::parse) {
            Some(version) => req.matches(&version),
            None => req.is_any(),
        }
    }

    /// Contribute this spec's configuration surface.
    async fn extend_config(&self, cx: &mut ExtendContext<'_>) -> anyhow::Result<()>;

    /// Remove whatever [`ModuleSpec::extend_config`] contributed.
    async fn disable_config(&self, config: &mut ConfigService) -> anyhow::Result<()>;

    /// Whether the fully merged configuration enables this spec.
    async fn is_enabled(&self, config: &ConfigService) -> bool;
}

/// What a spec sees while extending the configuration.
pub struct ExtendContext<'a> {
    config: &'a mut ConfigService,
    settings: &'a Settings,
    deprecations: Vec<String>,
}

impl<'a> ExtendContext<'a> {
    pub fn new(config: &'a mut ConfigService, settings: &'a Settings) -> Self {
        Self {
            config,
            settings,
            deprecations: Vec::new(),
        }
    }

    pub fn config(&self) -> &ConfigService {
        &*self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigService {
        &mut *self.config
    }

    /// The raw settings the run started with.
    pub fn settings(&self) -> &Settings {
        self.settings
    }

    /// Record a deprecation notice for this spec.
    pub fn deprecate(&mut self, message: impl Into<String>) {
        self.deprecations.push(message.into());
    }

    pub fn into_deprecations(self) -> Vec<String> {
        self.deprecations
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::path::PathBuf};

    #[derive(Debug)]
    struct Ranged(&'static str, PathBuf);

    #[async_trait]
    impl ModuleSpec for Ranged {
        fn id(&self) -> &str {
            "ranged"
        }

        fn path(&self) -> &Path {
            &self.1
        }

        fn version_range(&self) -> &str {
            self.0
        }

        async fn extend_config(&self, cx: &mut ExtendContext<'_>) -> anyhow::Result<()> {
            cx.config_mut().set("ranged.on", true)?;
            cx.deprecate("old");
            Ok(())
        }

        async fn disable_config(&self, config: &mut ConfigService) -> anyhow::Result<()> {
            config.remove("ranged");
            Ok(())
        }

        async fn is_enabled(&self, _config: &ConfigService) -> bool {
            true
        }
    }

    #[test]
    fn version_compatibility_defaults() {
        let spec = Ranged("^1.2", PathBuf::new());
        assert!(spec.is_version_compatible(Some("1.4.0")));
        assert!(!spec.is_version_compatible(Some("2.0.0")));
        assert!(!spec.is_version_compatible(None));
        assert!(!spec.is_version_compatible(Some("garbage")));

        assert!(Ranged("*", PathBuf::new()).is_version_compatible(None));
        assert!(!Ranged("not a range", PathBuf::new()).is_version_compatible(Some("1.0.0")));
    }

    #[tokio::test]
    async fn extend_context_collects_deprecations() {
        let spec = Ranged("*", PathBuf::new());
        let mut config = ConfigService::new();
        let settings = Settings::new();

        let mut cx = ExtendContext::new(&mut config, &settings);
        spec.extend_config(&mut cx).await.unwrap();
        assert_eq!(cx.into_deprecations(), vec!["old".to_string()]);
        assert_eq!(config.get_bool("ranged.on"), Some(true));
    }
}
