use std::{fmt, slice, sync::Arc};

use {
    futures::future::join_all,
    plinth_config::{ConfigService, SharedConfig, defaults::PKG_VERSION_KEY},
    serde::Serialize,
    tracing::debug,
};

use crate::{extend::ExtendedSpec, spec::ModuleSpec};

/// Where a spec ended up after enablement was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecState {
    Enabled,
    /// Compatible, but switched off by configuration.
    Disabled,
    /// Not compatible with the host version. Also counts as disabled.
    InvalidVersion,
}

impl SpecState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::InvalidVersion => "invalid_version",
        }
    }
}

impl fmt::Display for SpecState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A spec with its enablement decided.
#[derive(Clone)]
pub struct ClassifiedSpec {
    pub spec: Arc<dyn ModuleSpec>,
    pub deprecations: Vec<String>,
    pub version_compatible: bool,
    pub enabled: bool,
}

impl ClassifiedSpec {
    pub fn is_invalid_version(&self) -> bool {
        !self.version_compatible
    }

    pub fn state(&self) -> SpecState {
        if self.enabled {
            SpecState::Enabled
        } else if self.version_compatible {
            SpecState::Disabled
        } else {
            SpecState::InvalidVersion
        }
    }

    /// The spec if it is enabled, otherwise empty.
    pub fn enabled_specs(&self) -> &[Arc<dyn ModuleSpec>] {
        self.only_if(self.enabled)
    }

    /// The spec if it is disabled for any reason, otherwise empty.
    pub fn disabled_specs(&self) -> &[Arc<dyn ModuleSpec>] {
        self.only_if(!self.enabled)
    }

    /// The spec if its version range excludes the host, otherwise empty.
    pub fn invalid_version_specs(&self) -> &[Arc<dyn ModuleSpec>] {
        self.only_if(self.is_invalid_version())
    }

    fn only_if(&self, condition: bool) -> &[Arc<dyn ModuleSpec>] {
        if condition {
            slice::from_ref(&self.spec)
        } else {
            &[]
        }
    }
}

impl fmt::Debug for ClassifiedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifiedSpec")
            .field("spec", &self.spec.id())
            .field("state", &self.state())
            .field("deprecations", &self.deprecations)
            .finish()
    }
}

/// Decide, for every extended spec, whether it is version compatible and
/// enabled.
///
/// Runs against the fully extended configuration under a read lock, so every
/// predicate sees every spec's contributions. The host version is read from
/// `pkg.version`.
pub async fn resolve_enablement(
    extended: Vec<ExtendedSpec>,
    config: &SharedConfig,
) -> Vec<ClassifiedSpec> {
    let config = config.read().await;
    let config: &ConfigService = &config;
    let host_version = config.get_str(PKG_VERSION_KEY);

    let classified = join_all(extended.into_iter().map(|extended| async move {
        let ExtendedSpec { spec, deprecations } = extended;
        let version_compatible = spec.is_version_compatible(host_version);
        let enabled = version_compatible && spec.is_enabled(config).await;
        ClassifiedSpec {
            spec,
            deprecations,
            version_compatible,
            enabled,
        }
    }))
    .await;

    debug!(
        host_version = host_version.unwrap_or("<none>"),
        enabled = classified.iter().filter(|c| c.enabled).count(),
        total = classified.len(),
        "resolved module spec enablement"
    );
    classified
}
