//! Collecting a whole run into one value.

use std::{collections::HashSet, path::PathBuf, sync::Arc};

use {
    plinth_config::SharedConfig,
    serde::Serialize,
    serde_json::Value,
    tokio::sync::mpsc::UnboundedReceiver,
};

use crate::{
    channels::{DiscoveryChannels, ErrorKind},
    enablement::SpecState,
    error::{Error, Result},
    pipeline::DiscoveryTask,
    spec::ModuleSpec,
    types::{Deprecation, Pack, PackageDescriptor},
};

/// Everything a finished run emitted, channel by channel.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub descriptors: Vec<PackageDescriptor>,
    pub packs: Vec<Pack>,
    pub invalid_directory_errors: Vec<Error>,
    pub invalid_pack_errors: Vec<Error>,
    pub other_errors: Vec<Error>,
    pub deprecations: Vec<Deprecation>,
    pub specs: Vec<Arc<dyn ModuleSpec>>,
    pub disabled_specs: Vec<Arc<dyn ModuleSpec>>,
    pub invalid_version_specs: Vec<Arc<dyn ModuleSpec>>,
    pub extended_config: Option<SharedConfig>,
}

impl DiscoveryReport {
    /// Run `task` while draining every channel.
    ///
    /// Returns the task's error if the run failed fatally.
    pub async fn collect(task: DiscoveryTask, channels: DiscoveryChannels) -> Result<Self> {
        let DiscoveryChannels {
            descriptors,
            packs,
            invalid_directory_errors,
            invalid_pack_errors,
            other_errors,
            deprecations,
            specs,
            disabled_specs,
            invalid_version_specs,
            extended_config,
        } = channels;

        let (
            run,
            descriptors,
            packs,
            invalid_directory_errors,
            invalid_pack_errors,
            other_errors,
            deprecations,
            specs,
            disabled_specs,
            invalid_version_specs,
        ) = tokio::join!(
            task.run(),
            drain(descriptors),
            drain(packs),
            drain(invalid_directory_errors),
            drain(invalid_pack_errors),
            drain(other_errors),
            drain(deprecations),
            drain(specs),
            drain(disabled_specs),
            drain(invalid_version_specs),
        );
        run?;

        Ok(Self {
            descriptors,
            packs,
            invalid_directory_errors,
            invalid_pack_errors,
            other_errors,
            deprecations,
            specs,
            disabled_specs,
            invalid_version_specs,
            extended_config: extended_config.await.ok(),
        })
    }

    pub fn error_count(&self) -> usize {
        self.invalid_directory_errors.len() + self.invalid_pack_errors.len() + self.other_errors.len()
    }

    /// A serializable view of the report.
    pub async fn summary(&self) -> DiscoverySummary {
        let invalid: HashSet<&str> = self.invalid_version_specs.iter().map(|s| s.id()).collect();
        let enabled = self
            .specs
            .iter()
            .map(|spec| SpecSummary::new(spec.as_ref(), SpecState::Enabled));
        let disabled = self.disabled_specs.iter().map(|spec| {
            let state = if invalid.contains(spec.id()) {
                SpecState::InvalidVersion
            } else {
                SpecState::Disabled
            };
            SpecSummary::new(spec.as_ref(), state)
        });
        let mut specs: Vec<SpecSummary> = enabled.chain(disabled).collect();
        specs.sort_by(|a, b| a.id.cmp(&b.id));

        let errors = [
            (ErrorKind::InvalidDirectory, &self.invalid_directory_errors),
            (ErrorKind::InvalidPack, &self.invalid_pack_errors),
            (ErrorKind::Other, &self.other_errors),
        ]
        .into_iter()
        .flat_map(|(kind, errors)| {
            errors.iter().map(move |e| ErrorSummary {
                kind: kind.as_str(),
                message: e.to_string(),
            })
        })
        .collect();

        let config = match &self.extended_config {
            Some(config) => Some(config.read().await.to_value()),
            None => None,
        };

        DiscoverySummary {
            packs: self
                .packs
                .iter()
                .map(|pack| PackSummary {
                    name: pack.name.clone(),
                    version: pack.version.clone(),
                    path: pack.directory_path.clone(),
                    specs: pack.specs.iter().map(|s| s.id().to_string()).collect(),
                })
                .collect(),
            specs,
            deprecations: self
                .deprecations
                .iter()
                .map(|d| DeprecationSummary {
                    id: d.spec.id().to_string(),
                    message: d.message.clone(),
                })
                .collect(),
            errors,
            config,
        }
    }
}

async fn drain<T>(mut rx: UnboundedReceiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Some(item) = rx.recv().await {
        items.push(item);
    }
    items
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoverySummary {
    pub packs: Vec<PackSummary>,
    pub specs: Vec<SpecSummary>,
    pub deprecations: Vec<DeprecationSummary>,
    pub errors: Vec<ErrorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackSummary {
    pub name: String,
    pub version: Option<String>,
    pub path: PathBuf,
    pub specs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecSummary {
    pub id: String,
    pub path: PathBuf,
    pub version_range: String,
    pub state: SpecState,
}

impl SpecSummary {
    fn new(spec: &dyn ModuleSpec, state: SpecState) -> Self {
        Self {
            id: spec.id().to_string(),
            path: spec.path().to_path_buf(),
            version_range: spec.version_range().to_string(),
            state,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeprecationSummary {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorSummary {
    pub kind: &'static str,
    pub message: String,
}
