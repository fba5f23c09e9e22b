//! Pack synthesis: turning a package descriptor into its module specs.

use std::sync::Arc;

use {
    async_trait::async_trait,
    serde::Deserialize,
    tracing::debug,
};

use crate::{
    declarative::{DeclarativeSpec, SpecDeclaration},
    error::Error,
    spec::ModuleSpec,
    types::{Pack, PackResult, PackageDescriptor},
};

/// Key of the host in a manifest's `engines` table.
pub const HOST_ENGINE: &str = "plinth";

/// Loads packs from descriptors.
#[async_trait]
pub trait PackSynthesizer: Send + Sync {
    async fn synthesize(&self, descriptor: PackageDescriptor) -> PackResult;

    /// Whether `error` means a package is not a valid plugin pack.
    fn is_invalid_pack_error(&self, error: &Error) -> bool {
        matches!(error, Error::InvalidPack { .. })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlinthSection {
    #[serde(default)]
    specs: Vec<SpecDeclaration>,
}

/// Builds [`DeclarativeSpec`]s from the `plinth.specs` array of the manifest.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestPackSynthesizer;

impl ManifestPackSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PackSynthesizer for ManifestPackSynthesizer {
    async fn synthesize(&self, descriptor: PackageDescriptor) -> PackResult {
        let PackageDescriptor {
            directory_path,
            manifest,
        } = descriptor;

        let Some(section) = manifest.plinth else {
            return Err(Error::invalid_pack(
                &directory_path,
                "manifest has no `plinth` section",
            ));
        };
        let section: PlinthSection = serde_json::from_value(section).map_err(|e| {
            Error::invalid_pack(&directory_path, format!("malformed `plinth` section: {e}"))
        })?;

        let default_engine = manifest
            .engines
            .get(HOST_ENGINE)
            .map_or("*", String::as_str);
        let mut specs: Vec<Arc<dyn ModuleSpec>> = Vec::with_capacity(section.specs.len());
        for declaration in section.specs {
            if declaration.id.is_empty() || declaration.id.contains('.') {
                return Err(Error::invalid_pack(
                    &directory_path,
                    format!("invalid module spec id '{}'", declaration.id),
                ));
            }
            specs.push(Arc::new(DeclarativeSpec::from_declaration(
                declaration,
                directory_path.clone(),
                default_engine,
            )));
        }

        debug!(
            name = %manifest.name,
            path = %directory_path.display(),
            specs = specs.len(),
            "synthesized pack"
        );
        Ok(Pack {
            name: manifest.name,
            version: manifest.version,
            directory_path,
            specs,
        })
    }
}
