use std::{collections::BTreeMap, fmt, path::PathBuf, sync::Arc};

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

use crate::{error::Error, spec::ModuleSpec};

// ── Descriptors ─────────────────────────────────────────────────────────────

/// The parsed `package.json` of a candidate plugin package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Host version requirements, keyed by host name.
    #[serde(default)]
    pub engines: BTreeMap<String, String>,
    /// The `plinth` section declaring module specs.
    #[serde(default)]
    pub plinth: Option<Value>,
    /// Everything else in the manifest.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A discovered package: its directory and manifest, prior to loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub directory_path: PathBuf,
    pub manifest: PackageManifest,
}

/// What a package locator yields for each candidate location.
pub type DescriptorResult = Result<PackageDescriptor, Error>;

// ── Packs ───────────────────────────────────────────────────────────────────

/// A loaded package and the module specs it declares, in declaration order.
#[derive(Clone)]
pub struct Pack {
    pub name: String,
    pub version: Option<String>,
    pub directory_path: PathBuf,
    pub specs: Vec<Arc<dyn ModuleSpec>>,
}

impl fmt::Debug for Pack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.specs.iter().map(|s| s.id()).collect();
        f.debug_struct("Pack")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("directory_path", &self.directory_path)
            .field("specs", &ids)
            .finish()
    }
}

/// What a pack synthesizer yields for each descriptor.
pub type PackResult = Result<Pack, Error>;

// ── Deprecations ────────────────────────────────────────────────────────────

/// A deprecation notice a module spec emitted while extending configuration.
#[derive(Clone)]
pub struct Deprecation {
    pub spec: Arc<dyn ModuleSpec>,
    pub message: String,
}

impl fmt::Debug for Deprecation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deprecation")
            .field("spec", &self.spec.id())
            .field("message", &self.message)
            .finish()
    }
}
