//! Plugin discovery: finding plugin packages on disk, merging their module
//! specs into the shared configuration, and deciding which specs are enabled.
//!
//! A run locates package descriptors for every configured path and scan
//! directory, drops duplicates, synthesizes packs, rejects duplicate spec ids,
//! lets every spec extend the configuration, resolves enablement against the
//! fully merged configuration, and finally rolls back the configuration of
//! every disabled spec. Each kind of result is delivered on its own channel
//! (see [`DiscoveryChannels`]).
//!
//! ```no_run
//! # async fn run() -> plinth_plugins::Result<()> {
//! use plinth_config::{ConfigSource, Settings};
//! use plinth_plugins::{DiscoveryReport, FsPackageLocator, ManifestPackSynthesizer, PluginDiscovery};
//!
//! let source = ConfigSource::from_settings(Settings::new());
//! let (task, channels) =
//!     PluginDiscovery::new(source, FsPackageLocator::new(), ManifestPackSynthesizer).start();
//! let report = DiscoveryReport::collect(task, channels).await?;
//! for spec in &report.specs {
//!     println!("enabled: {}", spec.id());
//! }
//! # Ok(())
//! # }
//! ```

pub mod channels;
pub mod conflict;
pub mod declarative;
pub mod dedupe;
pub mod enablement;
pub mod error;
pub mod extend;
pub mod locate;
pub mod pipeline;
pub mod report;
pub mod rollback;
pub mod spec;
pub mod synth;
pub mod types;
pub mod version;

#[cfg(test)]
mod testing;

pub use {
    channels::{DiscoveryChannels, ErrorKind},
    conflict::detect_conflicts,
    declarative::{DeclarativeSpec, SpecDeclaration},
    dedupe::{DistinctKey, dedupe, distinct_key},
    enablement::{ClassifiedSpec, SpecState, resolve_enablement},
    error::{Error, Result, SpecConflict, SpecStage},
    extend::{ExtendedSpec, extend_specs},
    locate::{FsPackageLocator, LocateTarget, PACKAGE_MANIFEST, PackageLocator},
    pipeline::{DiscoveryTask, PluginDiscovery},
    report::{DiscoveryReport, DiscoverySummary},
    rollback::rollback_disabled,
    spec::{ExtendContext, ModuleSpec},
    synth::{ManifestPackSynthesizer, PackSynthesizer},
    types::{Deprecation, DescriptorResult, Pack, PackResult, PackageDescriptor, PackageManifest},
    version::{Version, VersionReq},
};
