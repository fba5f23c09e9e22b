//! The output side of a discovery run.
//!
//! Every channel is independent: receivers that are never read (or dropped
//! early) do not hold the run back, and the run's side effects happen once no
//! matter how many receivers are observed.

use std::{fmt, sync::Arc};

use {
    plinth_config::SharedConfig,
    tokio::sync::{mpsc, oneshot},
};

use crate::{
    error::Error,
    spec::ModuleSpec,
    types::{Deprecation, Pack, PackageDescriptor},
};

/// Receivers for everything a discovery run produces.
///
/// All channels close when the run ends. After a fatal failure the spec
/// channels, `deprecations` and `extended_config` close without emitting
/// anything further.
pub struct DiscoveryChannels {
    /// Each located package descriptor, after deduplication.
    pub descriptors: mpsc::UnboundedReceiver<PackageDescriptor>,
    /// Each successfully synthesized pack.
    pub packs: mpsc::UnboundedReceiver<Pack>,
    pub invalid_directory_errors: mpsc::UnboundedReceiver<Error>,
    pub invalid_pack_errors: mpsc::UnboundedReceiver<Error>,
    pub other_errors: mpsc::UnboundedReceiver<Error>,
    pub deprecations: mpsc::UnboundedReceiver<Deprecation>,
    /// Enabled specs.
    pub specs: mpsc::UnboundedReceiver<Arc<dyn ModuleSpec>>,
    /// Disabled specs, including the invalid-version ones.
    pub disabled_specs: mpsc::UnboundedReceiver<Arc<dyn ModuleSpec>>,
    pub invalid_version_specs: mpsc::UnboundedReceiver<Arc<dyn ModuleSpec>>,
    /// The configuration once every spec has extended it and every disabled
    /// spec has been rolled back.
    pub extended_config: oneshot::Receiver<SharedConfig>,
}

impl fmt::Debug for DiscoveryChannels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryChannels").finish_non_exhaustive()
    }
}

/// The pipeline's ends of [`DiscoveryChannels`].
pub(crate) struct DiscoverySenders {
    pub descriptors: mpsc::UnboundedSender<PackageDescriptor>,
    pub packs: mpsc::UnboundedSender<Pack>,
    pub errors: ErrorSenders,
    pub deprecations: mpsc::UnboundedSender<Deprecation>,
    pub specs: mpsc::UnboundedSender<Arc<dyn ModuleSpec>>,
    pub disabled_specs: mpsc::UnboundedSender<Arc<dyn ModuleSpec>>,
    pub invalid_version_specs: mpsc::UnboundedSender<Arc<dyn ModuleSpec>>,
    pub extended_config: oneshot::Sender<SharedConfig>,
}

/// Which error channel an error belongs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidDirectory,
    InvalidPack,
    Other,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidDirectory => "invalid_directory",
            Self::InvalidPack => "invalid_pack",
            Self::Other => "other",
        }
    }
}

pub(crate) struct ErrorSenders {
    invalid_directory: mpsc::UnboundedSender<Error>,
    invalid_pack: mpsc::UnboundedSender<Error>,
    other: mpsc::UnboundedSender<Error>,
}

impl ErrorSenders {
    pub fn send(&self, kind: ErrorKind, error: Error) {
        let tx = match kind {
            ErrorKind::InvalidDirectory => &self.invalid_directory,
            ErrorKind::InvalidPack => &self.invalid_pack,
            ErrorKind::Other => &self.other,
        };
        // A dropped receiver means nobody wants this channel.
        let _ = tx.send(error);
    }
}

pub(crate) fn discovery_channels() -> (DiscoverySenders, DiscoveryChannels) {
    let (descriptors_tx, descriptors) = mpsc::unbounded_channel();
    let (packs_tx, packs) = mpsc::unbounded_channel();
    let (invalid_directory_tx, invalid_directory_errors) = mpsc::unbounded_channel();
    let (invalid_pack_tx, invalid_pack_errors) = mpsc::unbounded_channel();
    let (other_tx, other_errors) = mpsc::unbounded_channel();
    let (deprecations_tx, deprecations) = mpsc::unbounded_channel();
    let (specs_tx, specs) = mpsc::unbounded_channel();
    let (disabled_tx, disabled_specs) = mpsc::unbounded_channel();
    let (invalid_version_tx, invalid_version_specs) = mpsc::unbounded_channel();
    let (config_tx, extended_config) = oneshot::channel();

    let senders = DiscoverySenders {
        descriptors: descriptors_tx,
        packs: packs_tx,
        errors: ErrorSenders {
            invalid_directory: invalid_directory_tx,
            invalid_pack: invalid_pack_tx,
            other: other_tx,
        },
        deprecations: deprecations_tx,
        specs: specs_tx,
        disabled_specs: disabled_tx,
        invalid_version_specs: invalid_version_tx,
        extended_config: config_tx,
    };
    let channels = DiscoveryChannels {
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
    };
    (senders, channels)
}
