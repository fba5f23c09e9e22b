//! The discovery run: locate → dedupe → synthesize → conflict check →
//! extend → resolve enablement → roll back.

use std::{path::PathBuf, pin::pin, sync::Arc};

use {
    futures::{StreamExt, future, stream},
    plinth_config::{
        ConfigService, ConfigSource,
        defaults::{
            DEFAULT_CONCURRENCY, PLUGIN_CONCURRENCY_KEY, PLUGIN_DIRECTORIES_KEY, PLUGIN_PATHS_KEY,
        },
    },
    serde_json::Value,
    tokio::{sync::mpsc, task::JoinHandle},
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use plinth_metrics::{counter, discovery as discovery_metrics, histogram, labels};

use crate::{
    channels::{DiscoveryChannels, DiscoverySenders, ErrorKind, ErrorSenders, discovery_channels},
    conflict::detect_conflicts,
    dedupe::dedupe,
    enablement::resolve_enablement,
    error::{Error, Result},
    extend::extend_specs,
    locate::{LocateTarget, PackageLocator},
    rollback::rollback_disabled,
    spec::ModuleSpec,
    synth::PackSynthesizer,
    types::{Pack, PackageDescriptor},
};

/// A configured discovery run, not yet started.
pub struct PluginDiscovery {
    source: ConfigSource,
    locator: Arc<dyn PackageLocator>,
    synthesizer: Arc<dyn PackSynthesizer>,
}

impl PluginDiscovery {
    pub fn new(
        source: ConfigSource,
        locator: impl PackageLocator + 'static,
        synthesizer: impl PackSynthesizer + 'static,
    ) -> Self {
        Self {
            source,
            locator: Arc::new(locator),
            synthesizer: Arc::new(synthesizer),
        }
    }

    /// Split the run into the task that drives it and the channels it feeds.
    ///
    /// Nothing happens until the task is run or spawned.
    pub fn start(self) -> (DiscoveryTask, DiscoveryChannels) {
        let (senders, channels) = discovery_channels();
        (
            DiscoveryTask {
                discovery: self,
                senders,
            },
            channels,
        )
    }
}

/// Drives one discovery run to completion.
pub struct DiscoveryTask {
    discovery: PluginDiscovery,
    senders: DiscoverySenders,
}

impl DiscoveryTask {
    /// Run the pipeline. Per-item errors go to the error channels; only fatal
    /// failures are returned.
    pub async fn run(self) -> Result<()> {
        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();
        #[cfg(feature = "metrics")]
        counter!(discovery_metrics::RUNS_TOTAL).increment(1);

        let result = self.discovery.drive(self.senders).await;

        #[cfg(feature = "metrics")]
        {
            histogram!(discovery_metrics::DURATION_SECONDS).record(start.elapsed().as_secs_f64());
            if result.is_err() {
                counter!(discovery_metrics::FAILED_RUNS_TOTAL).increment(1);
            }
        }

        if let Err(e) = &result {
            warn!(error = %e, "plugin discovery failed");
        }
        result
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }
}

impl PluginDiscovery {
    async fn drive(self, senders: DiscoverySenders) -> Result<()> {
        let DiscoverySenders {
            descriptors: descriptors_tx,
            packs: packs_tx,
            errors: errors_tx,
            deprecations: deprecations_tx,
            specs: specs_tx,
            disabled_specs: disabled_tx,
            invalid_version_specs: invalid_version_tx,
            extended_config: config_tx,
        } = senders;

        let config = self.source.get().await?;
        let (targets, concurrency) = {
            let config = config.read().await;
            (locate_targets(&config), synth_concurrency(&config))
        };
        info!(targets = targets.len(), concurrency, "starting plugin discovery");

        let specs = self
            .collect_specs(targets, concurrency, descriptors_tx, packs_tx, errors_tx)
            .await;

        let specs = detect_conflicts(specs)?;

        let extended = extend_specs(specs, &config, self.source.settings(), |deprecation| {
            #[cfg(feature = "metrics")]
            counter!(discovery_metrics::DEPRECATIONS_TOTAL).increment(1);
            let _ = deprecations_tx.send(deprecation);
        })
        .await?;
        drop(deprecations_tx);

        let classified = resolve_enablement(extended, &config).await;
        let rolled_back = rollback_disabled(&classified, &config).await?;

        for spec in &classified {
            #[cfg(feature = "metrics")]
            counter!(discovery_metrics::SPECS_TOTAL, labels::SPEC_STATE => spec.state().as_str())
                .increment(1);
            emit(&specs_tx, spec.enabled_specs());
            emit(&disabled_tx, spec.disabled_specs());
            emit(&invalid_version_tx, spec.invalid_version_specs());
        }
        let _ = config_tx.send(Arc::clone(&config));

        info!(
            specs = classified.len(),
            enabled = classified.iter().filter(|c| c.enabled).count(),
            invalid_version = classified.iter().filter(|c| c.is_invalid_version()).count(),
            rolled_back,
            "plugin discovery finished"
        );
        Ok(())
    }

    /// Locate, dedupe and synthesize, routing every per-item result to its
    /// channel. Returns every spec of every pack once the synthesizer stream
    /// is exhausted; the senders are dropped on return.
    async fn collect_specs(
        &self,
        targets: Vec<LocateTarget>,
        concurrency: usize,
        descriptors_tx: mpsc::UnboundedSender<PackageDescriptor>,
        packs_tx: mpsc::UnboundedSender<Pack>,
        errors_tx: ErrorSenders,
    ) -> Vec<Arc<dyn ModuleSpec>> {
        let report = |error: Error| {
            let kind = if self.locator.is_invalid_directory_error(&error) {
                ErrorKind::InvalidDirectory
            } else if self.synthesizer.is_invalid_pack_error(&error) {
                ErrorKind::InvalidPack
            } else {
                ErrorKind::Other
            };
            warn!(kind = kind.as_str(), error = %error, "plugin discovery error");
            #[cfg(feature = "metrics")]
            counter!(discovery_metrics::ERRORS_TOTAL, labels::ERROR_KIND => kind.as_str())
                .increment(1);
            errors_tx.send(kind, error);
        };

        let located = stream::select_all(targets.into_iter().map(|t| self.locator.locate(t)));
        let descriptors = dedupe(located).filter_map(|result| {
            future::ready(match result {
                Ok(descriptor) => {
                    #[cfg(feature = "metrics")]
                    counter!(discovery_metrics::DESCRIPTORS_TOTAL).increment(1);
                    let _ = descriptors_tx.send(descriptor.clone());
                    Some(descriptor)
                },
                Err(error) => {
                    report(error);
                    None
                },
            })
        });
        let mut packs = pin!(
            descriptors
                .map(|descriptor| self.synthesizer.synthesize(descriptor))
                .buffer_unordered(concurrency)
        );

        let mut specs = Vec::new();
        let mut pack_count = 0usize;
        while let Some(result) = packs.next().await {
            match result {
                Ok(pack) => {
                    debug!(
                        name = %pack.name,
                        path = %pack.directory_path.display(),
                        specs = pack.specs.len(),
                        "loaded pack"
                    );
                    #[cfg(feature = "metrics")]
                    counter!(discovery_metrics::PACKS_TOTAL).increment(1);
                    specs.extend(pack.specs.iter().cloned());
                    pack_count += 1;
                    let _ = packs_tx.send(pack);
                },
                Err(error) => report(error),
            }
        }

        debug!(packs = pack_count, specs = specs.len(), "collected module specs");
        specs
    }
}

fn emit(tx: &mpsc::UnboundedSender<Arc<dyn ModuleSpec>>, specs: &[Arc<dyn ModuleSpec>]) {
    for spec in specs {
        let _ = tx.send(Arc::clone(spec));
    }
}

/// Explicit package paths first, then scan directories.
fn locate_targets(config: &ConfigService) -> Vec<LocateTarget> {
    let paths = configured_paths(config, PLUGIN_PATHS_KEY)
        .into_iter()
        .map(LocateTarget::Path);
    let directories = configured_paths(config, PLUGIN_DIRECTORIES_KEY)
        .into_iter()
        .map(LocateTarget::Directory);
    paths.chain(directories).collect()
}

fn configured_paths(config: &ConfigService, key: &str) -> Vec<PathBuf> {
    match config.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(single)) => vec![PathBuf::from(single)],
        Some(_) => config.get_as(key).unwrap_or_else(|| {
            warn!(key, "expected a list of paths, ignoring setting");
            Vec::new()
        }),
    }
}

fn synth_concurrency(config: &ConfigService) -> usize {
    config
        .get_as::<usize>(PLUGIN_CONCURRENCY_KEY)
        .unwrap_or(DEFAULT_CONCURRENCY)
        .max(1)
}
