//! Produces the one configuration object a discovery run works on.

use std::sync::Arc;

use {tokio::sync::OnceCell, tracing::debug};

use crate::{
    error::Result,
    service::{ConfigService, SharedConfig},
    settings::Settings,
};

/// Lazily produces the shared configuration, at most once.
///
/// Either adopts a caller-supplied [`SharedConfig`] or builds one from the
/// settings. Every call to [`ConfigSource::get`] replays the same instance.
pub struct ConfigSource {
    settings: Settings,
    supplied: Option<SharedConfig>,
    cell: OnceCell<SharedConfig>,
}

impl ConfigSource {
    pub fn new(settings: Settings, supplied: Option<SharedConfig>) -> Self {
        Self {
            settings,
            supplied,
            cell: OnceCell::new(),
        }
    }

    /// Build the configuration from `settings` on first use.
    pub fn from_settings(settings: Settings) -> Self {
        Self::new(settings, None)
    }

    /// Adopt an existing configuration; it is mutated in place by the run.
    pub fn with_config(settings: Settings, config: SharedConfig) -> Self {
        Self::new(settings, Some(config))
    }

    /// The raw settings this run was started with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether the configuration has been produced yet.
    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    /// Produce the configuration, building it on the first call only.
    pub async fn get(&self) -> Result<SharedConfig> {
        let config = self
            .cell
            .get_or_try_init(|| async {
                match &self.supplied {
                    Some(config) => {
                        debug!("adopting caller-supplied configuration");
                        Ok(Arc::clone(config))
                    },
                    None => ConfigService::from_settings(&self.settings).map(ConfigService::into_shared),
                }
            })
            .await?;
        Ok(Arc::clone(config))
    }
}
