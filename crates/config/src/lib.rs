//! Settings loading, deprecated-key normalization, default schema, and the
//! shared configuration service that plugin module specs extend.
//!
//! Settings files: `plinth.toml`, `plinth.yaml`, `plinth.yml` or `plinth.json`,
//! searched in `./` then `~/.config/plinth/`. `${ENV_VAR}` placeholders are
//! expanded before parsing.

pub mod defaults;
pub mod env_subst;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod service;
pub mod settings;
pub mod source;

pub use {
    error::{Error, Result},
    loader::{discover_settings, find_settings_file, load_settings, settings_dir},
    service::{ConfigService, SharedConfig},
    settings::Settings,
    source::ConfigSource,
};
