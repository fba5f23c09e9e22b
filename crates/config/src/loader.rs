use std::path::{Path, PathBuf};

use {
    serde_json::Value,
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    settings::Settings,
};

/// Standard settings file names, checked in order.
const SETTINGS_FILENAMES: &[&str] = &["plinth.toml", "plinth.yaml", "plinth.yml", "plinth.json"];

/// Load settings from the given file (any supported format).
pub fn load_settings(path: &Path) -> Result<Settings> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    let raw = substitute_env(&raw);
    parse_settings(&raw, path)
}

/// Discover and load settings from standard locations.
///
/// Search order:
/// 1. `./plinth.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/plinth/plinth.{toml,yaml,yml,json}` (user-global)
///
/// Returns empty settings if no file is found or the file cannot be loaded.
pub fn discover_settings() -> Settings {
    if let Some(path) = find_settings_file() {
        debug!(path = %path.display(), "loading settings");
        match load_settings(&path) {
            Ok(settings) => return settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load settings, using empty settings");
            },
        }
    } else {
        debug!("no settings file found, using empty settings");
    }
    Settings::default()
}

/// Find the first settings file in standard locations.
pub fn find_settings_file() -> Option<PathBuf> {
    let local = SETTINGS_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists());
    if local.is_some() {
        return local;
    }

    let dir = settings_dir()?;
    SETTINGS_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global settings directory (`~/.config/plinth/`).
pub fn settings_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "plinth").map(|d| d.config_dir().to_path_buf())
}

fn parse_settings(raw: &str, path: &Path) -> Result<Settings> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    if !matches!(ext, "toml" | "yaml" | "yml" | "json") {
        return Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        });
    }
    let value = parse_document(raw, ext)
        .with_context(|| format!("invalid settings file {}", path.display()))?;
    Settings::from_value(value)
}

fn parse_document(raw: &str, ext: &str) -> Result<Value> {
    Ok(match ext {
        "toml" => serde_json::to_value(toml::from_str::<toml::Value>(raw)?)?,
        "yaml" | "yml" => serde_json::to_value(serde_yaml::from_str::<serde_yaml::Value>(raw)?)?,
        _ => serde_json::from_str(raw)?,
    })
}
