//! `plinth discover`: run plugin discovery and print what it found.

use std::path::{Path, PathBuf};

use {
    anyhow::Result,
    clap::Args,
    plinth_config::{
        ConfigService, ConfigSource,
        defaults::{PLUGIN_DIRECTORIES_KEY, PLUGIN_PATHS_KEY},
    },
    plinth_plugins::{
        DiscoveryReport, DiscoverySummary, FsPackageLocator, ManifestPackSynthesizer,
        PluginDiscovery, SpecState,
    },
};

use crate::SettingsArg;

#[derive(Args)]
pub struct DiscoverArgs {
    #[command(flatten)]
    settings: SettingsArg,

    /// Load the package in this directory (repeatable).
    #[arg(long = "path", value_name = "DIR")]
    paths: Vec<PathBuf>,

    /// Scan this directory for packages (repeatable).
    #[arg(long = "dir", value_name = "DIR")]
    directories: Vec<PathBuf>,

    /// Print the report as JSON, including the final configuration.
    #[arg(long)]
    json: bool,
}

pub async fn handle_discover(args: DiscoverArgs) -> Result<()> {
    let settings = args.settings.load()?;

    // Command-line locations are added after the settings are normalized, so
    // they extend deprecated keys instead of replacing them.
    let mut config = ConfigService::from_settings(&settings)?;
    append_paths(&mut config, PLUGIN_PATHS_KEY, &args.paths)?;
    append_paths(&mut config, PLUGIN_DIRECTORIES_KEY, &args.directories)?;

    let (task, channels) = PluginDiscovery::new(
        ConfigSource::with_config(settings, config.into_shared()),
        FsPackageLocator::new(),
        ManifestPackSynthesizer::new(),
    )
    .start();
    let report = DiscoveryReport::collect(task, channels).await?;
    let summary = report.summary().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn append_paths(config: &mut ConfigService, key: &str, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        config.push(key, display_path(path))?;
    }
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn print_summary(summary: &DiscoverySummary) {
    if summary.packs.is_empty() && summary.errors.is_empty() {
        println!("No plugins found.");
        println!(
            "Add package directories to `{PLUGIN_PATHS_KEY}` or scan directories to `{PLUGIN_DIRECTORIES_KEY}`."
        );
        return;
    }

    for state in [SpecState::Enabled, SpecState::Disabled, SpecState::InvalidVersion] {
        let specs: Vec<_> = summary.specs.iter().filter(|s| s.state == state).collect();
        if specs.is_empty() {
            continue;
        }
        let (heading, mark) = match state {
            SpecState::Enabled => ("Enabled", "✓"),
            SpecState::Disabled => ("Disabled", "✗"),
            SpecState::InvalidVersion => ("Incompatible", "✗"),
        };
        println!("{heading}:");
        for spec in specs {
            println!(
                "  {mark} {id} ({range}) {path}",
                id = spec.id,
                range = spec.version_range,
                path = spec.path.display(),
            );
        }
    }

    if !summary.deprecations.is_empty() {
        println!("Deprecations:");
        for deprecation in &summary.deprecations {
            println!("  ! {}: {}", deprecation.id, deprecation.message);
        }
    }

    if !summary.errors.is_empty() {
        println!("Errors:");
        for error in &summary.errors {
            println!("  [{}] {}", error.kind, error.message);
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn command_line_paths_extend_configured_ones() {
        let settings =
            plinth_config::Settings::from_value(json!({"pluginSearchDirs": ["/from/settings"]}))
                .unwrap();
        let mut config = ConfigService::from_settings(&settings).unwrap();
        append_paths(&mut config, PLUGIN_DIRECTORIES_KEY, &[PathBuf::from("/from/cli")]).unwrap();
        append_paths(&mut config, PLUGIN_PATHS_KEY, &[PathBuf::from("/one")]).unwrap();

        assert_eq!(
            config.get(PLUGIN_DIRECTORIES_KEY),
            Some(&json!(["/from/settings", "/from/cli"]))
        );
        assert_eq!(config.get(PLUGIN_PATHS_KEY), Some(&json!(["/one"])));
    }

    #[tokio::test]
    async fn discovers_packages_from_the_command_line() {
        let tmp = tempfile::tempdir().unwrap();
        let pkg = tmp.path().join("lint");
        std::fs::create_dir_all(&pkg).unwrap();
        std::fs::write(
            pkg.join("package.json"),
            r#"{"name": "lint", "plinth": {"specs": [{"id": "lint"}]}}"#,
        )
        .unwrap();
        let settings_file = tmp.path().join("plinth.json");
        std::fs::write(&settings_file, "{}").unwrap();

        let args = DiscoverArgs {
            settings: SettingsArg {
                settings: Some(settings_file),
            },
            paths: Vec::new(),
            directories: vec![tmp.path().to_path_buf()],
            json: true,
        };
        handle_discover(args).await.unwrap();
    }
}
