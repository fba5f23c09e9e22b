#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use {
    plinth_config::{ConfigService, ConfigSource, Settings},
    plinth_plugins::{
        DiscoveryReport, Error, FsPackageLocator, ManifestPackSynthesizer, PACKAGE_MANIFEST,
        PluginDiscovery, SpecState,
    },
    serde_json::{Value, json},
};

fn write_package(dir: &Path, manifest: Value) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(
        dir.join(PACKAGE_MANIFEST),
        serde_json::to_string_pretty(&manifest).unwrap(),
    )
    .unwrap();
    dir.to_path_buf()
}

async fn discover(settings: Value) -> plinth_plugins::Result<DiscoveryReport> {
    let settings = Settings::from_value(settings).unwrap();
    let (task, channels) = PluginDiscovery::new(
        ConfigSource::from_settings(settings),
        FsPackageLocator::new(),
        ManifestPackSynthesizer::new(),
    )
    .start();
    DiscoveryReport::collect(task, channels).await
}

fn ids(specs: &[std::sync::Arc<dyn plinth_plugins::ModuleSpec>]) -> Vec<String> {
    let mut ids: Vec<String> = specs.iter().map(|s| s.id().to_string()).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn same_package_reached_twice_is_loaded_once() {
    let tmp = tempfile::tempdir().unwrap();
    let scan = tmp.path().join("plugins");
    let lint = write_package(
        &scan.join("lint"),
        json!({"name": "lint", "plinth": {"specs": [{"id": "lint"}]}}),
    );

    let report = discover(json!({
        "plugins": {
            "paths": [lint, scan.join(".").join("lint")],
            "directories": [scan, tmp.path().join("plugins")],
        }
    }))
    .await
    .unwrap();

    assert_eq!(report.descriptors.len(), 1);
    assert_eq!(report.packs.len(), 1);
    assert_eq!(ids(&report.specs), vec!["lint"]);
    assert_eq!(report.error_count(), 0);
}

#[tokio::test]
async fn specs_are_partitioned_by_enablement_and_version() {
    let tmp = tempfile::tempdir().unwrap();
    let scan = tmp.path().join("plugins");
    write_package(
        &scan.join("toolkit"),
        json!({
            "name": "toolkit",
            "version": "1.0.0",
            "engines": {"plinth": "^1.2"},
            "plinth": {"specs": [
                {"id": "lint", "settings": {"enabled": true, "level": "warn"}},
                {"id": "fmt", "settings": {"enabled": true, "width": 100}},
                {"id": "legacy", "engine": "<1", "settings": {"mode": "old"}}
            ]}
        }),
    );

    let report = discover(json!({
        "pkg": {"version": "1.5.0"},
        "plugins": {"directories": [scan]},
        "fmt": {"enabled": false}
    }))
    .await
    .unwrap();

    assert_eq!(ids(&report.specs), vec!["lint"]);
    assert_eq!(ids(&report.disabled_specs), vec!["fmt", "legacy"]);
    assert_eq!(ids(&report.invalid_version_specs), vec!["legacy"]);

    let config = report.extended_config.as_ref().unwrap().read().await;
    assert_eq!(config.get_str("lint.level"), Some("warn"));
    assert!(!config.contains("fmt"));
    assert!(!config.contains("legacy"));
    drop(config);

    let summary = report.summary().await;
    let legacy = summary.specs.iter().find(|s| s.id == "legacy").unwrap();
    assert_eq!(legacy.state, SpecState::InvalidVersion);
}

#[tokio::test]
async fn enablement_sees_contributions_from_other_packages() {
    let tmp = tempfile::tempdir().unwrap();
    let scan = tmp.path().join("plugins");
    write_package(
        &scan.join("a-provider"),
        json!({"name": "a-provider", "plinth": {"specs": [
            {"id": "provider", "settings": {"ready": true}}
        ]}}),
    );
    write_package(
        &scan.join("b-consumer"),
        json!({"name": "b-consumer", "plinth": {"specs": [
            {"id": "consumer", "enabledBy": "provider.ready", "settings": {"hooked": true}},
            {"id": "orphan", "enabledBy": "missing.provider", "settings": {"hooked": true}}
        ]}}),
    );

    let report = discover(json!({
        "plugins": {"directories": [scan]},
        "missing": {"provider": false}
    }))
    .await
    .unwrap();

    assert_eq!(ids(&report.specs), vec!["consumer", "provider"]);
    assert_eq!(ids(&report.disabled_specs), vec!["orphan"]);
    let config = report.extended_config.as_ref().unwrap().read().await;
    assert_eq!(config.get_bool("consumer.hooked"), Some(true));
    assert!(!config.contains("orphan"));
}

#[tokio::test]
async fn duplicate_ids_abort_without_touching_the_config() {
    let tmp = tempfile::tempdir().unwrap();
    let scan = tmp.path().join("plugins");
    let first = write_package(
        &scan.join("first"),
        json!({"name": "first", "plinth": {"specs": [{"id": "lint", "settings": {"x": 1}}]}}),
    );
    let second = write_package(
        &scan.join("second"),
        json!({"name": "second", "plinth": {"specs": [{"id": "lint", "settings": {"x": 2}}]}}),
    );

    let mut supplied = ConfigService::new();
    supplied
        .set("plugins.directories", json!([scan.clone()]))
        .unwrap();
    let shared = supplied.into_shared();
    let (task, channels) = PluginDiscovery::new(
        ConfigSource::with_config(Settings::new(), shared.clone()),
        FsPackageLocator::new(),
        ManifestPackSynthesizer::new(),
    )
    .start();

    let err = DiscoveryReport::collect(task, channels).await.unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));
    let message = err.to_string();
    assert!(message.contains(&format!("lint ({})", first.display())), "{message}");
    assert!(message.contains(&format!("lint ({})", second.display())), "{message}");
    assert!(!shared.read().await.contains("lint"));
}

#[tokio::test]
async fn nothing_configured_emits_only_the_config() {
    let report = discover(json!({})).await.unwrap();

    assert!(report.descriptors.is_empty());
    assert!(report.packs.is_empty());
    assert!(report.specs.is_empty());
    assert!(report.disabled_specs.is_empty());
    assert!(report.deprecations.is_empty());
    assert_eq!(report.error_count(), 0);

    let config = report.extended_config.unwrap();
    let config = config.read().await;
    assert_eq!(config.get_str("pkg.name"), Some("plinth"));
}

#[tokio::test]
async fn errors_are_reported_per_item() {
    let tmp = tempfile::tempdir().unwrap();
    let scan = tmp.path().join("plugins");
    write_package(&scan.join("not-a-plugin"), json!({"name": "not-a-plugin"}));
    std::fs::create_dir_all(scan.join("broken")).unwrap();
    std::fs::write(scan.join("broken").join(PACKAGE_MANIFEST), "{").unwrap();
    write_package(
        &scan.join("good"),
        json!({"name": "good", "plinth": {"specs": [{"id": "good"}]}}),
    );

    let report = discover(json!({
        "plugins": {"directories": [scan, tmp.path().join("does-not-exist")]}
    }))
    .await
    .unwrap();

    assert_eq!(report.invalid_directory_errors.len(), 1);
    assert_eq!(report.invalid_pack_errors.len(), 2);
    assert!(report.other_errors.is_empty());
    assert_eq!(ids(&report.specs), vec!["good"]);
}

#[tokio::test]
async fn renamed_settings_produce_deprecations() {
    let tmp = tempfile::tempdir().unwrap();
    let pkg = write_package(
        &tmp.path().join("lint"),
        json!({"name": "lint", "plinth": {"specs": [
            {"id": "lint", "settings": {"level": "warn"}, "renamed": {"severity": "level"}}
        ]}}),
    );

    let report = discover(json!({
        "pluginPaths": [pkg],
        "lint": {"severity": "error"}
    }))
    .await
    .unwrap();

    assert_eq!(report.deprecations.len(), 1);
    assert_eq!(report.deprecations[0].spec.id(), "lint");
    let config = report.extended_config.as_ref().unwrap().read().await;
    assert_eq!(config.get_str("lint.level"), Some("error"));
}
