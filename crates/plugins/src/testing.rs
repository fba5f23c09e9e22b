//! In-memory collaborators for unit tests.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    pin::Pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use {
    anyhow::bail,
    async_trait::async_trait,
    futures::{Stream, stream},
    plinth_config::ConfigService,
    serde_json::Value,
};

use crate::{
    error::Error,
    locate::{LocateTarget, PackageLocator},
    spec::{ExtendContext, ModuleSpec},
    synth::PackSynthesizer,
    types::{DescriptorResult, Pack, PackResult, PackageDescriptor, PackageManifest},
};

/// A module spec whose routines are scripted by the test.
#[derive(Debug)]
pub(crate) struct FakeSpec {
    id: String,
    path: PathBuf,
    range: String,
    contributes: Vec<(String, Value)>,
    copies: Vec<(String, String)>,
    requires: Option<String>,
    deprecations: Vec<String>,
    fail_extend: bool,
    disables: Arc<AtomicUsize>,
}

impl FakeSpec {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            path: PathBuf::from(format!("/fake/{id}")),
            range: "*".into(),
            contributes: Vec::new(),
            copies: Vec::new(),
            requires: None,
            deprecations: Vec::new(),
            fail_extend: false,
            disables: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn at(mut self, path: &str) -> Self {
        self.path = PathBuf::from(path);
        self
    }

    pub fn range(mut self, range: &str) -> Self {
        self.range = range.into();
        self
    }

    /// Set `key` while extending; remove it when disabled.
    pub fn contribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.contributes.push((key.into(), value.into()));
        self
    }

    /// Copy whatever is at `from` to `to` while extending.
    pub fn copy_from(mut self, from: &str, to: &str) -> Self {
        self.copies.push((from.into(), to.into()));
        self
    }

    /// Enabled only while `key` is `true`.
    pub fn requires(mut self, key: &str) -> Self {
        self.requires = Some(key.into());
        self
    }

    pub fn deprecation(mut self, message: &str) -> Self {
        self.deprecations.push(message.into());
        self
    }

    pub fn failing_extend(mut self) -> Self {
        self.fail_extend = true;
        self
    }

    /// How many times the disable routine ran.
    pub fn disable_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.disables)
    }

    pub fn arc(self) -> Arc<dyn ModuleSpec> {
        Arc::new(self)
    }
}

#[async_trait]
impl ModuleSpec for FakeSpec {
    fn id(&self) -> &str {
        &self.id
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn version_range(&self) -> &str {
        &self.range
    }

    async fn extend_config(&self, cx: &mut ExtendContext<'_>) -> anyhow::Result<()> {
        if self.fail_extend {
            bail!("{} cannot extend", self.id);
        }
        for (key, value) in &self.contributes {
            cx.config_mut().set(key, value.clone())?;
        }
        for (from, to) in &self.copies {
            let value = cx.config().get(from).cloned().unwrap_or(Value::Null);
            cx.config_mut().set(to, value)?;
        }
        for message in &self.deprecations {
            cx.deprecate(message.clone());
        }
        Ok(())
    }

    async fn disable_config(&self, config: &mut ConfigService) -> anyhow::Result<()> {
        self.disables.fetch_add(1, Ordering::SeqCst);
        for (key, _) in &self.contributes {
            config.remove(key);
        }
        for (_, to) in &self.copies {
            config.remove(to);
        }
        Ok(())
    }

    async fn is_enabled(&self, config: &ConfigService) -> bool {
        self.requires
            .as_deref()
            .is_none_or(|key| config.get_bool(key) == Some(true))
    }
}

pub(crate) fn descriptor(name: &str) -> PackageDescriptor {
    PackageDescriptor {
        directory_path: PathBuf::from(format!("/fake/packages/{name}")),
        manifest: PackageManifest {
            name: name.into(),
            version: Some("1.0.0".into()),
            ..Default::default()
        },
    }
}

/// Yields scripted results for each target, once.
#[derive(Default)]
pub(crate) struct FakeLocator {
    results: Mutex<HashMap<LocateTarget, Vec<DescriptorResult>>>,
    calls: Arc<AtomicUsize>,
}

impl FakeLocator {
    pub fn with(self, target: LocateTarget, results: Vec<DescriptorResult>) -> Self {
        if let Ok(mut map) = self.results.lock() {
            map.insert(target, results);
        }
        self
    }

    /// Counts `locate` calls; stays readable after the locator is moved.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl PackageLocator for FakeLocator {
    fn locate(
        &self,
        target: LocateTarget,
    ) -> Pin<Box<dyn Stream<Item = DescriptorResult> + Send + '_>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let results = self
            .results
            .lock()
            .ok()
            .and_then(|mut map| map.remove(&target))
            .unwrap_or_default();
        Box::pin(stream::iter(results))
    }
}

/// Builds packs from a fixed table of package name → specs; unknown packages
/// are invalid packs.
#[derive(Default)]
pub(crate) struct FakeSynthesizer {
    packs: HashMap<String, Vec<Arc<dyn ModuleSpec>>>,
}

impl FakeSynthesizer {
    pub fn with(mut self, name: &str, specs: Vec<Arc<dyn ModuleSpec>>) -> Self {
        self.packs.insert(name.into(), specs);
        self
    }
}

#[async_trait]
impl PackSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, descriptor: PackageDescriptor) -> PackResult {
        let Some(specs) = self.packs.get(&descriptor.manifest.name) else {
            return Err(Error::invalid_pack(
                &descriptor.directory_path,
                "not a plugin package",
            ));
        };
        Ok(Pack {
            name: descriptor.manifest.name,
            version: descriptor.manifest.version,
            directory_path: descriptor.directory_path,
            specs: specs.clone(),
        })
    }
}
