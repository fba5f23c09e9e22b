use std::{fmt, sync::Arc};

use {
    plinth_config::{Settings, SharedConfig},
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result, SpecStage},
    spec::{ExtendContext, ModuleSpec},
    types::Deprecation,
};

/// A spec that has contributed to the configuration, with the deprecation
/// notices it raised while doing so.
#[derive(Clone)]
pub struct ExtendedSpec {
    pub spec: Arc<dyn ModuleSpec>,
    pub deprecations: Vec<String>,
}

impl fmt::Debug for ExtendedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedSpec")
            .field("spec", &self.spec.id())
            .field("deprecations", &self.deprecations)
            .finish()
    }
}

/// Let every spec extend the shared configuration.
///
/// The write lock is held for the whole stage, so nothing can observe a
/// partially extended configuration. `on_deprecation` fires as soon as each
/// spec finishes. The first failing spec aborts the stage.
pub async fn extend_specs<F>(
    specs: Vec<Arc<dyn ModuleSpec>>,
    config: &SharedConfig,
    settings: &Settings,
    mut on_deprecation: F,
) -> Result<Vec<ExtendedSpec>>
where
    F: FnMut(Deprecation),
{
    let mut config = config.write().await;
    let mut extended = Vec::with_capacity(specs.len());

    for spec in specs {
        let mut cx = ExtendContext::new(&mut config, settings);
        spec.extend_config(&mut cx)
            .await
            .map_err(|e| Error::spec_routine(spec.id(), SpecStage::Extend, e))?;
        let deprecations = cx.into_deprecations();

        for message in &deprecations {
            warn!(id = spec.id(), %message, "module spec deprecation");
            on_deprecation(Deprecation {
                spec: Arc::clone(&spec),
                message: message.clone(),
            });
        }
        extended.push(ExtendedSpec { spec, deprecations });
    }

    debug!(count = extended.len(), "extended configuration");
    Ok(extended)
}
