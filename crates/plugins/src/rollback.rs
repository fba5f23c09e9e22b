use {plinth_config::SharedConfig, tracing::debug};

use crate::{
    enablement::ClassifiedSpec,
    error::{Error, Result, SpecStage},
};

/// Run the disable routine of every disabled spec, including specs disabled
/// for an incompatible version. Returns how many were rolled back.
pub async fn rollback_disabled(classified: &[ClassifiedSpec], config: &SharedConfig) -> Result<usize> {
    let mut config = config.write().await;
    let mut rolled_back = 0;

    for spec in classified.iter().flat_map(ClassifiedSpec::disabled_specs) {
        spec.disable_config(&mut config)
            .await
            .map_err(|e| Error::spec_routine(spec.id(), SpecStage::Disable, e))?;
        debug!(id = spec.id(), "rolled back module spec configuration");
        rolled_back += 1;
    }

    Ok(rolled_back)
}
