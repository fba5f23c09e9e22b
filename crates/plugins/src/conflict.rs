//! Duplicate spec id detection, run once every pack is synthesized.

use std::{collections::BTreeMap, sync::Arc};

use tracing::{debug, warn};

use crate::{
    error::{Error, Result, SpecConflict},
    spec::ModuleSpec,
};

/// Fail when more than one spec claims the same id.
///
/// Needs the complete spec set. On success the specs are returned unchanged,
/// in the order given.
pub fn detect_conflicts(specs: Vec<Arc<dyn ModuleSpec>>) -> Result<Vec<Arc<dyn ModuleSpec>>> {
    let mut by_id: BTreeMap<&str, Vec<&Arc<dyn ModuleSpec>>> = BTreeMap::new();
    for spec in &specs {
        by_id.entry(spec.id()).or_default().push(spec);
    }

    let conflicts: Vec<SpecConflict> = by_id
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|(id, group)| SpecConflict {
            id: id.to_string(),
            paths: group.iter().map(|s| s.path().to_path_buf()).collect(),
        })
        .collect();

    if !conflicts.is_empty() {
        let err = Error::Conflict { conflicts };
        warn!(error = %err, "aborting plugin discovery");
        return Err(err);
    }

    debug!(count = specs.len(), "module spec ids are unique");
    Ok(specs)
}
