//! Suppression of repeated locator results.
//!
//! Several configured paths and scan directories can reach the same package
//! (overlapping scans, symlinks, a path listed twice). Only the first result
//! for each distinct key passes; later ones are dropped without being
//! reported.

use std::{collections::HashSet, path::PathBuf};

use {
    futures::{Stream, StreamExt, future},
    tracing::debug,
};

#[cfg(feature = "metrics")]
use plinth_metrics::{counter, discovery as discovery_metrics};

use crate::types::DescriptorResult;

/// What two locator results must share to count as the same result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DistinctKey {
    /// The rendered error message.
    Error(String),
    /// The canonical package directory.
    Directory(PathBuf),
    /// Never equal to anything; the result always passes.
    Unique,
}

/// Compute the key a result is deduplicated on.
///
/// A descriptor whose directory cannot be canonicalized is keyed
/// [`DistinctKey::Unique`].
pub async fn distinct_key(result: &DescriptorResult) -> DistinctKey {
    match result {
        Err(error) => DistinctKey::Error(error.to_string()),
        Ok(descriptor) => match tokio::fs::canonicalize(&descriptor.directory_path).await {
            Ok(path) => DistinctKey::Directory(path),
            Err(e) => {
                debug!(
                    path = %descriptor.directory_path.display(),
                    error = %e,
                    "cannot canonicalize package directory, keeping result"
                );
                DistinctKey::Unique
            },
        },
    }
}

/// Pass through the first result for each [`DistinctKey`], in arrival order.
pub fn dedupe<'a, S>(results: S) -> impl Stream<Item = DescriptorResult> + Send + 'a
where
    S: Stream<Item = DescriptorResult> + Send + 'a,
{
    let mut seen = HashSet::new();
    results
        .then(|result| async move {
            let key = distinct_key(&result).await;
            (key, result)
        })
        .filter_map(move |(key, result)| {
            let fresh = key == DistinctKey::Unique || seen.insert(key);
            if !fresh {
                debug!("dropping duplicate discovery result");
                #[cfg(feature = "metrics")]
                counter!(discovery_metrics::DUPLICATES_TOTAL).increment(1);
            }
            future::ready(fresh.then_some(result))
        })
}
