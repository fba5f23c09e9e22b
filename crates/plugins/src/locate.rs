//! Package location: turning configured paths and scan directories into
//! package descriptors.

use std::{
    path::{Path, PathBuf},
    pin::Pin,
};

use {futures::Stream, tracing::debug};

use crate::{
    error::Error,
    types::{DescriptorResult, PackageDescriptor},
};

/// Manifest file that marks a directory as a package.
pub const PACKAGE_MANIFEST: &str = "package.json";

/// A configured location to look for packages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocateTarget {
    /// A directory that is itself a package.
    Path(PathBuf),
    /// A directory whose children are packages.
    Directory(PathBuf),
}

/// Finds candidate packages.
pub trait PackageLocator: Send + Sync {
    /// Stream every descriptor (or error) found at `target`.
    fn locate(
        &self,
        target: LocateTarget,
    ) -> Pin<Box<dyn Stream<Item = DescriptorResult> + Send + '_>>;

    /// Whether `error` means a configured scan directory is unusable.
    fn is_invalid_directory_error(&self, error: &Error) -> bool {
        matches!(error, Error::InvalidDirectory { .. })
    }
}

/// Filesystem package locator.
///
/// A scan directory is searched one level deep for child directories holding
/// a manifest; `@scope` directories are searched one level further. Children
/// without a manifest are skipped.
pub struct FsPackageLocator {
    manifest_name: String,
}

impl FsPackageLocator {
    pub fn new() -> Self {
        Self {
            manifest_name: PACKAGE_MANIFEST.to_string(),
        }
    }

    /// Look for `name` instead of `package.json`.
    pub fn with_manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    async fn has_manifest(&self, dir: &Path) -> bool {
        tokio::fs::metadata(dir.join(&self.manifest_name))
            .await
            .is_ok_and(|m| m.is_file())
    }
}

impl Default for FsPackageLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageLocator for FsPackageLocator {
    fn locate(
        &self,
        target: LocateTarget,
    ) -> Pin<Box<dyn Stream<Item = DescriptorResult> + Send + '_>> {
        Box::pin(async_stream::stream! {
            let dir = match target {
                LocateTarget::Path(path) => {
                    yield read_descriptor(&path, &self.manifest_name).await;
                    return;
                },
                LocateTarget::Directory(dir) => dir,
            };

            let children = match child_dirs(&dir).await {
                Ok(children) => children,
                Err(e) => {
                    yield Err(Error::invalid_directory(&dir, e.to_string()));
                    return;
                },
            };
            debug!(dir = %dir.display(), count = children.len(), "scanning plugin directory");

            for child in children {
                if is_scope(&child) {
                    let scoped = match child_dirs(&child).await {
                        Ok(scoped) => scoped,
                        Err(e) => {
                            yield Err(Error::invalid_directory(&child, e.to_string()));
                            continue;
                        },
                    };
                    for package in scoped {
                        if self.has_manifest(&package).await {
                            yield read_descriptor(&package, &self.manifest_name).await;
                        }
                    }
                } else if self.has_manifest(&child).await {
                    yield read_descriptor(&child, &self.manifest_name).await;
                }
            }
        })
    }
}

fn is_scope(dir: &Path) -> bool {
    dir.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('@'))
}

/// Child directories of `dir` (following symlinks), sorted by path.
async fn child_dirs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

async fn read_descriptor(directory: &Path, manifest_name: &str) -> DescriptorResult {
    let manifest_path = directory.join(manifest_name);
    let raw = tokio::fs::read_to_string(&manifest_path)
        .await
        .map_err(|e| Error::invalid_pack(directory, format!("cannot read {manifest_name}: {e}")))?;
    let manifest = serde_json::from_str(&raw)
        .map_err(|e| Error::invalid_pack(directory, format!("invalid {manifest_name}: {e}")))?;
    Ok(PackageDescriptor {
        directory_path: directory.to_path_buf(),
        manifest,
    })
}
