use std::{
    error::Error as StdError,
    fmt,
    path::{Path, PathBuf},
};

use {plinth_common::FromMessage, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] plinth_config::Error),

    #[error("invalid plugin directory {}: {reason}", .path.display())]
    InvalidDirectory { path: PathBuf, reason: String },

    #[error("invalid plugin package at {}: {reason}", .path.display())]
    InvalidPack { path: PathBuf, reason: String },

    #[error("{}", describe_conflicts(.conflicts))]
    Conflict { conflicts: Vec<SpecConflict> },

    #[error("module spec '{id}' failed to {stage}: {source}")]
    SpecRoutine {
        id: String,
        stage: SpecStage,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("{message}")]
    Message { message: String },
}

/// Several module specs declaring the same id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecConflict {
    pub id: String,
    pub paths: Vec<PathBuf>,
}

impl fmt::Display for SpecConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let declared: Vec<String> = self
            .paths
            .iter()
            .map(|p| format!("{} ({})", self.id, p.display()))
            .collect();
        write!(f, "{}", declared.join(", "))
    }
}

fn describe_conflicts(conflicts: &[SpecConflict]) -> String {
    let groups: Vec<String> = conflicts.iter().map(ToString::to_string).collect();
    format!(
        "module spec ids must be unique, found conflicting specs: {}",
        groups.join("; ")
    )
}

/// Which module-spec routine failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecStage {
    Extend,
    Disable,
}

impl fmt::Display for SpecStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extend => f.write_str("extend configuration"),
            Self::Disable => f.write_str("disable configuration"),
        }
    }
}

impl Error {
    #[must_use]
    pub fn invalid_directory(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidDirectory {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn invalid_pack(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidPack {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn spec_routine(id: &str, stage: SpecStage, source: anyhow::Error) -> Self {
        Self::SpecRoutine {
            id: id.to_string(),
            stage,
            source: source.into(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

plinth_common::impl_context!();
