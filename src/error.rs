//! Error types for log interpretation and artifact storage.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn a stored artifact into a report.
///
/// There is no partial-success mode: either a complete report is produced or
/// one of these is returned.
#[derive(Error, Debug)]
pub enum InterpretError {
    /// The artifact could not be opened (missing file, permissions, ...)
    #[error("Artifact unavailable: {}: {source}", .path.display())]
    ArtifactUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact was opened but reading it failed part way through
    #[error("Artifact unreadable: {source}")]
    ArtifactUnreadable {
        #[source]
        source: std::io::Error,
    },
}

impl InterpretError {
    pub fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InterpretError::ArtifactUnavailable { path: path.into(), source }
    }

    pub fn unreadable(source: std::io::Error) -> Self {
        InterpretError::ArtifactUnreadable { source }
    }
}

/// Errors from the on-disk upload directory.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid file name: '{0}'")]
    InvalidFileName(String),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
