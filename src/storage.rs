//! Uploaded artifact storage
//!
//! Artifacts live as plain files in a single upload directory. The
//! client-supplied file name is reduced to its last path component before use.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating the upload directory if needed
    pub fn new<P: Into<PathBuf>>(root: P) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_error(&root, e))?;
        Ok(ArtifactStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under the sanitized `file_name`, replacing any previous
    /// artifact with the same name. Returns the stored path.
    pub fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let name = sanitize_file_name(file_name)
            .ok_or_else(|| StorageError::InvalidFileName(file_name.to_string()))?;
        let path = self.root.join(name);
        fs::write(&path, bytes).map_err(|e| io_error(&path, e))?;
        Ok(path)
    }

    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>, StorageError> {
        let path = path.as_ref();
        fs::read(path).map_err(|e| io_error(path, e))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io { path: path.to_path_buf(), source }
}

/// Last component of a client-supplied path, or None if nothing usable remains
pub fn sanitize_file_name(raw: &str) -> Option<&str> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();
    match name {
        "" | "." | ".." => None,
        n if n.contains('\0') => None,
        n => Some(n),
    }
}
