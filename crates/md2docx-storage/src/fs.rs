//! Filesystem store implementation.
//!
//! Provides [`FsStore`] for reading and writing project files on the local
//! filesystem.

use std::fs;
use std::path::Path;

use crate::storage::{FileStore, SourceFile, StorageError};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem store.
///
/// Stateless: every call resolves `cwd.join(path)` and touches the disk.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use md2docx_storage::{FileStore, FsStore};
///
/// let store = FsStore::new();
/// store.save(".cache/logo.png", &bytes, Path::new("docs"))?;
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl FsStore {
    /// Create a new filesystem store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FileStore for FsStore {
    fn load(&self, path: &str, cwd: &Path) -> Result<SourceFile, StorageError> {
        let full = cwd.join(path);
        tracing::debug!(path = %full.display(), "Loading file");
        let value = fs::read(&full)
            .map_err(|e| StorageError::io(e, Some(full.clone())).with_backend(BACKEND))?;
        Ok(SourceFile::new(path, cwd, value))
    }

    fn save(&self, path: &str, value: &[u8], cwd: &Path) -> Result<(), StorageError> {
        let full = cwd.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::io(e, Some(parent.to_path_buf())).with_backend(BACKEND))?;
        }
        tracing::debug!(path = %full.display(), bytes = value.len(), "Saving file");
        fs::write(&full, value)
            .map_err(|e| StorageError::io(e, Some(full.clone())).with_backend(BACKEND))
    }
}
