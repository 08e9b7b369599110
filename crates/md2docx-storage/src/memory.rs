//! In-memory store implementation for testing.
//!
//! Provides [`MemoryStore`] for unit testing without filesystem access.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::storage::{FileStore, SourceFile, StorageError, normalize};

/// Backend identifier for error messages.
const BACKEND: &str = "Memory";

/// In-memory store for testing.
///
/// Files are keyed by their normalized location (`cwd` joined with `path`),
/// so `load("./sub.md", ".")` and `load("sub.md", ".")` hit the same entry.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use md2docx_storage::{FileStore, MemoryStore};
///
/// let store = MemoryStore::new()
///     .with_file("index.md", "# Title\n\n::embed{url=./sub.md}")
///     .with_file("sub.md", "# Sub");
///
/// let file = store.load("sub.md", Path::new(".")).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RefCell<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at the given location.
    #[must_use]
    pub fn with_file(self, path: impl AsRef<Path>, value: impl Into<Vec<u8>>) -> Self {
        self.files
            .borrow_mut()
            .insert(normalize(path.as_ref()), value.into());
        self
    }

    /// Check whether a file exists at the given location.
    #[must_use]
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files.borrow().contains_key(&normalize(path.as_ref()))
    }
}

impl FileStore for MemoryStore {
    fn load(&self, path: &str, cwd: &Path) -> Result<SourceFile, StorageError> {
        let key = normalize(&cwd.join(path));
        let files = self.files.borrow();
        let value = files
            .get(&key)
            .ok_or_else(|| StorageError::not_found(&key).with_backend(BACKEND))?;
        Ok(SourceFile::new(path, cwd, value.clone()))
    }

    fn save(&self, path: &str, value: &[u8], cwd: &Path) -> Result<(), StorageError> {
        let key = normalize(&cwd.join(path));
        self.files.borrow_mut().insert(key, value.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageErrorKind;

    #[test]
    fn test_load_normalizes_location() {
        let store = MemoryStore::new().with_file("docs/sub.md", "# Sub");

        let file = store.load("./sub.md", Path::new("docs")).unwrap();

        assert_eq!(file.path, "./sub.md");
        assert_eq!(file.text().unwrap(), "# Sub");
    }

    #[test]
    fn test_load_missing() {
        let err = MemoryStore::new().load("nope.md", Path::new(".")).unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert_eq!(err.backend, Some("Memory"));
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        store.save(".cache/a", b"bytes", Path::new(".")).unwrap();

        assert!(store.contains(".cache/a"));
        assert_eq!(store.load(".cache/a", Path::new(".")).unwrap().value, b"bytes");
    }
}
