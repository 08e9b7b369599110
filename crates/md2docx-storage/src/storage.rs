//! File-store trait and error types.
//!
//! Provides the core [`FileStore`] trait for loading and saving project files,
//! the [`SourceFile`] handle it returns, and [`StorageError`] for unified error
//! handling across backends.

use std::path::{Component, Path, PathBuf};

/// A file loaded from a [`FileStore`].
///
/// `path` is kept exactly as requested and `cwd` is the directory it was
/// resolved against, so nested loads can reuse the same working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as requested, relative to `cwd`.
    pub path: String,
    /// Working directory the path was resolved against.
    pub cwd: PathBuf,
    /// Raw file contents.
    pub value: Vec<u8>,
}

impl SourceFile {
    /// Create a file handle from its parts.
    #[must_use]
    pub fn new(path: impl Into<String>, cwd: impl Into<PathBuf>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            cwd: cwd.into(),
            value: value.into(),
        }
    }

    /// Full location of the file (`cwd` joined with `path`, lexically normalized).
    #[must_use]
    pub fn location(&self) -> PathBuf {
        normalize(&self.cwd.join(&self.path))
    }

    /// Contents decoded as UTF-8.
    pub fn text(&self) -> Result<&str, StorageError> {
        std::str::from_utf8(&self.value).map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidContent)
                .with_path(self.location())
                .with_source(e)
        })
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component where possible.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Invalid path or identifier.
    InvalidPath,
    /// Content could not be decoded.
    InvalidContent,
    /// Remote backend is unavailable.
    Unavailable,
    /// Operation timed out.
    Timeout,
    /// Other/unknown error category.
    Other,
}

/// Retry guidance.
#[derive(Debug, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (not found, invalid path).
    #[default]
    Permanent,
    /// Retry immediately (timeout, connection reset).
    Temporary,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Memory").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Returns `true` if the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => StorageErrorKind::Timeout,
            _ => StorageErrorKind::Other,
        };
        let status = match err.kind() {
            std::io::ErrorKind::TimedOut => ErrorStatus::Temporary,
            _ => ErrorStatus::Permanent,
        };
        let mut error = Self::new(kind).with_status(status).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::InvalidPath => "Invalid path",
            StorageErrorKind::InvalidContent => "Invalid content",
            StorageErrorKind::Unavailable => "Unavailable",
            StorageErrorKind::Timeout => "Timeout",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// File access used by the pipeline.
///
/// Both operations resolve `path` against `cwd`. Implementations must not
/// interpret `path` any further (no globbing, no URL handling).
pub trait FileStore {
    /// Load a file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file doesn't exist or can't be read.
    fn load(&self, path: &str, cwd: &Path) -> Result<SourceFile, StorageError>;

    /// Save a file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file can't be written.
    fn save(&self, path: &str, value: &[u8], cwd: &Path) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_cur_dir() {
        assert_eq!(normalize(Path::new("docs/./sub.md")), PathBuf::from("docs/sub.md"));
    }

    #[test]
    fn test_normalize_folds_parent_dir() {
        assert_eq!(normalize(Path::new("docs/a/../b.md")), PathBuf::from("docs/b.md"));
        assert_eq!(normalize(Path::new("../b.md")), PathBuf::from("../b.md"));
    }

    #[test]
    fn test_source_file_location() {
        let file = SourceFile::new("./sub.md", "docs", "x");
        assert_eq!(file.location(), PathBuf::from("docs/sub.md"));
    }

    #[test]
    fn test_source_file_invalid_utf8() {
        let file = SourceFile::new("bin.md", ".", vec![0xff, 0xfe]);
        let err = file.text().unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::InvalidContent);
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("docs/missing.md").with_backend("Fs");
        assert_eq!(err.to_string(), "[Fs] Not found (path: docs/missing.md)");
    }

    #[test]
    fn test_io_error_kind_mapping() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        let err = StorageError::io(io, None);
        assert_eq!(err.kind, StorageErrorKind::Timeout);
        assert_eq!(err.status, ErrorStatus::Temporary);
    }
}
