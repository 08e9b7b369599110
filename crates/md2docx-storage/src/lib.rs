//! File-store abstraction for the md2docx pipeline.
//!
//! Everything the pipeline reads or writes (the entry document, embedded
//! sub-documents, images, cached remote assets) goes through a [`FileStore`].
//! Paths are always resolved against an explicit working directory, so the
//! same store can serve a whole project tree.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`FileStore`] trait with `load()` and `save()` methods
//! - [`FsStore`] implementation backed by the local filesystem
//! - [`MemoryStore`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use md2docx_storage::{FileStore, FsStore};
//!
//! let store = FsStore::new();
//! let file = store.load("index.md", Path::new("docs"))?;
//! println!("{} bytes from {}", file.value.len(), file.location().display());
//! ```

mod fs;
#[cfg(any(test, feature = "mock"))]
mod memory;
mod storage;

pub use fs::FsStore;
#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryStore;
pub use storage::{ErrorStatus, FileStore, SourceFile, StorageError, StorageErrorKind, normalize};
