//! Structural compiler for md2docx.
//!
//! Turns a transformed markdown tree into a [`md2docx_docx::Document`]:
//! headings and lists with numbering, captions and cross-references backed
//! by shared text cells, table layout, and image sizing.
//!
//! [`Converter`] runs the whole pipeline for a project on a file store:
//! configuration, parsing, directive transforms with embed loaders, and
//! compilation.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use md2docx_compiler::Converter;
//! use md2docx_storage::FsStore;
//!
//! let store = FsStore::new();
//! let bytes = Converter::new(&store).convert_to_bytes("index.md", Path::new("docs"))?;
//! std::fs::write("out.docx", bytes)?;
//! ```

mod compiler;
mod convert;
mod error;
mod image;
mod state;

pub use compiler::Compiler;
pub use convert::Converter;
pub use error::CompileError;
pub use image::{EMU_PER_PIXEL, fit_image};
pub use state::State;
