//! Markdown tree and transform passes for md2docx.
//!
//! Source files are parsed into an arena [`Tree`] whose nodes carry a
//! [`NodeKind`] and a free-form [`Data`] side channel. A [`Cursor`] points
//! at a node together with its parent and the file it came from, and the
//! visitor engine walks cursors depth-first, offering each node to a list of
//! [`Visitor`]s that may rewrite the tree as they go.
//!
//! # Architecture
//!
//! - [`MarkdownParser`]: `CommonMark` via `pulldown-cmark`, plus directive
//!   syntax and `+++` TOML blocks
//! - [`VisitContext`] / [`process`]: the visitor engine
//! - [`transform`]: `attr`, `caption`, `table` and `embed` directives, image loading
//! - [`Loader`]: plug-ins that turn embedded files into tree fragments
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use std::rc::Rc;
//! use md2docx_markdown::{MarkdownLoader, MarkdownParser, process, transform};
//! use md2docx_storage::FsStore;
//!
//! let store = FsStore::new();
//! let entry = store.load("index.md", Path::new("docs"))?;
//! let visitors = transform::default_visitors(vec![Rc::new(MarkdownLoader)]);
//! let (tree, root) = process(entry, &store, &MarkdownParser::new(), visitors)?;
//! ```

mod cursor;
mod directive;
mod error;
mod fence;
mod loader;
mod node;
mod parse;
mod printer;
pub mod transform;
mod tree;
mod visitor;

pub use cursor::Cursor;
pub use error::TransformError;
pub use loader::{Loader, MarkdownLoader};
pub use node::{Data, Directive, ImageData, ImageMeta, Node, NodeId, NodeKind};
pub use parse::{MarkdownParser, Parser};
pub use printer::print_tree;
pub use tree::Tree;
pub use visitor::{Visit, VisitContext, Visitor, process};
