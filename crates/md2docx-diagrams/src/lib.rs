//! Diagram loaders for md2docx.
//!
//! Diagram sources embedded with `::embed{url=flow.mmd}` are sent to a
//! [Kroki](https://kroki.io) server and come back as PNG images, which the
//! loader wraps in a one-image paragraph.
//!
//! # Example
//!
//! ```ignore
//! use md2docx_diagrams::{MermaidLoader, resolve_endpoint};
//!
//! let loader = MermaidLoader::new(resolve_endpoint(None, None));
//! ```

mod kroki;
mod mermaid;

pub use kroki::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, DiagramError, create_agent, render, resolve_endpoint};
pub use mermaid::MermaidLoader;
