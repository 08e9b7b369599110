//! Embed loaders.
//!
//! A loader claims embed urls by pattern and turns the loaded file into a
//! tree fragment. The embed transform tries loaders in order and uses the
//! first match.

use std::rc::Rc;
use std::sync::LazyLock;

use md2docx_storage::SourceFile;
use regex::Regex;

use crate::cursor::Cursor;
use crate::error::TransformError;
use crate::visitor::VisitContext;

/// Turns an embedded file into nodes.
pub trait Loader {
    /// Whether this loader handles `url`.
    fn test(&self, url: &str) -> bool;

    /// Build a tree fragment from `file`. The returned cursor is the fragment
    /// root; its children replace the embed directive.
    fn transform(
        &self,
        file: Rc<SourceFile>,
        cx: &mut VisitContext<'_>,
    ) -> Result<Cursor, TransformError>;
}

static MARKDOWN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.md$").unwrap());

/// Embeds other markdown files, parsed with the document's parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownLoader;

impl Loader for MarkdownLoader {
    fn test(&self, url: &str) -> bool {
        MARKDOWN_RE.is_match(url)
    }

    fn transform(
        &self,
        file: Rc<SourceFile>,
        cx: &mut VisitContext<'_>,
    ) -> Result<Cursor, TransformError> {
        cx.parse(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_pattern() {
        let loader = MarkdownLoader;
        assert!(loader.test("./chapters/intro.md"));
        assert!(!loader.test("diagram.mmd"));
        assert!(!loader.test("notes.md.bak"));
    }
}
