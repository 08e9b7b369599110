//! Mermaid diagrams (`.mmd`, `.mermaid`) as embedded images.

use std::rc::Rc;
use std::sync::LazyLock;
use std::time::Duration;

use md2docx_markdown::{
    Cursor, ImageData, Loader, NodeKind, TransformError, VisitContext, transform::read_meta,
};
use md2docx_storage::SourceFile;
use regex::Regex;
use tracing::info;
use ureq::Agent;

use crate::kroki::{DEFAULT_TIMEOUT, create_agent, render};

static MERMAID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(mmd|mermaid)$").unwrap());

/// Renders Mermaid sources to PNG through Kroki.
///
/// The fragment is `root > paragraph > image`, with the PNG bytes already
/// attached to the image so no further loading happens.
pub struct MermaidLoader {
    endpoint: String,
    agent: Agent,
}

impl MermaidLoader {
    /// Create a loader talking to the Kroki server at `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent: create_agent(DEFAULT_TIMEOUT),
        }
    }

    /// Replace the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = create_agent(timeout);
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Loader for MermaidLoader {
    fn test(&self, url: &str) -> bool {
        MERMAID_RE.is_match(url)
    }

    fn transform(
        &self,
        file: Rc<SourceFile>,
        cx: &mut VisitContext<'_>,
    ) -> Result<Cursor, TransformError> {
        info!(path = %file.path, endpoint = %self.endpoint, "Rendering mermaid diagram");
        let png = render(&self.agent, &self.endpoint, "mermaid", "png", file.text()?).map_err(
            |e| TransformError::Loader {
                loader: "mermaid",
                source: Box::new(e),
            },
        )?;
        let meta = read_meta(&png).map_err(|source| TransformError::Image {
            url: file.path.clone(),
            source,
        })?;

        let root = cx.tree.alloc(NodeKind::Root);
        let paragraph = cx.tree.append_new(root, NodeKind::Paragraph);
        let image = cx.tree.append_new(
            paragraph,
            NodeKind::Image {
                url: file.path.clone(),
                alt: String::new(),
                title: None,
            },
        );
        cx.tree[image].data.image = Some(ImageData {
            contents: Rc::from(png),
            meta: Some(meta),
        });

        Ok(Cursor::root(root, file))
    }
}

#[cfg(test)]
mod tests {
    use md2docx_markdown::transform::EmbedTransform;
    use md2docx_markdown::{MarkdownParser, Visitor, process};
    use md2docx_storage::MemoryStore;

    use super::*;

    #[test]
    fn test_pattern() {
        let loader = MermaidLoader::new("http://kroki");
        assert!(loader.test("flow.mmd"));
        assert!(loader.test("./diagrams/seq.mermaid"));
        assert!(!loader.test("flow.md"));
        assert!(!loader.test("flow.mmd.txt"));
    }

    #[test]
    fn test_render_failure_is_a_loader_error() {
        let store = MemoryStore::new().with_file("/project/flow.mmd", "graph TD; A-->B");
        let loader = MermaidLoader::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2));
        let embed: Rc<dyn Visitor> = Rc::new(EmbedTransform::new(vec![Rc::new(loader)]));
        let entry = SourceFile::new("index.md", "/project", "::embed{url=flow.mmd}\n");

        let Err(err) = process(entry, &store, &MarkdownParser::new(), vec![embed]) else {
            panic!("expected a loader error");
        };

        assert!(matches!(err, TransformError::Loader { loader: "mermaid", .. }));
    }
}
