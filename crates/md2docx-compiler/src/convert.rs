//! The `convert` pipeline: load, transform, compile.

use std::path::Path;
use std::rc::Rc;

use md2docx_config::{CONFIG_FILENAME, Config};
use md2docx_diagrams::{MermaidLoader, resolve_endpoint};
use md2docx_docx::Document;
use md2docx_markdown::{Loader, MarkdownLoader, MarkdownParser, process, transform};
use md2docx_storage::FileStore;
use tracing::info;

use crate::compiler::Compiler;
use crate::error::CompileError;

/// Converts a markdown project into a Word document.
///
/// Embeds are resolved by the markdown and Mermaid loaders, in that order,
/// followed by any loaders added with [`with_loader`](Self::with_loader).
pub struct Converter<'s> {
    store: &'s dyn FileStore,
    parser: MarkdownParser,
    kroki_url: Option<String>,
    loaders: Vec<Rc<dyn Loader>>,
}

impl<'s> Converter<'s> {
    #[must_use]
    pub fn new(store: &'s dyn FileStore) -> Self {
        Self {
            store,
            parser: MarkdownParser::new(),
            kroki_url: None,
            loaders: Vec::new(),
        }
    }

    /// Kroki endpoint taking precedence over `diagrams.krokiUrl`.
    #[must_use]
    pub fn kroki_url(mut self, url: Option<String>) -> Self {
        self.kroki_url = url;
        self
    }

    /// Add a loader after the built-in ones.
    #[must_use]
    pub fn with_loader(mut self, loader: Rc<dyn Loader>) -> Self {
        self.loaders.push(loader);
        self
    }

    /// Load `.docx.toml` from `cwd`; a missing file means defaults.
    pub fn load_config(&self, cwd: &Path) -> Result<Config, CompileError> {
        match self.store.load(CONFIG_FILENAME, cwd) {
            Ok(file) => {
                info!(path = %file.location().display(), "Loaded configuration");
                Ok(Config::load(file.text()?)?)
            }
            Err(e) if e.is_not_found() => {
                info!(cwd = %cwd.display(), "No {CONFIG_FILENAME}, using defaults");
                Ok(Config::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Convert the project whose entry document is `entry` in `cwd`.
    pub fn convert(&self, entry: &str, cwd: &Path) -> Result<Document, CompileError> {
        let config = self.load_config(cwd)?;
        let endpoint = resolve_endpoint(
            self.kroki_url.as_deref(),
            config.diagrams.kroki_url.as_deref(),
        );

        let mut loaders: Vec<Rc<dyn Loader>> = vec![
            Rc::new(MarkdownLoader),
            Rc::new(MermaidLoader::new(endpoint)),
        ];
        loaders.extend(self.loaders.iter().map(Rc::clone));

        let file = self.store.load(entry, cwd)?;
        let (tree, root) = process(
            file,
            self.store,
            &self.parser,
            transform::default_visitors(loaders),
        )?;

        let mut compiler = Compiler::new(&tree, &config);
        compiler.compile(root.node)?;
        Ok(compiler.into_document())
    }

    /// Convert and serialize to `.docx` bytes.
    pub fn convert_to_bytes(&self, entry: &str, cwd: &Path) -> Result<Vec<u8>, CompileError> {
        let document = self.convert(entry, cwd)?;
        Ok(document.to_bytes()?)
    }
}

#[cfg(test)]
mod tests {
    use md2docx_docx::Block;
    use md2docx_markdown::{Cursor, TransformError, VisitContext};
    use md2docx_storage::{MemoryStore, SourceFile};

    use super::*;
    use crate::compiler::test_support::paragraphs;
    use pretty_assertions::assert_eq;

    fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(a, b)| ((*a).to_owned(), (*b).to_owned()))
            .collect()
    }

    #[test]
    fn test_convert_with_embed_and_config() {
        let store = MemoryStore::new()
            .with_file(
                "docs/.docx.toml",
                "[caption.label]\nFigure = \"Figure\"\n\n[[numbering.heading.levels]]\ntext = \"%1\"\n",
            )
            .with_file("docs/index.md", "# Guide\n\n## Part\n\n::embed{url=./part.md}\n")
            .with_file("docs/part.md", "# Details\n\n::caption[Flow]{type=Figure}\n");

        let document = Converter::new(&store)
            .convert("index.md", Path::new("docs"))
            .unwrap();
        let blocks = &document.sections()[0].children;

        assert_eq!(
            paragraphs(blocks),
            owned(&[
                ("Title", "Guide"),
                ("Heading1", "Part"),
                ("Heading2", "Details"),
                ("caption", "Figure 1. Flow"),
            ])
        );
        let Block::Paragraph(details) = &blocks[2] else {
            panic!("expected a paragraph");
        };
        assert_eq!(details.numbering.as_ref().map(|n| n.level), Some(1));
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let store = MemoryStore::new();

        let config = Converter::new(&store).load_config(Path::new("docs")).unwrap();

        assert!(config.has_numbering("bullet"));
        assert!(!config.has_numbering("heading"));
    }

    #[test]
    fn test_malformed_config_is_fatal() {
        let store = MemoryStore::new()
            .with_file("docs/.docx.toml", "[page")
            .with_file("docs/index.md", "x");

        let result = Converter::new(&store).convert("index.md", Path::new("docs"));

        assert!(matches!(result, Err(CompileError::Config(_))));
    }

    #[test]
    fn test_missing_entry_is_fatal() {
        let store = MemoryStore::new();

        let result = Converter::new(&store).convert("index.md", Path::new("docs"));

        assert!(matches!(result, Err(CompileError::Storage(e)) if e.is_not_found()));
    }

    #[test]
    fn test_unresolved_embed_is_fatal() {
        let store = MemoryStore::new().with_file("docs/index.md", "::embed{url=./data.csv}\n");

        let result = Converter::new(&store).convert("index.md", Path::new("docs"));

        assert!(matches!(
            result,
            Err(CompileError::Transform(TransformError::UnresolvedEmbed { .. }))
        ));
    }

    /// Turns `.txt` files into a single paragraph of their text.
    struct TextLoader;

    impl Loader for TextLoader {
        fn test(&self, url: &str) -> bool {
            url.ends_with(".txt")
        }

        fn transform(
            &self,
            file: Rc<SourceFile>,
            cx: &mut VisitContext<'_>,
        ) -> Result<Cursor, TransformError> {
            let text = file.text()?.trim().to_owned();
            let root = cx.tree.alloc(md2docx_markdown::NodeKind::Root);
            let paragraph = cx.tree.append_new(root, md2docx_markdown::NodeKind::Paragraph);
            cx.tree.append_new(paragraph, md2docx_markdown::NodeKind::Text(text));
            Ok(Cursor::root(root, file))
        }
    }

    #[test]
    fn test_extra_loader_and_package() {
        let store = MemoryStore::new()
            .with_file("docs/index.md", "Intro\n\n::embed{url=./note.txt}\n")
            .with_file("docs/note.txt", "plain note\n");

        let bytes = Converter::new(&store)
            .with_loader(Rc::new(TextLoader))
            .convert_to_bytes("index.md", Path::new("docs"))
            .unwrap();

        assert_eq!(&bytes[..2], b"PK");
    }
}
