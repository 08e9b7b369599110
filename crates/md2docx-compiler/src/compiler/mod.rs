//! Structural compiler: rewritten markdown tree to document model.
//!
//! Every node kind has exactly one handler, selected by an exhaustive match.
//! A handler produces zero or more [`Output`]s in source order. Block outputs
//! (paragraphs, tables) produced inside inline content are bubbled up to the
//! enclosing block level instead of being nested.
//!
//! Front matter at the top level of the tree starts a new page section;
//! everything else is appended to the current one.

mod table;

use std::rc::Rc;

use md2docx_config::numbering::{BULLET, HEADING, LIST};
use md2docx_config::style::Alignment;
use md2docx_config::{Config, Contracts};
use md2docx_docx::{
    Block, ComplexField, Document, ImageRun, Inline, NumberingRef, Paragraph, RunOptions,
    TextCell, TextRun, VertAlign,
};
use md2docx_markdown::{ImageData, NodeId, NodeKind, Tree};
use tracing::{debug, warn};

use crate::error::CompileError;
use crate::image::{EMU_PER_PIXEL, fit_image};
use crate::state::State;

const TITLE: &str = "Title";
const NORMAL_INDENT: &str = "normalIndent";
const LIST_PARAGRAPH: &str = "ListParagraph";
const CAPTION: &str = "caption";
const CODE_BLOCK: &str = "codeBlock";
const INLINE_CODE: &str = "inlineCode";
const HYPERLINK: &str = "hyperlink";

/// Metadata key carrying a caption's kind.
const CAPTION_TYPE: &str = "caption-type";

/// Deepest list level a numbering definition can hold.
const MAX_LIST_LEVEL: u8 = 8;

/// What a handler produces.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Output {
    Block(Block),
    Inline(Inline),
}

impl From<Paragraph> for Output {
    fn from(paragraph: Paragraph) -> Self {
        Self::Block(paragraph.into())
    }
}

/// Compiles one markdown tree into a [`Document`].
pub struct Compiler<'a> {
    tree: &'a Tree,
    config: &'a Config,
    document: Document,
    contracts: Contracts,
    state: State,
}

impl<'a> Compiler<'a> {
    /// Create a compiler over `tree` with the document-level `config`.
    ///
    /// The document starts with one section using `config` unchanged.
    #[must_use]
    pub fn new(tree: &'a Tree, config: &'a Config) -> Self {
        let mut document = Document::new(config.clone());
        document.add_section(config.clone());
        Self {
            tree,
            config,
            document,
            contracts: config.page.contracts(),
            state: State::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    #[must_use]
    pub fn into_document(self) -> Document {
        self.document
    }

    /// Compile the children of `root` into the document.
    pub fn compile(&mut self, root: NodeId) -> Result<(), CompileError> {
        let tree = self.tree;
        for &child in tree.children(root) {
            if let NodeKind::Toml(front_matter) = tree.kind(child) {
                self.start_section(front_matter)?;
                continue;
            }
            let blocks = settle(self.node(child, &RunOptions::default())?, NORMAL_INDENT);
            self.push(blocks);
        }
        debug!(
            sections = self.document.sections().len(),
            headings = self.state.heading(),
            "Compiled document"
        );
        Ok(())
    }

    fn start_section(&mut self, front_matter: &str) -> Result<(), CompileError> {
        let config = self.config.section(front_matter)?;
        self.contracts = config.page.contracts();
        debug!(
            orientation = config.page.size.orientation.as_str(),
            "Starting section"
        );
        if let Some(section) = self.document.current_section()
            && section.children.is_empty()
        {
            section.config = config;
        } else {
            self.document.add_section(config);
        }
        Ok(())
    }

    fn push(&mut self, blocks: Vec<Block>) {
        if let Some(section) = self.document.current_section() {
            section.children.extend(blocks);
        } else {
            self.document
                .add_section(self.config.clone())
                .children
                .extend(blocks);
        }
    }

    fn node(&mut self, id: NodeId, run: &RunOptions) -> Result<Vec<Output>, CompileError> {
        let tree = self.tree;
        let kind = tree.kind(id);
        match kind {
            NodeKind::Root | NodeKind::Blockquote => self.children(id, run),
            NodeKind::Heading { depth } => self.heading(id, *depth),
            NodeKind::Paragraph => self.paragraph(id),
            NodeKind::List { ordered, .. } => self.list(id, *ordered, 0),
            NodeKind::ListItem { .. } => self.list_item(id, false, 0),
            NodeKind::Table => self.table(id),
            NodeKind::Text(text) => Ok(vec![text_run(text, run.clone())]),
            NodeKind::Strong => self.children(
                id,
                &RunOptions {
                    bold: true,
                    ..run.clone()
                },
            ),
            NodeKind::Emphasis => self.children(
                id,
                &RunOptions {
                    italics: true,
                    ..run.clone()
                },
            ),
            NodeKind::Delete => self.children(
                id,
                &RunOptions {
                    strike: true,
                    ..run.clone()
                },
            ),
            NodeKind::InlineCode(code) => Ok(vec![text_run(
                code,
                RunOptions {
                    style: Some(INLINE_CODE.to_owned()),
                    ..run.clone()
                },
            )]),
            NodeKind::Code { value, .. } => Ok(vec![code_block(value).into()]),
            NodeKind::Image { url, .. } => Ok(self.image(id, url)),
            NodeKind::Link { url, .. } => self.link(id, url, run),
            NodeKind::Html(html) if is_line_break(html) => Ok(vec![Output::Inline(Inline::Break)]),
            NodeKind::Break => Ok(vec![Output::Inline(Inline::Break)]),
            NodeKind::ThematicBreak => Ok(Vec::new()),
            NodeKind::TextDirective(directive) if directive.name == "sub" => self.children(
                id,
                &RunOptions {
                    vert_align: Some(VertAlign::Subscript),
                    ..run.clone()
                },
            ),
            NodeKind::TextDirective(directive) if directive.name == "sup" => self.children(
                id,
                &RunOptions {
                    vert_align: Some(VertAlign::Superscript),
                    ..run.clone()
                },
            ),
            NodeKind::Toml(_) => {
                debug!("Ignoring front matter below the top level");
                Ok(Vec::new())
            }
            NodeKind::Html(_)
            | NodeKind::TableRow
            | NodeKind::TableCell
            | NodeKind::FootnoteReference(_)
            | NodeKind::FootnoteDefinition(_)
            | NodeKind::TextDirective(_)
            | NodeKind::LeafDirective(_)
            | NodeKind::ContainerDirective(_) => {
                warn!(kind = kind.name(), "Unsupported node dropped");
                Ok(Vec::new())
            }
        }
    }

    fn children(&mut self, id: NodeId, run: &RunOptions) -> Result<Vec<Output>, CompileError> {
        let tree = self.tree;
        let mut outputs = Vec::new();
        for &child in tree.children(id) {
            outputs.extend(self.node(child, run)?);
        }
        Ok(outputs)
    }

    /// Title for depth 1, numbered outline heading otherwise.
    ///
    /// Every heading closes the current list numbering scope; titles also
    /// open a new heading numbering scope.
    fn heading(&mut self, id: NodeId, depth: u8) -> Result<Vec<Output>, CompileError> {
        self.state.next_list();
        let (blocks, inlines) = split(self.children(id, &RunOptions::default())?);

        let mut paragraph = Paragraph::new(inlines);
        if depth <= 1 {
            self.state.next_heading();
            paragraph.style = Some(TITLE.to_owned());
        } else {
            let level = (depth - 2).min(5);
            paragraph.style = Some(format!("Heading{}", level + 1));
            if self.config.has_numbering(HEADING) {
                paragraph.numbering = Some(NumberingRef {
                    reference: HEADING.to_owned(),
                    level,
                    instance: self.state.heading(),
                });
            }
        }

        let mut outputs = vec![paragraph.into()];
        outputs.extend(blocks.into_iter().map(Output::Block));
        Ok(outputs)
    }

    fn paragraph(&mut self, id: NodeId) -> Result<Vec<Output>, CompileError> {
        let tree = self.tree;
        let data = tree.data(id);
        if let Some(kind) = data.get(CAPTION_TYPE) {
            return self.caption(id, kind, data.id.as_deref());
        }
        let outputs = self.children(id, &RunOptions::default())?;
        Ok(settle(outputs, NORMAL_INDENT)
            .into_iter()
            .map(Output::Block)
            .collect())
    }

    /// `<label> <n>` bookmarked under the caption id, then `. ` and the
    /// caption text.
    ///
    /// The caption keeps its place among blocks bubbled out of its content:
    /// an image before the caption text stays above it.
    fn caption(
        &mut self,
        id: NodeId,
        kind: &str,
        anchor: Option<&str>,
    ) -> Result<Vec<Output>, CompileError> {
        let outputs = self.children(id, &RunOptions::default())?;
        let position = leading_blocks(&outputs);
        let (blocks, inlines) = split(outputs);

        let mut children = Vec::with_capacity(inlines.len() + 2);
        if let Some(label) = self.config.caption.label(kind) {
            let number = self.state.next_sequence(kind);
            let cached = match anchor {
                Some(anchor) => self.state.reference(anchor),
                None => TextCell::new(),
            };
            cached.set(format!("{label} {number}"));
            let field = Inline::Field(ComplexField {
                instruction: format!("SEQ {kind} \\* ARABIC"),
                cached,
                options: RunOptions::default(),
            });
            children.push(match anchor {
                Some(anchor) => Inline::Bookmark {
                    id: anchor.to_owned(),
                    children: vec![field],
                },
                None => field,
            });
            children.push(Inline::text(". "));
        } else {
            warn!(kind, "Unknown caption type, rendering without a number");
        }
        children.extend(inlines);

        let mut outputs: Vec<Output> = blocks.into_iter().map(Output::Block).collect();
        outputs.insert(position, Paragraph::new(children).with_style(CAPTION).into());
        Ok(outputs)
    }

    fn list(&mut self, id: NodeId, ordered: bool, level: u8) -> Result<Vec<Output>, CompileError> {
        let tree = self.tree;
        let mut outputs = Vec::new();
        for &item in tree.children(id) {
            if matches!(tree.kind(item), NodeKind::ListItem { .. }) {
                outputs.extend(self.list_item(item, ordered, level)?);
            } else {
                outputs.extend(self.node(item, &RunOptions::default())?);
            }
        }
        Ok(outputs)
    }

    /// The item's inline content becomes one numbered paragraph, with the
    /// paragraphs of a loose item separated by breaks. Nested lists and
    /// bubbled blocks follow it as siblings, sub-lists one level deeper.
    fn list_item(
        &mut self,
        id: NodeId,
        ordered: bool,
        level: u8,
    ) -> Result<Vec<Output>, CompileError> {
        let tree = self.tree;
        let mut inlines = Vec::new();
        let mut following = Vec::new();
        for &child in tree.children(id) {
            let outputs = match tree.kind(child) {
                NodeKind::List { ordered, .. } => {
                    self.list(child, *ordered, level.saturating_add(1))?
                }
                NodeKind::Paragraph if tree.data(child).get(CAPTION_TYPE).is_none() => {
                    let outputs = self.children(child, &RunOptions::default())?;
                    if !inlines.is_empty() && leading_blocks(&outputs) < outputs.len() {
                        inlines.push(Inline::Break);
                    }
                    outputs
                }
                _ => self.node(child, &RunOptions::default())?,
            };
            let (blocks, children) = split(outputs);
            inlines.extend(children);
            following.extend(blocks.into_iter().map(Output::Block));
        }

        let mut paragraph = Paragraph::new(inlines).with_style(LIST_PARAGRAPH);
        paragraph.numbering = self.list_numbering(ordered, level);
        let mut outputs = vec![paragraph.into()];
        outputs.extend(following);
        Ok(outputs)
    }

    fn list_numbering(&self, ordered: bool, level: u8) -> Option<NumberingRef> {
        let reference = if ordered { LIST } else { BULLET };
        self.config
            .has_numbering(reference)
            .then(|| NumberingRef {
                reference: reference.to_owned(),
                level: level.min(MAX_LIST_LEVEL),
                instance: self.state.list(),
            })
    }

    /// A centered paragraph holding the image, scaled to the section width.
    fn image(&self, id: NodeId, url: &str) -> Vec<Output> {
        let Some(ImageData {
            contents,
            meta: Some(meta),
        }) = &self.tree.data(id).image
        else {
            warn!(url, "Image was not loaded, dropping it");
            return Vec::new();
        };

        let (width, height) = fit_image(
            i64::from(meta.width) * EMU_PER_PIXEL,
            i64::from(meta.height) * EMU_PER_PIXEL,
            self.contracts.width,
        );
        let run = Inline::Image(ImageRun {
            data: Rc::clone(contents),
            extension: meta.extension.clone(),
            width,
            height,
        });
        vec![
            Paragraph {
                alignment: Some(Alignment::Center),
                ..Paragraph::new(vec![run])
            }
            .into(),
        ]
    }

    /// `#id` targets become cross-reference fields; anything else is an
    /// external hyperlink.
    fn link(&mut self, id: NodeId, url: &str, run: &RunOptions) -> Result<Vec<Output>, CompileError> {
        let (blocks, mut inlines) = split(self.children(id, run)?);

        let link = if let Some(anchor) = url.strip_prefix('#') {
            let mut options = match inlines.as_slice() {
                [Inline::Text(text)] => text.options.clone(),
                _ => run.clone(),
            };
            options.style.get_or_insert_with(|| HYPERLINK.to_owned());
            Inline::InternalHyperlink {
                anchor: anchor.to_owned(),
                children: vec![Inline::Field(ComplexField {
                    instruction: format!("REF {anchor} \\h"),
                    cached: self.state.reference(anchor),
                    options,
                })],
            }
        } else {
            for inline in &mut inlines {
                inline.format(&|options: &mut RunOptions| {
                    options.style.get_or_insert_with(|| HYPERLINK.to_owned());
                });
            }
            Inline::ExternalHyperlink {
                url: url.to_owned(),
                children: inlines,
            }
        };

        let mut outputs = vec![Output::Inline(link)];
        outputs.extend(blocks.into_iter().map(Output::Block));
        Ok(outputs)
    }
}

fn text_run(text: &str, options: RunOptions) -> Output {
    Output::Inline(Inline::Text(TextRun {
        text: text.to_owned(),
        options,
    }))
}

/// One paragraph per code block, lines separated by breaks.
fn code_block(code: &str) -> Paragraph {
    let mut children = Vec::new();
    for (i, line) in code.lines().enumerate() {
        if i > 0 {
            children.push(Inline::Break);
        }
        children.push(Inline::text(line));
    }
    Paragraph::new(children).with_style(CODE_BLOCK)
}

fn is_line_break(html: &str) -> bool {
    matches!(
        html.trim().to_ascii_lowercase().as_str(),
        "<br>" | "<br/>" | "<br />"
    )
}

/// Number of blocks before the first inline output.
fn leading_blocks(outputs: &[Output]) -> usize {
    outputs
        .iter()
        .take_while(|output| matches!(output, Output::Block(_)))
        .count()
}

fn split(outputs: Vec<Output>) -> (Vec<Block>, Vec<Inline>) {
    let mut blocks = Vec::new();
    let mut inlines = Vec::new();
    for output in outputs {
        match output {
            Output::Block(block) => blocks.push(block),
            Output::Inline(inline) => inlines.push(inline),
        }
    }
    (blocks, inlines)
}

/// Resolve outputs to blocks: inlines are gathered into one paragraph with
/// `style`, placed where the first of them appeared.
///
/// Whitespace left behind next to bubbled blocks does not make a paragraph.
pub(crate) fn settle(outputs: Vec<Output>, style: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut inlines = Vec::new();
    let mut position = None;
    for output in outputs {
        match output {
            Output::Block(block) => blocks.push(block),
            Output::Inline(inline) => {
                position.get_or_insert(blocks.len());
                inlines.push(inline);
            }
        }
    }

    if let Some(position) = position
        && (blocks.is_empty() || !inlines.iter().all(is_blank))
    {
        blocks.insert(position, Paragraph::new(inlines).with_style(style).into());
    }
    blocks
}

fn is_blank(inline: &Inline) -> bool {
    matches!(inline, Inline::Text(run) if run.text.trim().is_empty())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::rc::Rc;

    use md2docx_config::Config;
    use md2docx_docx::{Block, Document, Inline};
    use md2docx_markdown::{MarkdownLoader, MarkdownParser, process, transform};
    use md2docx_storage::{MemoryStore, SourceFile};

    use super::Compiler;

    /// Transform and compile `source` as `index.md` in `/project`.
    pub(crate) fn compile_with(store: &MemoryStore, source: &str, config: &Config) -> Document {
        let file = SourceFile::new("index.md", "/project", source);
        let visitors = transform::default_visitors(vec![Rc::new(MarkdownLoader)]);
        let (tree, root) = process(file, store, &MarkdownParser::new(), visitors).unwrap();
        let mut compiler = Compiler::new(&tree, config);
        compiler.compile(root.node).unwrap();
        compiler.into_document()
    }

    pub(crate) fn compile(source: &str) -> Document {
        compile_with(&MemoryStore::new(), source, &Config::default())
    }

    /// Blocks of the first section.
    pub(crate) fn blocks(document: &Document) -> &[Block] {
        &document.sections()[0].children
    }

    /// Concatenated run text, with fields showing their cached text.
    pub(crate) fn text(inlines: &[Inline]) -> String {
        let mut out = String::new();
        for inline in inlines {
            match inline {
                Inline::Text(run) => out.push_str(&run.text),
                Inline::Field(field) => out.push_str(&field.cached.get()),
                Inline::ExternalHyperlink { children, .. }
                | Inline::InternalHyperlink { children, .. }
                | Inline::Bookmark { children, .. } => out.push_str(&text(children)),
                Inline::Image(_) => out.push_str("[image]"),
                Inline::Break => out.push('\n'),
            }
        }
        out
    }

    /// `(style, text)` of every top-level paragraph.
    pub(crate) fn paragraphs(blocks: &[Block]) -> Vec<(String, String)> {
        blocks
            .iter()
            .filter_map(|block| match block {
                Block::Paragraph(p) => Some((
                    p.style.clone().unwrap_or_default(),
                    text(&p.children),
                )),
                Block::Table(_) => None,
            })
            .collect()
    }
}
