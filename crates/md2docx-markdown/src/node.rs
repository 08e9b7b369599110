//! Markdown node types.

use std::collections::BTreeMap;
use std::rc::Rc;

/// Index of a node in a [`Tree`](crate::Tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// A directive: a named, attributed annotation in the source.
///
/// Attributes keep `id` and `class` as ordinary keys (`{#x .a .b}` becomes
/// `id = "x"`, `class = "a b"`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

impl Directive {
    /// Create a directive without attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Get an attribute value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Attributes as node metadata, with `id`/`class` split out and every
    /// other key prefixed with `prefix`.
    #[must_use]
    pub fn to_data(&self, prefix: &str) -> Data {
        let mut data = Data::default();
        for (key, value) in &self.attributes {
            match key.as_str() {
                "id" => data.id = Some(value.clone()),
                "class" => data.class = Some(value.clone()),
                _ => {
                    data.attrs.insert(format!("{prefix}{key}"), value.clone());
                }
            }
        }
        data
    }
}

/// Kind of a markdown node, with kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Heading { depth: u8 },
    Paragraph,
    Blockquote,
    List { ordered: bool, start: Option<u64> },
    ListItem { checked: Option<bool> },
    Table,
    TableRow,
    TableCell,
    Text(String),
    Strong,
    Emphasis,
    Delete,
    InlineCode(String),
    Code { lang: Option<String>, value: String },
    Image { url: String, alt: String, title: Option<String> },
    Link { url: String, title: Option<String> },
    Html(String),
    Break,
    ThematicBreak,
    FootnoteReference(String),
    FootnoteDefinition(String),
    /// `:name[..]{..}`
    TextDirective(Directive),
    /// `::name[..]{..}`
    LeafDirective(Directive),
    /// `:::name{..}` ... `:::`
    ContainerDirective(Directive),
    /// `+++` TOML front matter.
    Toml(String),
}

impl NodeKind {
    /// Node type name as used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Heading { .. } => "heading",
            Self::Paragraph => "paragraph",
            Self::Blockquote => "blockquote",
            Self::List { .. } => "list",
            Self::ListItem { .. } => "listItem",
            Self::Table => "table",
            Self::TableRow => "tableRow",
            Self::TableCell => "tableCell",
            Self::Text(_) => "text",
            Self::Strong => "strong",
            Self::Emphasis => "emphasis",
            Self::Delete => "delete",
            Self::InlineCode(_) => "inlineCode",
            Self::Code { .. } => "code",
            Self::Image { .. } => "image",
            Self::Link { .. } => "link",
            Self::Html(_) => "html",
            Self::Break => "break",
            Self::ThematicBreak => "thematicBreak",
            Self::FootnoteReference(_) => "footnoteReference",
            Self::FootnoteDefinition(_) => "footnoteDefinition",
            Self::TextDirective(_) => "textDirective",
            Self::LeafDirective(_) => "leafDirective",
            Self::ContainerDirective(_) => "containerDirective",
            Self::Toml(_) => "toml",
        }
    }

    /// Whether the node is phrasing (inline) content.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Self::Text(_)
                | Self::Strong
                | Self::Emphasis
                | Self::Delete
                | Self::InlineCode(_)
                | Self::Image { .. }
                | Self::Link { .. }
                | Self::Html(_)
                | Self::Break
                | Self::FootnoteReference(_)
                | Self::TextDirective(_)
        )
    }
}

/// Loaded image bytes and their intrinsic properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub contents: Rc<[u8]>,
    pub meta: Option<ImageMeta>,
}

/// Intrinsic image properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMeta {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// File extension for the image format (`png`, `jpeg`, `gif`).
    pub extension: String,
}

/// Side-channel metadata attached to a node by transforms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Data {
    pub id: Option<String>,
    pub class: Option<String>,
    pub attrs: BTreeMap<String, String>,
    pub image: Option<ImageData>,
}

impl Data {
    /// Get a free-form attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Merge `patch` into this data; fields present in `patch` win.
    pub fn patch(&mut self, patch: Data) {
        if patch.id.is_some() {
            self.id = patch.id;
        }
        if patch.class.is_some() {
            self.class = patch.class;
        }
        if patch.image.is_some() {
            self.image = patch.image;
        }
        self.attrs.extend(patch.attrs);
    }
}

/// A node in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub data: Data,
    pub children: Vec<NodeId>,
}

impl Node {
    /// Create a childless node without metadata.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            data: Data::default(),
            children: Vec::new(),
        }
    }
}
