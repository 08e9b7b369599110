//! Target document model.
//!
//! Blocks (paragraphs and tables) form the body of a section; inlines form
//! the content of a paragraph. Nodes carry their own format options and are
//! serialized as-is; style resolution happens in the host application.

use std::cell::RefCell;
use std::rc::Rc;

use md2docx_config::style::{Alignment, Borders, CellStyle, TableLayout};

/// Top-level or cell-level content.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

impl From<Paragraph> for Block {
    fn from(paragraph: Paragraph) -> Self {
        Self::Paragraph(paragraph)
    }
}

impl From<Table> for Block {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

/// Reference to a numbering definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingRef {
    /// Numbering definition name (`heading`, `list`, `bullet`).
    pub reference: String,
    /// Zero-based level.
    pub level: u8,
    /// Instance; each distinct instance restarts counting.
    pub instance: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    /// Paragraph style id.
    pub style: Option<String>,
    pub alignment: Option<Alignment>,
    pub numbering: Option<NumberingRef>,
    pub children: Vec<Inline>,
}

impl Paragraph {
    #[must_use]
    pub fn new(children: Vec<Inline>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// Preferred width of a table or cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableWidth {
    /// Twentieths of a point.
    Dxa(i64),
    /// Percent of the containing width.
    Pct(f64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Table style id.
    pub style: Option<String>,
    pub width: Option<TableWidth>,
    pub layout: Option<TableLayout>,
    pub borders: Option<Borders>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    /// Repeat this row at the top of every page.
    pub header: bool,
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub width: Option<TableWidth>,
    pub col_span: u32,
    pub row_span: u32,
    pub header: bool,
    /// Direct cell formatting.
    pub style: CellStyle,
    pub children: Vec<Block>,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            width: None,
            col_span: 1,
            row_span: 1,
            header: false,
            style: CellStyle::default(),
            children: Vec::new(),
        }
    }
}

/// Paragraph content.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(TextRun),
    Image(ImageRun),
    ExternalHyperlink { url: String, children: Vec<Inline> },
    /// Link to a bookmark in this document.
    InternalHyperlink { anchor: String, children: Vec<Inline> },
    Bookmark { id: String, children: Vec<Inline> },
    Field(ComplexField),
    Break,
}

impl Inline {
    /// Plain text run.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextRun {
            text: text.into(),
            options: RunOptions::default(),
        })
    }

    /// Apply `f` to the run options of this inline and everything inside it.
    pub fn format(&mut self, f: &dyn Fn(&mut RunOptions)) {
        match self {
            Self::Text(run) => f(&mut run.options),
            Self::Field(field) => f(&mut field.options),
            Self::ExternalHyperlink { children, .. }
            | Self::InternalHyperlink { children, .. }
            | Self::Bookmark { children, .. } => {
                for child in children {
                    child.format(f);
                }
            }
            Self::Image(_) | Self::Break => {}
        }
    }
}

/// Vertical text position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertAlign {
    Subscript,
    Superscript,
}

impl VertAlign {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Subscript => "subscript",
            Self::Superscript => "superscript",
        }
    }
}

/// Direct character formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Character style id.
    pub style: Option<String>,
    pub bold: bool,
    pub italics: bool,
    pub strike: bool,
    pub vert_align: Option<VertAlign>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub options: RunOptions,
}

/// Inline picture. Dimensions are in EMU.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRun {
    pub data: Rc<[u8]>,
    /// Media file extension (`png`, `jpeg`, `gif`).
    pub extension: String,
    pub width: i64,
    pub height: i64,
}

/// A field: the host application computes the displayed text from
/// `instruction`; `cached` is shown until it does.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexField {
    pub instruction: String,
    pub cached: TextCell,
    pub options: RunOptions,
}

/// Shared, mutable text.
///
/// Clones share one buffer, so text set after a field was built still shows
/// up when the field is serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextCell(Rc<RefCell<String>>);

impl TextCell {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> String {
        self.0.borrow().clone()
    }

    pub fn set(&self, text: impl Into<String>) {
        *self.0.borrow_mut() = text.into();
    }

    /// Whether two handles share the same buffer.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_cell_is_shared() {
        let cell = TextCell::new();
        let field = ComplexField {
            instruction: "REF fig \\h".to_owned(),
            cached: cell.clone(),
            options: RunOptions::default(),
        };

        cell.set("图 1");

        assert_eq!(field.cached.get(), "图 1");
        assert!(field.cached.same(&cell));
        assert!(!TextCell::new().same(&cell));
    }

    #[test]
    fn test_format_reaches_nested_runs() {
        let mut link = Inline::ExternalHyperlink {
            url: "https://example.com".to_owned(),
            children: vec![Inline::text("a"), Inline::Break],
        };

        link.format(&|options| options.bold = true);

        let Inline::ExternalHyperlink { children, .. } = link else {
            unreachable!()
        };
        let Inline::Text(run) = &children[0] else {
            unreachable!()
        };
        assert!(run.options.bold);
    }
}
