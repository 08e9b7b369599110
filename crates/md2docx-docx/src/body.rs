//! `word/document.xml` and its relationships.

use std::rc::Rc;

use md2docx_config::PageConfig;
use md2docx_config::style::CellStyle;
use md2docx_config::units::emu_to_twips;
use tracing::warn;

use crate::document::{Document, Section};
use crate::model::{
    Block, ComplexField, ImageRun, Inline, Paragraph, RunOptions, Table, TableCell, TableWidth,
};
use crate::props;
use crate::xml::{NS_R, NS_W, Xml};

const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Header and footer distance when the page config leaves them unset, in twips.
const DEFAULT_HEADER_TWIPS: i64 = 720;

/// A media file stored under `word/media/`.
#[derive(Debug, Clone)]
pub(crate) struct Media {
    /// Path relative to `word/`.
    pub path: String,
    pub data: Rc<[u8]>,
}

#[derive(Debug)]
struct Relationship {
    id: String,
    kind: &'static str,
    target: String,
    external: bool,
}

/// Relationships of the document part.
///
/// `rId1` and `rId2` are always the styles and numbering parts.
#[derive(Debug)]
pub(crate) struct Relationships {
    entries: Vec<Relationship>,
    pub media: Vec<Media>,
}

impl Relationships {
    fn new() -> Self {
        let mut rels = Self {
            entries: Vec::new(),
            media: Vec::new(),
        };
        rels.push("styles", "styles.xml".to_owned(), false);
        rels.push("numbering", "numbering.xml".to_owned(), false);
        rels
    }

    fn push(&mut self, kind: &'static str, target: String, external: bool) -> String {
        let id = format!("rId{}", self.entries.len() + 1);
        self.entries.push(Relationship {
            id: id.clone(),
            kind,
            target,
            external,
        });
        id
    }

    fn hyperlink(&mut self, url: &str) -> String {
        self.push("hyperlink", url.to_owned(), true)
    }

    fn image(&mut self, image: &ImageRun) -> String {
        let path = format!("media/image{}.{}", self.media.len() + 1, image.extension);
        self.media.push(Media {
            path: path.clone(),
            data: Rc::clone(&image.data),
        });
        self.push("image", path, false)
    }

    pub fn to_xml(&self) -> String {
        let mut xml = Xml::document();
        xml.open("Relationships").attr("xmlns", NS_RELS).end();
        for rel in &self.entries {
            xml.open("Relationship")
                .attr("Id", &rel.id)
                .attr("Type", format!("{REL_BASE}/{}", rel.kind))
                .attr("Target", &rel.target)
                .attr_opt("TargetMode", rel.external.then_some("External"))
                .empty();
        }
        xml.close("Relationships");
        xml.into_string()
    }
}

/// `(numbering reference, instance)` pairs in order of first use.
///
/// The position of a pair plus one is its `w:numId`.
#[derive(Debug, Default)]
pub(crate) struct NumberingInstances {
    pub used: Vec<(String, u32)>,
}

impl NumberingInstances {
    fn num_id(&mut self, reference: &str, instance: u32) -> usize {
        let position = self
            .used
            .iter()
            .position(|(r, i)| r == reference && *i == instance)
            .unwrap_or_else(|| {
                self.used.push((reference.to_owned(), instance));
                self.used.len() - 1
            });
        position + 1
    }
}

/// Serialized body with everything the other parts need to know about it.
pub(crate) struct BodyPart {
    pub xml: String,
    pub rels: Relationships,
    pub numbering: NumberingInstances,
}

/// Serialize all sections of `document`.
pub(crate) fn write_body(document: &Document) -> BodyPart {
    let mut writer = BodyWriter {
        xml: Xml::document(),
        document,
        rels: Relationships::new(),
        numbering: NumberingInstances::default(),
        bookmarks: 0,
        drawings: 0,
    };
    writer.write();
    BodyPart {
        xml: writer.xml.into_string(),
        rels: writer.rels,
        numbering: writer.numbering,
    }
}

/// Continuation state of a cell spanning further rows.
#[derive(Debug, Clone)]
struct Merge {
    remaining: u32,
    col_span: u32,
    width: Option<TableWidth>,
    style: CellStyle,
}

struct BodyWriter<'a> {
    xml: Xml,
    document: &'a Document,
    rels: Relationships,
    numbering: NumberingInstances,
    bookmarks: u32,
    drawings: u32,
}

impl BodyWriter<'_> {
    fn write(&mut self) {
        self.xml
            .open("w:document")
            .attr("xmlns:w", NS_W)
            .attr("xmlns:r", NS_R)
            .attr("xmlns:wp", NS_WP)
            .attr("xmlns:a", NS_A)
            .attr("xmlns:pic", NS_PIC)
            .end();
        self.xml.start("w:body");

        let document = self.document;
        match document.sections().split_last() {
            Some((last, rest)) => {
                for section in rest {
                    self.section(section);
                    // A section ends with the paragraph carrying its properties.
                    self.xml.start("w:p").start("w:pPr");
                    section_properties(&mut self.xml, &section.config.page);
                    self.xml.close("w:pPr").close("w:p");
                }
                self.section(last);
                section_properties(&mut self.xml, &last.config.page);
            }
            None => section_properties(&mut self.xml, &document.config().page),
        }

        self.xml.close("w:body").close("w:document");
    }

    fn section(&mut self, section: &Section) {
        for block in &section.children {
            self.block(block);
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Paragraph(paragraph) => self.paragraph(paragraph),
            Block::Table(table) => self.table(table),
        }
    }

    fn paragraph(&mut self, paragraph: &Paragraph) {
        self.xml.start("w:p");

        let numbering = paragraph.numbering.as_ref().filter(|numbering| {
            let known = self.document.config().has_numbering(&numbering.reference);
            if !known {
                warn!(reference = %numbering.reference, "Unknown numbering reference");
            }
            known
        });
        if paragraph.style.is_some() || numbering.is_some() || paragraph.alignment.is_some() {
            self.xml.start("w:pPr");
            if let Some(style) = &paragraph.style {
                self.xml.val("w:pStyle", style);
            }
            if let Some(numbering) = numbering {
                let num_id = self
                    .numbering
                    .num_id(&numbering.reference, numbering.instance);
                self.xml
                    .start("w:numPr")
                    .val("w:ilvl", numbering.level)
                    .val("w:numId", num_id)
                    .close("w:numPr");
            }
            if let Some(alignment) = paragraph.alignment {
                self.xml.val("w:jc", alignment.as_str());
            }
            self.xml.close("w:pPr");
        }

        for inline in &paragraph.children {
            self.inline(inline);
        }
        self.xml.close("w:p");
    }

    fn inline(&mut self, inline: &Inline) {
        match inline {
            Inline::Text(run) => self.text_run(&run.text, &run.options),
            Inline::Image(image) => self.image(image),
            Inline::ExternalHyperlink { url, children } => {
                let id = self.rels.hyperlink(url);
                self.xml
                    .open("w:hyperlink")
                    .attr("r:id", id)
                    .attr("w:history", 1)
                    .end();
                self.inlines(children);
                self.xml.close("w:hyperlink");
            }
            Inline::InternalHyperlink { anchor, children } => {
                self.xml
                    .open("w:hyperlink")
                    .attr("w:anchor", anchor)
                    .attr("w:history", 1)
                    .end();
                self.inlines(children);
                self.xml.close("w:hyperlink");
            }
            Inline::Bookmark { id, children } => {
                let bookmark = self.bookmarks;
                self.bookmarks += 1;
                self.xml
                    .open("w:bookmarkStart")
                    .attr("w:id", bookmark)
                    .attr("w:name", id)
                    .empty();
                self.inlines(children);
                self.xml.open("w:bookmarkEnd").attr("w:id", bookmark).empty();
            }
            Inline::Field(field) => self.field(field),
            Inline::Break => {
                self.xml.start("w:r").empty("w:br").close("w:r");
            }
        }
    }

    fn inlines(&mut self, inlines: &[Inline]) {
        for inline in inlines {
            self.inline(inline);
        }
    }

    fn run_start(&mut self, options: &RunOptions) {
        self.xml.start("w:r");
        let has_props = options.style.is_some()
            || options.bold
            || options.italics
            || options.strike
            || options.vert_align.is_some();
        if !has_props {
            return;
        }
        self.xml.start("w:rPr");
        if let Some(style) = &options.style {
            self.xml.val("w:rStyle", style);
        }
        if options.bold {
            self.xml.empty("w:b");
        }
        if options.italics {
            self.xml.empty("w:i");
        }
        if options.strike {
            self.xml.empty("w:strike");
        }
        if let Some(align) = options.vert_align {
            self.xml.val("w:vertAlign", align.as_str());
        }
        self.xml.close("w:rPr");
    }

    fn text_run(&mut self, text: &str, options: &RunOptions) {
        self.run_start(options);
        self.xml.open("w:t").attr("xml:space", "preserve").end();
        self.xml.text(text).close("w:t").close("w:r");
    }

    fn field(&mut self, field: &ComplexField) {
        let char_run = |writer: &mut Self, kind: &str| {
            writer.run_start(&field.options);
            writer
                .xml
                .open("w:fldChar")
                .attr("w:fldCharType", kind)
                .empty();
            writer.xml.close("w:r");
        };

        char_run(self, "begin");
        self.run_start(&field.options);
        self.xml.open("w:instrText").attr("xml:space", "preserve").end();
        self.xml
            .text(&format!(" {} ", field.instruction))
            .close("w:instrText")
            .close("w:r");
        char_run(self, "separate");
        self.text_run(&field.cached.get(), &field.options);
        char_run(self, "end");
    }

    fn image(&mut self, image: &ImageRun) {
        let rel = self.rels.image(image);
        self.drawings += 1;
        let id = self.drawings;
        let name = format!("Picture {id}");

        let xml = &mut self.xml;
        xml.start("w:r").start("w:drawing");
        xml.open("wp:inline")
            .attr("distT", 0)
            .attr("distB", 0)
            .attr("distL", 0)
            .attr("distR", 0)
            .end();
        xml.open("wp:extent")
            .attr("cx", image.width)
            .attr("cy", image.height)
            .empty();
        xml.open("wp:effectExtent")
            .attr("l", 0)
            .attr("t", 0)
            .attr("r", 0)
            .attr("b", 0)
            .empty();
        xml.open("wp:docPr").attr("id", id).attr("name", &name).empty();
        xml.start("wp:cNvGraphicFramePr");
        xml.open("a:graphicFrameLocks")
            .attr("noChangeAspect", 1)
            .empty();
        xml.close("wp:cNvGraphicFramePr");
        xml.start("a:graphic");
        xml.open("a:graphicData").attr("uri", NS_PIC).end();
        xml.start("pic:pic").start("pic:nvPicPr");
        xml.open("pic:cNvPr").attr("id", id).attr("name", &name).empty();
        xml.empty("pic:cNvPicPr").close("pic:nvPicPr");
        xml.start("pic:blipFill");
        xml.open("a:blip").attr("r:embed", rel).empty();
        xml.start("a:stretch")
            .empty("a:fillRect")
            .close("a:stretch")
            .close("pic:blipFill");
        xml.start("pic:spPr").start("a:xfrm");
        xml.open("a:off").attr("x", 0).attr("y", 0).empty();
        xml.open("a:ext")
            .attr("cx", image.width)
            .attr("cy", image.height)
            .empty();
        xml.close("a:xfrm");
        xml.open("a:prstGeom").attr("prst", "rect").end();
        xml.empty("a:avLst").close("a:prstGeom").close("pic:spPr");
        xml.close("pic:pic")
            .close("a:graphicData")
            .close("a:graphic")
            .close("wp:inline")
            .close("w:drawing")
            .close("w:r");
    }

    fn table(&mut self, table: &Table) {
        self.xml.start("w:tbl").start("w:tblPr");
        if let Some(style) = &table.style {
            self.xml.val("w:tblStyle", style);
        }
        width(&mut self.xml, "w:tblW", table.width);
        if let Some(borders) = &table.borders {
            props::borders(&mut self.xml, "w:tblBorders", borders);
        }
        if let Some(layout) = table.layout {
            self.xml
                .open("w:tblLayout")
                .attr("w:type", layout.as_str())
                .empty();
        }
        self.xml.close("w:tblPr");

        self.xml.start("w:tblGrid");
        for column in grid(table) {
            self.xml.open("w:gridCol").attr("w:w", column).empty();
        }
        self.xml.close("w:tblGrid");

        let mut merges: Vec<Option<Merge>> = Vec::new();
        for row in &table.rows {
            self.xml.start("w:tr");
            if row.header {
                self.xml
                    .start("w:trPr")
                    .empty("w:tblHeader")
                    .close("w:trPr");
            }

            let mut cells = row.cells.iter();
            let mut column = 0;
            loop {
                if let Some(merge) = merges.get_mut(column).and_then(Option::as_mut) {
                    self.continuation_cell(merge);
                    merge.remaining -= 1;
                    let (span, done) = (merge.col_span as usize, merge.remaining == 0);
                    if done {
                        merges[column] = None;
                    }
                    column += span;
                    continue;
                }

                let Some(cell) = cells.next() else {
                    // Rows covered by a span beyond the last cell still need
                    // their continuation cells.
                    match merges.iter().skip(column).position(Option::is_some) {
                        Some(offset) => {
                            column += offset;
                            continue;
                        }
                        None => break,
                    }
                };

                self.cell(cell);
                if cell.row_span > 1 {
                    if merges.len() <= column {
                        merges.resize(column + 1, None);
                    }
                    merges[column] = Some(Merge {
                        remaining: cell.row_span - 1,
                        col_span: cell.col_span.max(1),
                        width: cell.width,
                        style: cell.style.clone(),
                    });
                }
                column += cell.col_span.max(1) as usize;
            }
            self.xml.close("w:tr");
        }
        self.xml.close("w:tbl");
    }

    fn cell(&mut self, cell: &TableCell) {
        self.xml.start("w:tc").start("w:tcPr");
        width(&mut self.xml, "w:tcW", cell.width);
        if cell.col_span > 1 {
            self.xml.val("w:gridSpan", cell.col_span);
        }
        if cell.row_span > 1 {
            self.xml.val("w:vMerge", "restart");
        }
        props::cell_properties(&mut self.xml, &cell.style);
        self.xml.close("w:tcPr");

        for block in &cell.children {
            self.block(block);
        }
        // A cell must end with a paragraph.
        if !matches!(cell.children.last(), Some(Block::Paragraph(_))) {
            self.xml.empty("w:p");
        }
        self.xml.close("w:tc");
    }

    fn continuation_cell(&mut self, merge: &Merge) {
        self.xml.start("w:tc").start("w:tcPr");
        width(&mut self.xml, "w:tcW", merge.width);
        if merge.col_span > 1 {
            self.xml.val("w:gridSpan", merge.col_span);
        }
        self.xml.empty("w:vMerge");
        props::cell_properties(&mut self.xml, &merge.style);
        self.xml.close("w:tcPr").empty("w:p").close("w:tc");
    }
}

#[allow(clippy::cast_possible_truncation)]
fn width(xml: &mut Xml, tag: &str, width: Option<TableWidth>) {
    let open = xml.open(tag);
    let tag = match width {
        Some(TableWidth::Dxa(twips)) => open.attr("w:w", twips).attr("w:type", "dxa"),
        // Fiftieths of a percent.
        Some(TableWidth::Pct(pct)) => open
            .attr("w:w", (pct * 50.0).round() as i64)
            .attr("w:type", "pct"),
        None => open.attr("w:w", 0).attr("w:type", "auto"),
    };
    tag.empty();
}

/// Grid column widths in twips, taken from the first row.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn grid(table: &Table) -> Vec<i64> {
    let columns = table
        .rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| cell.col_span.max(1) as usize)
                .sum::<usize>()
        })
        .max()
        .unwrap_or(0);
    if columns == 0 {
        return Vec::new();
    }

    let total = match table.width {
        Some(TableWidth::Dxa(twips)) => twips,
        _ => 0,
    };
    let even = total / columns as i64;

    let mut widths = Vec::with_capacity(columns);
    if let Some(first) = table.rows.first() {
        for cell in &first.cells {
            let span = cell.col_span.max(1);
            let cell_width = match cell.width {
                Some(TableWidth::Dxa(twips)) => twips,
                Some(TableWidth::Pct(pct)) => (total as f64 * pct / 100.0).round() as i64,
                None => even * i64::from(span),
            };
            for _ in 0..span {
                widths.push(cell_width / i64::from(span));
            }
        }
    }
    widths.resize(columns, even);
    widths
}

fn section_properties(xml: &mut Xml, page: &PageConfig) {
    let (width, height) = page.oriented_size();
    let margin = &page.margin;
    let header = margin
        .header
        .map_or(DEFAULT_HEADER_TWIPS, |m| emu_to_twips(m.to_emu()));
    let footer = margin
        .footer
        .map_or(DEFAULT_HEADER_TWIPS, |m| emu_to_twips(m.to_emu()));

    xml.start("w:sectPr");
    xml.open("w:pgSz")
        .attr("w:w", emu_to_twips(width))
        .attr("w:h", emu_to_twips(height))
        .attr("w:orient", page.size.orientation.as_str())
        .empty();
    xml.open("w:pgMar")
        .attr("w:top", emu_to_twips(margin.top.to_emu()))
        .attr("w:right", emu_to_twips(margin.right.to_emu()))
        .attr("w:bottom", emu_to_twips(margin.bottom.to_emu()))
        .attr("w:left", emu_to_twips(margin.left.to_emu()))
        .attr("w:header", header)
        .attr("w:footer", footer)
        .attr("w:gutter", 0)
        .empty();
    xml.close("w:sectPr");
}
