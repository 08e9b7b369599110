//! Property writers shared by the body, style and numbering parts.
//!
//! Children are written in schema order; consumers reject out-of-order
//! properties.

use md2docx_config::Measure;
use md2docx_config::style::{
    Borders, CellMargins, CellStyle, Font, LineRule, ParagraphStyle, RunStyle, Shading,
};

use crate::xml::Xml;

/// Paragraph properties from a style, without the enclosing `w:pPr`.
///
/// Character indents are not written here; the package patch adds them.
pub(crate) fn paragraph_properties(xml: &mut Xml, paragraph: &ParagraphStyle) {
    if let Some(on) = paragraph.keep_next {
        xml.flag("w:keepNext", on);
    }
    if let Some(on) = paragraph.keep_lines {
        xml.flag("w:keepLines", on);
    }
    if let Some(on) = paragraph.page_break_before {
        xml.flag("w:pageBreakBefore", on);
    }
    if let Some(spacing) = &paragraph.spacing {
        xml.open("w:spacing")
            .attr_opt("w:before", spacing.before.map(Measure::to_twips))
            .attr_opt("w:after", spacing.after.map(Measure::to_twips))
            .attr_opt("w:line", spacing.line_value())
            .attr_opt("w:lineRule", spacing.line_rule.map(LineRule::as_str))
            .empty();
    }
    if let Some(indent) = &paragraph.indent {
        let mut tag = xml.open("w:ind");
        for (name, twips) in indent.length_attributes() {
            tag = tag.attr(name, twips);
        }
        tag.empty();
    }
    if let Some(alignment) = paragraph.alignment {
        xml.val("w:jc", alignment.as_str());
    }
    if let Some(level) = paragraph.outline_level {
        xml.val("w:outlineLvl", level);
    }
}

/// `w:pPr` wrapper around [`paragraph_properties`]; always written.
pub(crate) fn paragraph_properties_element(xml: &mut Xml, paragraph: Option<&ParagraphStyle>) {
    xml.start("w:pPr");
    if let Some(paragraph) = paragraph {
        paragraph_properties(xml, paragraph);
    }
    xml.close("w:pPr");
}

/// Run properties from a style, without the enclosing `w:rPr`.
pub(crate) fn run_properties(xml: &mut Xml, run: &RunStyle) {
    if let Some(font) = &run.font {
        let tag = xml.open("w:rFonts");
        match font {
            Font::Name(name) => tag
                .attr("w:ascii", name)
                .attr("w:eastAsia", name)
                .attr("w:hAnsi", name)
                .attr("w:cs", name)
                .empty(),
            Font::Scripts {
                ascii,
                east_asia,
                h_ansi,
                cs,
            } => tag
                .attr_opt("w:ascii", ascii.as_ref())
                .attr_opt("w:eastAsia", east_asia.as_ref())
                .attr_opt("w:hAnsi", h_ansi.as_ref())
                .attr_opt("w:cs", cs.as_ref())
                .empty(),
        }
    }
    if let Some(on) = run.bold {
        xml.flag("w:b", on);
    }
    if let Some(on) = run.italics {
        xml.flag("w:i", on);
    }
    if let Some(on) = run.all_caps {
        xml.flag("w:caps", on);
    }
    if let Some(on) = run.strike {
        xml.flag("w:strike", on);
    }
    if let Some(color) = &run.color {
        xml.val("w:color", color);
    }
    if let Some(size) = run.size_half_points() {
        xml.val("w:sz", size);
    }
    if let Some(size) = run.size_complex_script_half_points().or(run.size_half_points()) {
        xml.val("w:szCs", size);
    }
    if let Some(on) = run.underline {
        xml.val("w:u", if on { "single" } else { "none" });
    }
}

/// `w:rPr` wrapper around [`run_properties`]; skipped without a run style.
pub(crate) fn run_properties_element(xml: &mut Xml, run: Option<&RunStyle>) {
    if let Some(run) = run {
        xml.start("w:rPr");
        run_properties(xml, run);
        xml.close("w:rPr");
    }
}

/// Border set wrapped in `tag` (`w:tblBorders`, `w:tcBorders`).
pub(crate) fn borders(xml: &mut Xml, tag: &str, borders: &Borders) {
    xml.start(tag);
    for (side, border) in borders.sides() {
        xml.open(side)
            .attr("w:val", &border.style)
            .attr("w:sz", border.size)
            .attr("w:space", 0)
            .attr("w:color", &border.color)
            .empty();
    }
    xml.close(tag);
}

pub(crate) fn shading(xml: &mut Xml, shading: &Shading) {
    xml.open("w:shd")
        .attr("w:val", "clear")
        .attr("w:color", "auto")
        .attr("w:fill", &shading.fill)
        .empty();
}

/// Cell margins wrapped in `tag` (`w:tblCellMar`, `w:tcMar`).
pub(crate) fn margins(xml: &mut Xml, tag: &str, margins: &CellMargins) {
    xml.start(tag);
    for (side, value) in [
        ("w:top", margins.top),
        ("w:left", margins.left),
        ("w:bottom", margins.bottom),
        ("w:right", margins.right),
    ] {
        if let Some(value) = value {
            xml.open(side)
                .attr("w:w", value.to_twips())
                .attr("w:type", "dxa")
                .empty();
        }
    }
    xml.close(tag);
}

/// The formatting half of `w:tcPr`: borders, shading, margins, alignment.
pub(crate) fn cell_properties(xml: &mut Xml, cell: &CellStyle) {
    if let Some(value) = &cell.borders {
        borders(xml, "w:tcBorders", value);
    }
    if let Some(value) = &cell.shading {
        shading(xml, value);
    }
    if let Some(value) = &cell.margins {
        margins(xml, "w:tcMar", value);
    }
    if let Some(align) = cell.vertical_align {
        xml.val("w:vAlign", align.as_str());
    }
}

/// Whether [`cell_properties`] would write anything.
pub(crate) fn has_cell_properties(cell: &CellStyle) -> bool {
    cell.borders.is_some()
        || cell.shading.is_some()
        || cell.margins.is_some()
        || cell.vertical_align.is_some()
}
