//! `word/styles.xml`.
//!
//! Every style the compiler references has a built-in definition here, so
//! documents render sensibly without any configuration. A configured style
//! with the same key overrides the built-in one section by section (`run`,
//! `paragraph`, `table`); other configured styles are written verbatim.

use md2docx_config::style::{
    Alignment, Border, Borders, Font, Indent, ParagraphStyle, RunStyle, Style, TableStyle,
    DOCUMENT_DEFAULTS, style_id,
};
use md2docx_config::units::PT;
use md2docx_config::{Config, ConfigError, Measure};

use crate::props;
use crate::xml::{NS_W, Xml};

/// Keys with a built-in definition, in output order.
const BUILTINS: [&str; 15] = [
    "normal",
    "title",
    "heading1",
    "heading2",
    "heading3",
    "heading4",
    "heading5",
    "heading6",
    "listParagraph",
    "normalIndent",
    "caption",
    "codeBlock",
    "inlineCode",
    "hyperlink",
    "normalTable",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StyleKind {
    Paragraph,
    Character,
    Table,
}

impl StyleKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Character => "character",
            Self::Table => "table",
        }
    }
}

/// A style as written to the package.
#[derive(Debug, Clone)]
pub(crate) struct StyleDef {
    pub id: String,
    pub name: String,
    pub kind: StyleKind,
    pub default: bool,
    /// Properties with the `basedOn` chain already merged in.
    pub style: Style,
}

/// Resolve every style to write: built-ins, configured styles, and the
/// contents styles derived from each table style.
pub(crate) fn style_defs(config: &Config) -> Result<Vec<StyleDef>, ConfigError> {
    let configured = config
        .style
        .keys()
        .map(String::as_str)
        .filter(|key| *key != DOCUMENT_DEFAULTS && builtin(key).is_none());

    let mut defs = Vec::new();
    for key in BUILTINS.into_iter().chain(configured) {
        let (hint, style) = match (builtin(key), config.full_style(key)?) {
            (Some((kind, base)), Some(own)) => (Some(kind), overlay(own, base)),
            (Some((kind, base)), None) => (Some(kind), base),
            (None, Some(own)) => (None, own),
            (None, None) => continue,
        };

        let parent_kind = style
            .based_on
            .as_deref()
            .and_then(builtin)
            .map(|(kind, _)| kind);
        let kind = if style.table.is_some() {
            StyleKind::Table
        } else if style.paragraph.is_some()
            || hint == Some(StyleKind::Paragraph)
            || parent_kind == Some(StyleKind::Paragraph)
        {
            StyleKind::Paragraph
        } else {
            StyleKind::Character
        };
        let id = style_id(key).to_owned();
        let contents = if kind == StyleKind::Table {
            table_contents(config, key, &id, &style)?
        } else {
            Vec::new()
        };

        defs.push(StyleDef {
            name: style.name.clone().unwrap_or_else(|| id.clone()),
            id,
            kind,
            default: key == "normal",
            style,
        });
        defs.extend(contents);
    }
    Ok(defs)
}

/// Write the styles part.
pub(crate) fn write_styles(config: &Config) -> Result<String, ConfigError> {
    let defaults = config.full_style(DOCUMENT_DEFAULTS)?.unwrap_or_default();

    let mut xml = Xml::document();
    xml.open("w:styles").attr("xmlns:w", NS_W).end();
    xml.start("w:docDefaults").start("w:rPrDefault").start("w:rPr");
    if let Some(run) = &defaults.run {
        props::run_properties(&mut xml, run);
    }
    xml.close("w:rPr").close("w:rPrDefault").start("w:pPrDefault");
    props::paragraph_properties_element(&mut xml, defaults.paragraph.as_ref());
    xml.close("w:pPrDefault").close("w:docDefaults");

    for def in style_defs(config)? {
        write_style(&mut xml, &def);
    }
    xml.close("w:styles");
    Ok(xml.into_string())
}

fn write_style(xml: &mut Xml, def: &StyleDef) {
    let style = &def.style;
    let tag = xml.open("w:style").attr("w:type", def.kind.as_str());
    let tag = if def.default {
        tag.attr("w:default", 1)
    } else {
        tag
    };
    tag.attr("w:styleId", &def.id).end();

    xml.val("w:name", &def.name);
    if let Some(parent) = &style.based_on {
        xml.val("w:basedOn", style_id(parent));
    }
    if let Some(next) = &style.next {
        xml.val("w:next", style_id(next));
    }
    if style.quick_format == Some(true) {
        xml.empty("w:qFormat");
    }

    match def.kind {
        StyleKind::Paragraph => {
            props::paragraph_properties_element(xml, style.paragraph.as_ref());
            props::run_properties_element(xml, style.run.as_ref());
        }
        StyleKind::Character => props::run_properties_element(xml, style.run.as_ref()),
        StyleKind::Table => {
            props::run_properties_element(xml, style.run.as_ref());
            if let Some(table) = &style.table {
                table_properties(xml, table);
            }
        }
    }
    xml.close("w:style");
}

fn table_properties(xml: &mut Xml, table: &TableStyle) {
    xml.start("w:tblPr");
    if let Some(borders) = &table.borders {
        props::borders(xml, "w:tblBorders", borders);
    }
    if let Some(layout) = table.layout {
        xml.open("w:tblLayout").attr("w:type", layout.as_str()).empty();
    }
    xml.close("w:tblPr");

    if let Some(cell) = &table.cell
        && props::has_cell_properties(cell)
    {
        xml.start("w:tcPr");
        props::cell_properties(xml, cell);
        xml.close("w:tcPr");
    }

    if let Some(cell) = table
        .style
        .as_ref()
        .and_then(|s| s.first_row.as_ref())
        .and_then(|r| r.cell.as_ref())
        && props::has_cell_properties(cell)
    {
        xml.open("w:tblStylePr").attr("w:type", "firstRow").end();
        xml.start("w:tcPr");
        props::cell_properties(xml, cell);
        xml.close("w:tcPr").close("w:tblStylePr");
    }
}

/// Paragraph styles for the contents of plain and header cells.
fn table_contents(
    config: &Config,
    key: &str,
    id: &str,
    style: &Style,
) -> Result<Vec<StyleDef>, ConfigError> {
    let (cell, header_cell) = match config.table_style(key)? {
        Some(resolved) => (resolved.cell, resolved.header_cell),
        None => {
            let cell = style
                .table
                .as_ref()
                .and_then(|table| table.cell.clone())
                .unwrap_or_default();
            (cell.clone(), cell)
        }
    };

    let title = capitalize(id);
    Ok([
        ("Contents", "Contents", cell),
        ("HeaderContents", "Header Contents", header_cell),
    ]
    .into_iter()
    .map(|(suffix, label, cell)| StyleDef {
        id: format!("{id}{suffix}"),
        name: format!("{title} {label}"),
        kind: StyleKind::Paragraph,
        default: false,
        style: Style {
            based_on: Some("normal".to_owned()),
            run: cell.run,
            paragraph: Some(cell.paragraph.unwrap_or_default()),
            ..Style::default()
        },
    })
    .collect())
}

fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

/// Configured style over a built-in: each configured section replaces the
/// built-in one wholesale.
fn overlay(own: Style, base: Style) -> Style {
    Style {
        name: own.name.or(base.name),
        based_on: own.based_on.or(base.based_on),
        next: own.next.or(base.next),
        quick_format: own.quick_format.or(base.quick_format),
        run: own.run.or(base.run),
        paragraph: own.paragraph.or(base.paragraph),
        table: own.table.or(base.table),
    }
}

fn builtin(key: &str) -> Option<(StyleKind, Style)> {
    let paragraph = |name: &str, paragraph: ParagraphStyle, run: Option<RunStyle>| Style {
        name: Some(name.to_owned()),
        based_on: (key != "normal").then(|| "normal".to_owned()),
        quick_format: Some(true),
        run,
        paragraph: Some(paragraph),
        ..Style::default()
    };
    let character = |name: &str, run: RunStyle| Style {
        name: Some(name.to_owned()),
        run: Some(run),
        ..Style::default()
    };
    let monospace = || Some(Font::Name("Consolas".to_owned()));

    let style = match key {
        "normal" => (
            StyleKind::Paragraph,
            paragraph("Normal", ParagraphStyle::default(), None),
        ),
        "title" => (
            StyleKind::Paragraph,
            Style {
                next: Some("normal".to_owned()),
                ..paragraph(
                    "Title",
                    ParagraphStyle {
                        alignment: Some(Alignment::Center),
                        keep_next: Some(true),
                        ..ParagraphStyle::default()
                    },
                    Some(RunStyle {
                        bold: Some(true),
                        size: Some(Measure::Emu(18 * PT)),
                        ..RunStyle::default()
                    }),
                )
            },
        ),
        "listParagraph" => (
            StyleKind::Paragraph,
            paragraph("List Paragraph", ParagraphStyle::default(), None),
        ),
        "normalIndent" => (
            StyleKind::Paragraph,
            paragraph(
                "Normal Indent",
                ParagraphStyle {
                    indent: Some(Indent {
                        first_line_chars: Some(2.0),
                        ..Indent::default()
                    }),
                    ..ParagraphStyle::default()
                },
                None,
            ),
        ),
        "caption" => (
            StyleKind::Paragraph,
            paragraph(
                "caption",
                ParagraphStyle {
                    alignment: Some(Alignment::Center),
                    ..ParagraphStyle::default()
                },
                None,
            ),
        ),
        "codeBlock" => (
            StyleKind::Paragraph,
            paragraph(
                "Code Block",
                ParagraphStyle::default(),
                Some(RunStyle {
                    font: monospace(),
                    ..RunStyle::default()
                }),
            ),
        ),
        "inlineCode" => (
            StyleKind::Character,
            character(
                "Inline Code",
                RunStyle {
                    font: monospace(),
                    ..RunStyle::default()
                },
            ),
        ),
        "hyperlink" => (
            StyleKind::Character,
            character(
                "Hyperlink",
                RunStyle {
                    color: Some("0563C1".to_owned()),
                    underline: Some(true),
                    ..RunStyle::default()
                },
            ),
        ),
        "normalTable" => {
            let line = || Some(Border::default());
            (
                StyleKind::Table,
                Style {
                    name: Some("Table Grid".to_owned()),
                    table: Some(TableStyle {
                        borders: Some(Borders {
                            top: line(),
                            bottom: line(),
                            left: line(),
                            right: line(),
                            inside_horizontal: line(),
                            inside_vertical: line(),
                        }),
                        ..TableStyle::default()
                    }),
                    ..Style::default()
                },
            )
        }
        _ => {
            let level = key
                .strip_prefix("heading")?
                .parse::<u8>()
                .ok()
                .filter(|level| (1..=6).contains(level))?;
            (
                StyleKind::Paragraph,
                Style {
                    next: Some("normal".to_owned()),
                    ..paragraph(
                        format!("heading {level}").as_str(),
                        ParagraphStyle {
                            keep_next: Some(true),
                            keep_lines: Some(true),
                            outline_level: Some(level - 1),
                            ..ParagraphStyle::default()
                        },
                        Some(RunStyle {
                            bold: Some(true),
                            ..RunStyle::default()
                        }),
                    )
                },
            )
        }
    };
    Some(style)
}
