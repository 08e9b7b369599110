//! Style definitions.
//!
//! Styles are written under `[style.<id>]` and may carry run (character),
//! paragraph and table properties. A style can name a single `basedOn` parent;
//! resolution of that chain lives in [`crate::Config::full_style`].
//!
//! Values stay in their configured form here. The helpers on each type apply
//! the normalization rules (half-point font sizes, `*Chars` indents in
//! hundredths, `auto` line spacing in 240ths of a line) when a consumer asks
//! for output units.

use serde::Deserialize;

use crate::units::Measure;

/// Config key holding document-wide run/paragraph defaults.
pub const DOCUMENT_DEFAULTS: &str = "document";

/// Map a config style key to the style id written to the package.
///
/// Word's built-in styles have fixed ids; every other key is used verbatim.
#[must_use]
pub fn style_id(key: &str) -> &str {
    match key {
        "normal" => "Normal",
        "title" => "Title",
        "heading1" => "Heading1",
        "heading2" => "Heading2",
        "heading3" => "Heading3",
        "heading4" => "Heading4",
        "heading5" => "Heading5",
        "heading6" => "Heading6",
        "listParagraph" => "ListParagraph",
        other => other,
    }
}

/// A named style.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Style {
    /// Display name (defaults to the style id).
    pub name: Option<String>,
    /// Parent style key.
    pub based_on: Option<String>,
    /// Style applied to the following paragraph.
    pub next: Option<String>,
    /// Show in the quick style gallery.
    pub quick_format: Option<bool>,
    /// Character properties.
    pub run: Option<RunStyle>,
    /// Paragraph properties.
    pub paragraph: Option<ParagraphStyle>,
    /// Table properties; presence makes this a table style.
    pub table: Option<TableStyle>,
}

/// Font family, either one name or per-script names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Font {
    /// One family for every script.
    Name(String),
    /// Per-script families.
    Scripts {
        /// ASCII characters.
        #[serde(default)]
        ascii: Option<String>,
        /// East Asian characters.
        #[serde(default, rename = "eastAsia")]
        east_asia: Option<String>,
        /// High ANSI characters.
        #[serde(default, rename = "hAnsi")]
        h_ansi: Option<String>,
        /// Complex script characters.
        #[serde(default)]
        cs: Option<String>,
    },
}

/// Character properties.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunStyle {
    pub font: Option<Font>,
    pub size: Option<Measure>,
    pub size_complex_script: Option<Measure>,
    pub bold: Option<bool>,
    pub italics: Option<bool>,
    pub underline: Option<bool>,
    pub strike: Option<bool>,
    pub color: Option<String>,
    pub all_caps: Option<bool>,
    /// Grid snapping; applied by the package post-patch, not the run writer.
    pub snap_to_grid: Option<bool>,
}

impl RunStyle {
    /// Font size in half-points.
    #[must_use]
    pub fn size_half_points(&self) -> Option<i64> {
        self.size.map(Measure::to_half_points)
    }

    /// Complex-script font size in half-points.
    #[must_use]
    pub fn size_complex_script_half_points(&self) -> Option<i64> {
        self.size_complex_script.map(Measure::to_half_points)
    }
}

/// Paragraph justification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    #[serde(alias = "start")]
    Left,
    Center,
    #[serde(alias = "end")]
    Right,
    #[serde(alias = "justified")]
    Both,
    Distribute,
}

impl Alignment {
    /// Value of `w:jc`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Both => "both",
            Self::Distribute => "distribute",
        }
    }
}

/// Paragraph properties.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParagraphStyle {
    pub alignment: Option<Alignment>,
    pub indent: Option<Indent>,
    pub spacing: Option<Spacing>,
    pub keep_next: Option<bool>,
    pub keep_lines: Option<bool>,
    pub page_break_before: Option<bool>,
    pub outline_level: Option<u8>,
}

/// Paragraph indentation.
///
/// Plain values are lengths (bare numbers in twips). `*Chars` values count
/// characters and are written in hundredths of a character.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Indent {
    pub left: Option<Measure>,
    pub right: Option<Measure>,
    pub hanging: Option<Measure>,
    pub first_line: Option<Measure>,
    pub left_chars: Option<f64>,
    pub right_chars: Option<f64>,
    pub hanging_chars: Option<f64>,
    pub first_line_chars: Option<f64>,
}

impl Indent {
    /// Length attributes as `(w:attr, twips)` pairs, set ones only.
    #[must_use]
    pub fn length_attributes(&self) -> Vec<(&'static str, i64)> {
        [
            ("w:left", self.left),
            ("w:right", self.right),
            ("w:hanging", self.hanging),
            ("w:firstLine", self.first_line),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v.to_twips())))
        .collect()
    }

    /// Character attributes as `(w:attr, hundredths, w:twin)` triples, set ones only.
    ///
    /// `twin` is the length attribute a character value supersedes.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn chars_attributes(&self) -> Vec<(&'static str, i64, &'static str)> {
        [
            ("w:leftChars", self.left_chars, "w:left"),
            ("w:rightChars", self.right_chars, "w:right"),
            ("w:hangingChars", self.hanging_chars, "w:hanging"),
            ("w:firstLineChars", self.first_line_chars, "w:firstLine"),
        ]
        .into_iter()
        .filter_map(|(name, value, twin)| value.map(|v| (name, (v * 100.0).round() as i64, twin)))
        .collect()
    }
}

/// Line spacing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineRule {
    Auto,
    Exact,
    AtLeast,
}

impl LineRule {
    /// Value of `w:lineRule`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Exact => "exact",
            Self::AtLeast => "atLeast",
        }
    }
}

/// Paragraph spacing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Spacing {
    pub before: Option<Measure>,
    pub after: Option<Measure>,
    /// Line height; a multiple of single spacing when `line_rule` is `auto`.
    pub line: Option<f64>,
    pub line_rule: Option<LineRule>,
}

impl Spacing {
    /// Value of `w:line`: 240ths of a line for `auto`, twips otherwise.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn line_value(&self) -> Option<i64> {
        self.line.map(|line| match self.line_rule {
            Some(LineRule::Auto) => (line * 240.0).round() as i64,
            _ => line.round() as i64,
        })
    }
}

/// Table layout algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableLayout {
    Autofit,
    Fixed,
}

impl TableLayout {
    /// Value of `w:tblLayout/@w:type`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Autofit => "autofit",
            Self::Fixed => "fixed",
        }
    }
}

/// Table properties of a table style.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableStyle {
    pub layout: Option<TableLayout>,
    pub borders: Option<Borders>,
    /// Rules applied to every cell.
    pub cell: Option<CellStyle>,
    /// Conditional overrides.
    pub style: Option<ConditionalStyles>,
}

/// Conditional table formatting.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConditionalStyles {
    pub first_row: Option<ConditionalStyle>,
}

/// One conditional override.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConditionalStyle {
    pub cell: Option<CellStyle>,
}

/// Vertical alignment inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerticalAlign {
    Top,
    Center,
    Bottom,
}

impl VerticalAlign {
    /// Value of `w:vAlign`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }
}

/// Cell rules.
///
/// `run` and `paragraph` do not format the cell itself; they seed the
/// generated `<table>Contents` paragraph styles.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CellStyle {
    pub margins: Option<CellMargins>,
    pub vertical_align: Option<VerticalAlign>,
    pub shading: Option<Shading>,
    pub borders: Option<Borders>,
    pub run: Option<RunStyle>,
    pub paragraph: Option<ParagraphStyle>,
}

/// Cell margins (bare numbers in twips).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CellMargins {
    pub top: Option<Measure>,
    pub bottom: Option<Measure>,
    pub left: Option<Measure>,
    pub right: Option<Measure>,
}

/// Background fill.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Shading {
    /// Hex fill color, e.g. `"D9D9D9"`.
    pub fill: String,
}

/// Border set. Table-level borders also use the inside lines.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Borders {
    pub top: Option<Border>,
    pub bottom: Option<Border>,
    pub left: Option<Border>,
    pub right: Option<Border>,
    pub inside_horizontal: Option<Border>,
    pub inside_vertical: Option<Border>,
}

impl Borders {
    /// Sides in schema order as `(element, border)` pairs, set ones only.
    #[must_use]
    pub fn sides(&self) -> Vec<(&'static str, &Border)> {
        [
            ("w:top", self.top.as_ref()),
            ("w:left", self.left.as_ref()),
            ("w:bottom", self.bottom.as_ref()),
            ("w:right", self.right.as_ref()),
            ("w:insideH", self.inside_horizontal.as_ref()),
            ("w:insideV", self.inside_vertical.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, border)| border.map(|b| (name, b)))
        .collect()
    }
}

/// One border line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Border {
    /// Line style (`single`, `double`, `dashed`, `nil`, ...).
    pub style: String,
    /// Width in eighths of a point.
    pub size: u32,
    /// Hex color or `auto`.
    pub color: String,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            style: "single".to_owned(),
            size: 4,
            color: "auto".to_owned(),
        }
    }
}
