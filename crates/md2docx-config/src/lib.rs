//! Document configuration for md2docx.
//!
//! Parses `.docx.toml` files with serde and exposes the typed view the
//! assembler and compiler work from. The raw TOML table is kept alongside
//! the typed view so that section front matter and `basedOn` chains can be
//! deep-merged before deserialization.
//!
//! # Example
//!
//! ```ignore
//! use md2docx_config::Config;
//!
//! let doc = Config::load(r#"
//! [page.size]
//! orientation = "portrait"
//!
//! [style.normalIndent.paragraph.indent]
//! firstLineChars = 2
//! "#)?;
//! let section = doc.section("[page.size]\norientation = \"landscape\"")?;
//! assert!(section.page.contracts().width > doc.page.contracts().width);
//! ```

mod merge;
pub mod numbering;
mod page;
pub mod style;
pub mod units;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use toml::{Table, Value};

pub use merge::merge_tables;
pub use numbering::{Level, Numbering};
pub use page::{Contracts, Orientation, PageConfig, PageMargin, PageSize};
pub use style::{CellStyle, Style, TableStyle};
pub use units::Measure;

/// Configuration filename, looked up next to the entry document.
pub const CONFIG_FILENAME: &str = ".docx.toml";

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// A `basedOn` chain loops back on itself.
    #[error("Cyclic style inheritance: {}", .0.join(" -> "))]
    CyclicStyle(Vec<String>),
}

/// Document or section configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page geometry.
    pub page: PageConfig,
    /// Named styles keyed by config key.
    pub style: BTreeMap<String, Style>,
    /// Numbering definitions keyed by name.
    pub numbering: BTreeMap<String, Numbering>,
    /// Caption labels.
    pub caption: CaptionConfig,
    /// Diagram rendering.
    pub diagrams: DiagramsConfig,

    /// Table this config was deserialized from.
    #[serde(skip)]
    raw: Table,
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            page: PageConfig::default(),
            style: BTreeMap::new(),
            numbering: BTreeMap::new(),
            caption: CaptionConfig::default(),
            diagrams: DiagramsConfig::default(),
            raw: Table::new(),
        };
        config.complete_numbering();
        config
    }
}

/// `[caption]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Label per caption kind (`Table`, `Figure`, `Equation`).
    pub label: BTreeMap<String, String>,
}

impl CaptionConfig {
    /// Label for a caption kind, or `None` for unknown kinds.
    #[must_use]
    pub fn label(&self, kind: &str) -> Option<&str> {
        let fallback = match kind {
            "Table" => "表",
            "Figure" => "图",
            "Equation" => "公式",
            _ => return None,
        };
        Some(self.label.get(kind).map_or(fallback, String::as_str))
    }
}

/// `[diagrams]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagramsConfig {
    /// Kroki server URL for diagram rendering.
    pub kroki_url: Option<String>,
}

/// Table style with its cell rules resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedTableStyle {
    /// Table-level rules.
    pub table: TableStyle,
    /// Rules for every cell.
    pub cell: CellStyle,
    /// Rules for header cells: `cell` deep-merged with `style.firstRow.cell`.
    pub header_cell: CellStyle,
}

impl Config {
    /// Parse TOML text into a raw table.
    pub fn parse(text: &str) -> Result<Table, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a document configuration from TOML text.
    pub fn load(text: &str) -> Result<Self, ConfigError> {
        Self::from_table(Self::parse(text)?)
    }

    /// Build a configuration from a raw table.
    pub fn from_table(raw: Table) -> Result<Self, ConfigError> {
        let mut config: Self = deserialize(raw.clone())?;
        config.raw = raw;
        config.complete_numbering();
        config.validate()?;
        Ok(config)
    }

    /// Derive a section configuration: `front_matter` deep-merged over this one.
    pub fn section(&self, front_matter: &str) -> Result<Self, ConfigError> {
        let mut raw = self.raw.clone();
        merge_tables(&mut raw, &Self::parse(front_matter)?);
        Self::from_table(raw)
    }

    /// Raw table this configuration was built from.
    #[must_use]
    pub fn raw(&self) -> &Table {
        &self.raw
    }

    /// Whether a numbering definition with this name exists.
    #[must_use]
    pub fn has_numbering(&self, name: &str) -> bool {
        self.numbering.contains_key(name)
    }

    /// Resolve a style with its whole `basedOn` chain merged in (child wins).
    ///
    /// Returns `Ok(None)` for styles that are not configured.
    pub fn full_style(&self, key: &str) -> Result<Option<Style>, ConfigError> {
        self.resolve_style_table(key, &mut Vec::new())?
            .map(deserialize)
            .transpose()
    }

    /// Resolve a table style and its plain and header cell rules.
    ///
    /// Returns `Ok(None)` if the style is missing or has no `table` section.
    pub fn table_style(&self, key: &str) -> Result<Option<ResolvedTableStyle>, ConfigError> {
        let Some(style) = self.resolve_style_table(key, &mut Vec::new())? else {
            return Ok(None);
        };
        let Some(Value::Table(table)) = style.get("table") else {
            return Ok(None);
        };

        let cell = table
            .get("cell")
            .and_then(Value::as_table)
            .cloned()
            .unwrap_or_default();
        let mut header_cell = cell.clone();
        if let Some(first_row) = table
            .get("style")
            .and_then(|s| s.get("firstRow"))
            .and_then(|s| s.get("cell"))
            .and_then(Value::as_table)
        {
            merge_tables(&mut header_cell, first_row);
        }

        Ok(Some(ResolvedTableStyle {
            table: deserialize(table.clone())?,
            cell: deserialize(cell)?,
            header_cell: deserialize(header_cell)?,
        }))
    }

    fn resolve_style_table(
        &self,
        key: &str,
        visited: &mut Vec<String>,
    ) -> Result<Option<Table>, ConfigError> {
        let Some(own) = self
            .raw
            .get("style")
            .and_then(|s| s.get(key))
            .and_then(Value::as_table)
        else {
            return Ok(None);
        };

        if visited.iter().any(|v| v == key) {
            visited.push(key.to_owned());
            return Err(ConfigError::CyclicStyle(std::mem::take(visited)));
        }
        visited.push(key.to_owned());

        let mut merged = match own.get("basedOn").and_then(Value::as_str) {
            Some(parent) => self
                .resolve_style_table(parent, visited)?
                .unwrap_or_default(),
            None => Table::new(),
        };
        merge_tables(&mut merged, own);
        Ok(Some(merged))
    }

    /// Ensure a `bullet` definition exists.
    ///
    /// Derived from `list` when that is configured, otherwise a default set.
    fn complete_numbering(&mut self) {
        if self.numbering.contains_key(numbering::BULLET) {
            return;
        }
        let bullets = match self.numbering.get(numbering::LIST) {
            Some(list) => Numbering::bullets_like(list),
            None => Numbering::default_bullets(),
        };
        self.numbering.insert(numbering::BULLET.to_owned(), bullets);
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let contracts = self.page.contracts();
        if contracts.width <= 0 || contracts.height <= 0 {
            return Err(ConfigError::Validation(
                "page margins leave no room for content".to_owned(),
            ));
        }

        if let Some(url) = &self.diagrams.kroki_url
            && !url.starts_with("http://")
            && !url.starts_with("https://")
        {
            return Err(ConfigError::Validation(
                "diagrams.krokiUrl must start with http:// or https://".to_owned(),
            ));
        }

        for (name, numbering) in &self.numbering {
            if numbering.levels.len() > 9 {
                return Err(ConfigError::Validation(format!(
                    "numbering.{name} has more than 9 levels"
                )));
            }
        }

        Ok(())
    }
}

fn deserialize<T: DeserializeOwned>(table: Table) -> Result<T, ConfigError> {
    Ok(Value::Table(table).try_into()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::units::{CM, MM};

    #[test]
    fn test_default_config() {
        let config = Config::load("").unwrap();
        assert_eq!(config.page.size.width.to_emu(), 210 * MM);
        assert_eq!(config.page.size.height.to_emu(), 297 * MM);
        assert_eq!(config.page.size.orientation, Orientation::Portrait);
        assert_eq!(config.page.margin.top.to_emu(), 35 * MM);
        assert_eq!(config.page.margin.left.to_emu(), 28 * MM);
        assert!(config.has_numbering("bullet"));
        assert!(!config.has_numbering("list"));
    }

    #[test]
    fn test_section_overrides_document() {
        let doc = Config::load(
            r#"
[page.margin]
left = "2cm"
right = "2cm"
"#,
        )
        .unwrap();

        let section = doc
            .section("[page.size]\norientation = \"landscape\"")
            .unwrap();

        assert_eq!(section.page.size.orientation, Orientation::Landscape);
        assert_eq!(section.page.margin.left.to_emu(), 2 * CM);
        assert_eq!(section.page.contracts().width, 297 * MM - 4 * CM);
        assert_eq!(doc.page.size.orientation, Orientation::Portrait);
    }

    #[test]
    fn test_bullet_synthesized_from_list() {
        let config = Config::load(
            r#"
[[numbering.list.levels]]
text = "%1."
[[numbering.list.levels]]
text = "%1.%2."
"#,
        )
        .unwrap();

        let bullet = &config.numbering["bullet"];
        assert_eq!(bullet.levels.len(), 2);
        assert_eq!(bullet.levels[0].text, "●");
        assert_eq!(bullet.levels[1].text, "○");
    }

    #[test]
    fn test_explicit_bullet_wins() {
        let config = Config::load(
            r#"
[[numbering.list.levels]]
text = "%1."
[[numbering.bullet.levels]]
text = "-"
"#,
        )
        .unwrap();

        assert_eq!(config.numbering["bullet"].levels[0].text, "-");
    }

    #[test]
    fn test_full_style_merges_based_on() {
        let config = Config::load(
            r#"
[style.normal.run]
size = "12pt"
color = "333333"

[style.normalIndent]
basedOn = "normal"
run = { color = "000000" }
paragraph = { indent = { firstLineChars = 2 } }
"#,
        )
        .unwrap();

        let style = config.full_style("normalIndent").unwrap().unwrap();
        let run = style.run.unwrap();
        assert_eq!(run.size_half_points(), Some(24));
        assert_eq!(run.color.as_deref(), Some("000000"));
        assert!(style.paragraph.is_some());
        assert_eq!(config.full_style("missing").unwrap(), None);
    }

    #[test]
    fn test_cyclic_based_on_is_an_error() {
        let config = Config::load(
            r#"
[style.a]
basedOn = "b"
[style.b]
basedOn = "a"
"#,
        )
        .unwrap();

        let err = config.full_style("a").unwrap_err();
        assert!(matches!(&err, ConfigError::CyclicStyle(chain) if chain == &["a", "b", "a"]));
        assert_eq!(err.to_string(), "Cyclic style inheritance: a -> b -> a");
    }

    #[test]
    fn test_table_style_header_cell_merge() {
        let config = Config::load(
            r#"
[style.normalTable.table]
layout = "fixed"

[style.normalTable.table.cell]
verticalAlign = "center"
run = { size = "10.5pt" }

[style.normalTable.table.style.firstRow.cell]
shading = { fill = "D9D9D9" }
run = { bold = true }
"#,
        )
        .unwrap();

        let resolved = config.table_style("normalTable").unwrap().unwrap();
        assert_eq!(resolved.cell.shading, None);
        assert_eq!(resolved.header_cell.shading.unwrap().fill, "D9D9D9");
        assert_eq!(
            resolved.header_cell.vertical_align,
            Some(style::VerticalAlign::Center)
        );
        let run = resolved.header_cell.run.unwrap();
        assert_eq!(run.bold, Some(true));
        assert_eq!(run.size_half_points(), Some(21));
    }

    #[test]
    fn test_caption_labels() {
        let config = Config::load("[caption.label]\nFigure = \"Figure\"").unwrap();
        assert_eq!(config.caption.label("Figure"), Some("Figure"));
        assert_eq!(config.caption.label("Table"), Some("表"));
        assert_eq!(config.caption.label("Listing"), None);
    }

    #[test]
    fn test_margins_larger_than_page() {
        let err = Config::load("[page.margin]\nleft = \"200mm\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_invalid_kroki_url() {
        let err = Config::load("[diagrams]\nkrokiUrl = \"kroki.local\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_invalid_measure_is_parse_error() {
        let err = Config::load("[page.margin]\nleft = \"2px\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
