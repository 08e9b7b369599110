//! Numbering definitions.
//!
//! `[numbering.<name>]` holds an ordered list of levels. Paragraphs refer to a
//! definition by name: `heading` for outline numbers, `list` for ordered lists
//! and `bullet` for unordered ones.

use serde::Deserialize;

use crate::style::{Alignment, Indent, ParagraphStyle, Style};
use crate::units::Measure;

/// Numbering used by depth ≥ 2 headings.
pub const HEADING: &str = "heading";
/// Numbering used by ordered lists.
pub const LIST: &str = "list";
/// Numbering used by unordered lists.
pub const BULLET: &str = "bullet";

/// Glyphs cycled through by bullet levels.
pub const BULLET_GLYPHS: [&str; 3] = ["\u{25CF}", "\u{25CB}", "\u{25A0}"];

/// Number of levels Word supports per definition.
const MAX_LEVELS: usize = 9;

/// A numbering definition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Numbering {
    pub levels: Vec<Level>,
}

/// One numbering level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Level {
    /// `w:numFmt` value (`decimal`, `bullet`, `chineseCounting`, ...).
    pub format: String,
    /// `w:lvlText` value, e.g. `"%1.%2."`.
    pub text: String,
    pub alignment: Option<Alignment>,
    pub start: u32,
    /// `w:suff` value (`tab`, `space`, `nothing`).
    pub suffix: Option<String>,
    /// Style override for paragraphs at this level.
    pub style: Option<Style>,
}

impl Default for Level {
    fn default() -> Self {
        Self {
            format: "decimal".to_owned(),
            text: String::new(),
            alignment: None,
            start: 1,
            suffix: None,
            style: None,
        }
    }
}

impl Numbering {
    /// Bullet definition mirroring `list`'s level layout.
    #[must_use]
    pub fn bullets_like(list: &Self) -> Self {
        Self {
            levels: list
                .levels
                .iter()
                .enumerate()
                .map(|(i, level)| Level {
                    format: "bullet".to_owned(),
                    text: BULLET_GLYPHS[i % BULLET_GLYPHS.len()].to_owned(),
                    suffix: Some("tab".to_owned()),
                    ..level.clone()
                })
                .collect(),
        }
    }

    /// Nine-level bullet definition used when nothing is configured.
    #[must_use]
    pub fn default_bullets() -> Self {
        Self {
            levels: (0..MAX_LEVELS)
                .map(|i| Level {
                    format: "bullet".to_owned(),
                    text: BULLET_GLYPHS[i % BULLET_GLYPHS.len()].to_owned(),
                    suffix: Some("tab".to_owned()),
                    style: Some(Style {
                        paragraph: Some(ParagraphStyle {
                            indent: Some(Indent {
                                left: Some(Measure::Raw(indent_for(i))),
                                hanging: Some(Measure::Raw(360.0)),
                                ..Indent::default()
                            }),
                            ..ParagraphStyle::default()
                        }),
                        ..Style::default()
                    }),
                    ..Level::default()
                })
                .collect(),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn indent_for(level: usize) -> f64 {
    720.0 * (level + 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bullets_like_cycles_glyphs() {
        let list: Numbering = toml::from_str(
            r#"
[[levels]]
text = "%1."
[[levels]]
text = "%1.%2."
[[levels]]
text = "%1.%2.%3."
[[levels]]
text = "%1.%2.%3.%4."
"#,
        )
        .unwrap();

        let bullets = Numbering::bullets_like(&list);

        let glyphs: Vec<_> = bullets.levels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(glyphs, vec!["●", "○", "■", "●"]);
        assert!(bullets.levels.iter().all(|l| l.format == "bullet"));
        assert!(bullets.levels.iter().all(|l| l.suffix.as_deref() == Some("tab")));
    }

    #[test]
    fn test_default_bullets() {
        let bullets = Numbering::default_bullets();
        assert_eq!(bullets.levels.len(), 9);
        assert_eq!(bullets.levels[4].text, "○");
    }

    #[test]
    fn test_level_defaults() {
        let numbering: Numbering = toml::from_str("[[levels]]\ntext = \"%1\"").unwrap();
        assert_eq!(numbering.levels[0].format, "decimal");
        assert_eq!(numbering.levels[0].start, 1);
    }
}
