//! Post-serialization patch of the styles and numbering parts.
//!
//! Two paragraph properties are never written by the part writers:
//! character-based indentation (`w:*Chars` on `w:ind`) and `w:snapToGrid`.
//! After the package is zipped, this module reopens it, streams
//! `word/styles.xml` and `word/numbering.xml` through a reader/writer pair,
//! and rewrites the `w:pPr` of every style or numbering level that asks for
//! either property.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use md2docx_config::Config;
use md2docx_config::style::{Indent, Style};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::DocxError;
use crate::package::{NUMBERING, STYLES};
use crate::styles;

/// `w:pPr` children that come after `w:snapToGrid` in schema order.
const AFTER_SNAP_TO_GRID: [&[u8]; 15] = [
    b"w:spacing",
    b"w:ind",
    b"w:contextualSpacing",
    b"w:mirrorIndents",
    b"w:suppressOverlap",
    b"w:jc",
    b"w:textDirection",
    b"w:textAlignment",
    b"w:textboxTightWrap",
    b"w:outlineLvl",
    b"w:divId",
    b"w:cnfStyle",
    b"w:rPr",
    b"w:sectPr",
    b"w:pPrChange",
];

/// What to force into one scope's paragraph properties.
#[derive(Debug, Clone, PartialEq)]
struct Rule {
    snap_to_grid: Option<bool>,
    indent: Option<Indent>,
}

impl Rule {
    fn from_style(style: &Style) -> Option<Self> {
        let rule = Self {
            snap_to_grid: style.run.as_ref().and_then(|run| run.snap_to_grid),
            indent: style
                .paragraph
                .as_ref()
                .and_then(|paragraph| paragraph.indent.clone()),
        };
        (rule.snap_to_grid.is_some() || rule.indent.is_some()).then_some(rule)
    }
}

/// Rules keyed by how their scope element is found.
#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    /// `w:style` by `w:styleId`.
    Styles(&'a HashMap<String, Rule>),
    /// `w:lvl` by enclosing `w:abstractNumId` and own `w:ilvl`.
    Levels(&'a HashMap<(String, String), Rule>),
}

/// Patch the styles and numbering parts of `package`.
pub(crate) fn patch_package(package: &[u8], config: &Config) -> Result<Vec<u8>, DocxError> {
    let style_rules = style_rules(config)?;
    let level_rules = level_rules(config);
    if style_rules.is_empty() && level_rules.is_empty() {
        return Ok(package.to_vec());
    }
    debug!(
        styles = style_rules.len(),
        levels = level_rules.len(),
        "Patching paragraph properties"
    );

    let mut archive = ZipArchive::new(Cursor::new(package))?;
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let name = file.name().to_owned();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;

        let target = match name.as_str() {
            STYLES => Some(Target::Styles(&style_rules)),
            NUMBERING => Some(Target::Levels(&level_rules)),
            _ => None,
        };
        if let Some(target) = target {
            contents = patch_xml(&String::from_utf8(contents)?, target)?;
        }

        zip.start_file(name, options)?;
        zip.write_all(&contents)?;
    }

    Ok(zip.finish()?.into_inner())
}

fn style_rules(config: &Config) -> Result<HashMap<String, Rule>, DocxError> {
    Ok(styles::style_defs(config)?
        .into_iter()
        .filter_map(|def| Rule::from_style(&def.style).map(|rule| (def.id, rule)))
        .collect())
}

fn level_rules(config: &Config) -> HashMap<(String, String), Rule> {
    let mut rules = HashMap::new();
    for (abstract_id, numbering) in config.numbering.values().enumerate() {
        for (ilvl, level) in numbering.levels.iter().enumerate() {
            if let Some(rule) = level.style.as_ref().and_then(Rule::from_style) {
                rules.insert((abstract_id.to_string(), ilvl.to_string()), rule);
            }
        }
    }
    rules
}

fn patch_xml(xml: &str, target: Target<'_>) -> Result<Vec<u8>, DocxError> {
    let mut patcher = Patcher {
        target,
        writer: Writer::new(Vec::with_capacity(xml.len())),
        depth: 0,
        abstract_num: None,
        scope: None,
        properties: None,
        skip: None,
    };

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => patcher.start(e)?,
            Event::Empty(e) => patcher.empty(e)?,
            Event::End(e) => patcher.end(e)?,
            other => {
                if patcher.skip.is_none() {
                    patcher.writer.write_event(other)?;
                }
            }
        }
    }
    Ok(patcher.writer.into_inner())
}

/// An open `w:pPr` inside a scope.
#[derive(Debug)]
struct Properties {
    depth: usize,
    snap_written: bool,
}

struct Patcher<'a> {
    target: Target<'a>,
    writer: Writer<Vec<u8>>,
    /// Number of open elements.
    depth: usize,
    /// `w:abstractNumId` of the enclosing abstract numbering.
    abstract_num: Option<String>,
    /// Depth of the matched scope element and its rule.
    scope: Option<(usize, &'a Rule)>,
    properties: Option<Properties>,
    /// Depth of an element being dropped with its content.
    skip: Option<usize>,
}

impl<'a> Patcher<'a> {
    /// The rule when `level` is a direct child of a scoped `w:pPr`.
    fn property_rule(&self, level: usize) -> Option<&'a Rule> {
        let (_, rule) = self.scope?;
        let properties = self.properties.as_ref()?;
        (properties.depth + 1 == level).then_some(rule)
    }

    fn start(&mut self, e: BytesStart<'_>) -> Result<(), DocxError> {
        let level = self.depth;
        self.depth += 1;
        if self.skip.is_some() {
            return Ok(());
        }

        if let Some(rule) = self.property_rule(level) {
            if e.name().as_ref() == b"w:snapToGrid" && rule.snap_to_grid.is_some() {
                self.skip = Some(level);
                return Ok(());
            }
            self.before_property(e.name().as_ref(), rule)?;
            return self.write_property(e, rule, false);
        }

        if self.scope.is_none() {
            if let Some(rule) = self.match_scope(&e)? {
                self.scope = Some((level, rule));
            }
        } else if self.properties.is_none() && e.name().as_ref() == b"w:pPr" {
            self.properties = Some(Properties {
                depth: level,
                snap_written: false,
            });
        }
        self.writer.write_event(Event::Start(e))?;
        Ok(())
    }

    fn empty(&mut self, e: BytesStart<'_>) -> Result<(), DocxError> {
        let level = self.depth;
        if self.skip.is_some() {
            return Ok(());
        }

        if let Some(rule) = self.property_rule(level) {
            if e.name().as_ref() == b"w:snapToGrid" && rule.snap_to_grid.is_some() {
                return Ok(());
            }
            self.before_property(e.name().as_ref(), rule)?;
            return self.write_property(e, rule, true);
        }

        if let Some((_, rule)) = self.scope
            && self.properties.is_none()
            && e.name().as_ref() == b"w:pPr"
            && let Some(on) = rule.snap_to_grid
        {
            self.writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
            self.writer.write_event(Event::Empty(snap_to_grid(on)))?;
            self.writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
            return Ok(());
        }

        self.writer.write_event(Event::Empty(e))?;
        Ok(())
    }

    fn end(&mut self, e: BytesEnd<'_>) -> Result<(), DocxError> {
        self.depth = self.depth.saturating_sub(1);
        let level = self.depth;
        if let Some(skip) = self.skip {
            if skip == level {
                self.skip = None;
            }
            return Ok(());
        }

        if self
            .properties
            .as_ref()
            .is_some_and(|properties| properties.depth == level)
        {
            if let Some((_, rule)) = self.scope {
                self.flush_snap(rule)?;
            }
            self.properties = None;
        }
        if self.scope.is_some_and(|(depth, _)| depth == level) {
            self.scope = None;
        }
        if e.name().as_ref() == b"w:abstractNum" {
            self.abstract_num = None;
        }
        self.writer.write_event(Event::End(e))?;
        Ok(())
    }

    /// Find the rule for a scope element, tracking the enclosing abstract
    /// numbering on the way.
    fn match_scope(&mut self, e: &BytesStart<'_>) -> Result<Option<&'a Rule>, DocxError> {
        match self.target {
            Target::Styles(rules) => {
                if e.name().as_ref() == b"w:style"
                    && let Some(id) = attribute(e, b"w:styleId")?
                {
                    return Ok(rules.get(&id));
                }
            }
            Target::Levels(rules) => match e.name().as_ref() {
                b"w:abstractNum" => self.abstract_num = attribute(e, b"w:abstractNumId")?,
                b"w:lvl" => {
                    if let (Some(abstract_num), Some(ilvl)) =
                        (self.abstract_num.clone(), attribute(e, b"w:ilvl")?)
                    {
                        return Ok(rules.get(&(abstract_num, ilvl)));
                    }
                }
                _ => {}
            },
        }
        Ok(None)
    }

    /// Insert `w:snapToGrid` before the first property that follows it.
    fn before_property(&mut self, name: &[u8], rule: &Rule) -> Result<(), DocxError> {
        if AFTER_SNAP_TO_GRID.contains(&name) {
            self.flush_snap(rule)?;
        }
        Ok(())
    }

    fn flush_snap(&mut self, rule: &Rule) -> Result<(), DocxError> {
        let Some(properties) = self.properties.as_mut() else {
            return Ok(());
        };
        if let Some(on) = rule.snap_to_grid
            && !properties.snap_written
        {
            properties.snap_written = true;
            self.writer.write_event(Event::Empty(snap_to_grid(on)))?;
        }
        Ok(())
    }

    fn write_property(
        &mut self,
        e: BytesStart<'_>,
        rule: &Rule,
        empty: bool,
    ) -> Result<(), DocxError> {
        let e = match &rule.indent {
            Some(indent) if e.name().as_ref() == b"w:ind" => rewrite_indent(&e, indent)?,
            _ => e.into_owned(),
        };
        let event = if empty {
            Event::Empty(e)
        } else {
            Event::Start(e)
        };
        self.writer.write_event(event)?;
        Ok(())
    }
}

fn snap_to_grid(on: bool) -> BytesStart<'static> {
    BytesStart::new("w:snapToGrid").with_attributes([("w:val", if on { "1" } else { "0" })])
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, DocxError> {
    Ok(e.try_get_attribute(name)?.map(|attr| {
        attr.unescape_value()
            .map_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned(), Cow::into_owned)
    }))
}

/// Rebuild `w:ind`: lengths set from the rule (`w:left`/`w:right` default
/// to 0), then every character value set with its length twin removed.
fn rewrite_indent(e: &BytesStart<'_>, indent: &Indent) -> Result<BytesStart<'static>, DocxError> {
    let mut attrs: Vec<(String, String)> = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned(), Cow::into_owned);
        attrs.push((key, value));
    }

    let lengths = indent.length_attributes();
    let length = |name: &str| {
        lengths
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, twips)| *twips)
    };
    for name in ["w:left", "w:right"] {
        set(&mut attrs, name, length(name).unwrap_or(0));
    }
    for name in ["w:hanging", "w:firstLine"] {
        if let Some(twips) = length(name) {
            set(&mut attrs, name, twips);
        }
    }
    for (name, hundredths, twin) in indent.chars_attributes() {
        set(&mut attrs, name, hundredths);
        attrs.retain(|(key, _)| key != twin);
    }

    let mut rewritten = BytesStart::new("w:ind");
    for (key, value) in &attrs {
        rewritten.push_attribute((key.as_str(), value.as_str()));
    }
    Ok(rewritten)
}

fn set(attrs: &mut Vec<(String, String)>, name: &str, value: i64) {
    let value = value.to_string();
    match attrs.iter_mut().find(|(key, _)| key == name) {
        Some(entry) => entry.1 = value,
        None => attrs.push((name.to_owned(), value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn styles(rules: &[(&str, Rule)], xml: &str) -> String {
        let rules: HashMap<String, Rule> = rules
            .iter()
            .map(|(id, rule)| ((*id).to_owned(), rule.clone()))
            .collect();
        String::from_utf8(patch_xml(xml, Target::Styles(&rules)).unwrap()).unwrap()
    }

    fn first_line_chars(chars: f64) -> Indent {
        Indent {
            first_line_chars: Some(chars),
            ..Indent::default()
        }
    }

    #[test]
    fn test_indent_and_snap_in_matching_style_only() {
        let rule = Rule {
            snap_to_grid: Some(false),
            indent: Some(first_line_chars(2.0)),
        };
        let xml = concat!(
            r#"<w:styles><w:style w:styleId="normalIndent"><w:name w:val="x"/>"#,
            r#"<w:pPr><w:spacing w:line="360"/><w:ind w:firstLine="420"/><w:jc w:val="both"/></w:pPr></w:style>"#,
            r#"<w:style w:styleId="other"><w:pPr><w:ind w:firstLine="420"/></w:pPr></w:style></w:styles>"#,
        );

        assert_eq!(
            styles(&[("normalIndent", rule)], xml),
            concat!(
                r#"<w:styles><w:style w:styleId="normalIndent"><w:name w:val="x"/>"#,
                r#"<w:pPr><w:snapToGrid w:val="0"/><w:spacing w:line="360"/>"#,
                r#"<w:ind w:left="0" w:right="0" w:firstLineChars="200"/><w:jc w:val="both"/></w:pPr></w:style>"#,
                r#"<w:style w:styleId="other"><w:pPr><w:ind w:firstLine="420"/></w:pPr></w:style></w:styles>"#,
            )
        );
    }

    #[test]
    fn test_existing_snap_to_grid_is_replaced() {
        let rule = Rule {
            snap_to_grid: Some(true),
            indent: None,
        };
        let xml = r#"<w:style w:styleId="a"><w:pPr><w:snapToGrid w:val="0"/><w:keepNext/></w:pPr><w:rPr><w:b/></w:rPr></w:style>"#;

        assert_eq!(
            styles(&[("a", rule)], xml),
            r#"<w:style w:styleId="a"><w:pPr><w:keepNext/><w:snapToGrid w:val="1"/></w:pPr><w:rPr><w:b/></w:rPr></w:style>"#
        );
    }

    #[test]
    fn test_empty_properties_are_expanded() {
        let rule = Rule {
            snap_to_grid: Some(true),
            indent: Some(first_line_chars(2.0)),
        };
        let xml = r#"<w:style w:styleId="a"><w:pPr/></w:style>"#;

        assert_eq!(
            styles(&[("a", rule)], xml),
            r#"<w:style w:styleId="a"><w:pPr><w:snapToGrid w:val="1"/></w:pPr></w:style>"#
        );
    }

    #[test]
    fn test_hanging_chars_replace_length() {
        let rule = Rule {
            snap_to_grid: None,
            indent: Some(Indent {
                left: Some(md2docx_config::Measure::Raw(720.0)),
                hanging_chars: Some(1.5),
                ..Indent::default()
            }),
        };
        let xml = r#"<w:style w:styleId="a"><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:style>"#;

        assert_eq!(
            styles(&[("a", rule)], xml),
            r#"<w:style w:styleId="a"><w:pPr><w:ind w:left="720" w:right="0" w:hangingChars="150"/></w:pPr></w:style>"#
        );
    }

    #[test]
    fn test_numbering_levels_by_abstract_and_level() {
        let mut rules = HashMap::new();
        rules.insert(
            ("1".to_owned(), "0".to_owned()),
            Rule {
                snap_to_grid: Some(false),
                indent: None,
            },
        );
        let xml = concat!(
            r#"<w:numbering><w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:pPr><w:ind w:left="1"/></w:pPr></w:lvl></w:abstractNum>"#,
            r#"<w:abstractNum w:abstractNumId="1"><w:lvl w:ilvl="0"><w:pPr><w:ind w:left="1"/></w:pPr></w:lvl>"#,
            r#"<w:lvl w:ilvl="1"><w:pPr/></w:lvl></w:abstractNum></w:numbering>"#,
        );

        let patched = String::from_utf8(patch_xml(xml, Target::Levels(&rules)).unwrap()).unwrap();

        assert_eq!(
            patched,
            concat!(
                r#"<w:numbering><w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:pPr><w:ind w:left="1"/></w:pPr></w:lvl></w:abstractNum>"#,
                r#"<w:abstractNum w:abstractNumId="1"><w:lvl w:ilvl="0"><w:pPr><w:snapToGrid w:val="0"/><w:ind w:left="1"/></w:pPr></w:lvl>"#,
                r#"<w:lvl w:ilvl="1"><w:pPr/></w:lvl></w:abstractNum></w:numbering>"#,
            )
        );
    }

    #[test]
    fn test_rules_from_config() {
        let config = Config::load(
            r#"
[style.body.run]
snapToGrid = false

[[numbering.list.levels]]
text = "%1."
style = { paragraph = { indent = { leftChars = 2 } } }
"#,
        )
        .unwrap();

        let style_rules = style_rules(&config).unwrap();
        let level_rules = level_rules(&config);

        assert_eq!(style_rules["body"].snap_to_grid, Some(false));
        assert!(style_rules.contains_key("normalIndent"));
        assert!(!style_rules.contains_key("Normal"));
        // `bullet` is synthesized from `list` and keeps its level style.
        assert!(level_rules.contains_key(&("0".to_owned(), "0".to_owned())));
        assert!(level_rules.contains_key(&("1".to_owned(), "0".to_owned())));
    }
}
