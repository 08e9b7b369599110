//! `word/numbering.xml`.
//!
//! One abstract definition per configured numbering, in name order; the
//! position in that order is the `w:abstractNumId`. Every `(reference,
//! instance)` pair used by the body becomes a `w:num` that restarts all
//! levels at their start values.

use md2docx_config::Config;
use md2docx_config::numbering::Level;
use md2docx_config::style::Alignment;

use crate::body::NumberingInstances;
use crate::props;
use crate::xml::{NS_W, Xml};

/// `w:abstractNumId` of a numbering definition.
pub(crate) fn abstract_id(config: &Config, reference: &str) -> Option<usize> {
    config.numbering.keys().position(|name| name == reference)
}

pub(crate) fn write_numbering(config: &Config, instances: &NumberingInstances) -> String {
    let mut xml = Xml::document();
    xml.open("w:numbering").attr("xmlns:w", NS_W).end();

    for (id, numbering) in config.numbering.values().enumerate() {
        xml.open("w:abstractNum").attr("w:abstractNumId", id).end();
        let kind = if numbering.levels.len() > 1 {
            "multilevel"
        } else {
            "singleLevel"
        };
        xml.val("w:multiLevelType", kind);
        for (ilvl, level) in numbering.levels.iter().enumerate() {
            write_level(&mut xml, ilvl, level);
        }
        xml.close("w:abstractNum");
    }

    for (index, (reference, _)) in instances.used.iter().enumerate() {
        let (Some(abstract_id), Some(numbering)) = (
            abstract_id(config, reference),
            config.numbering.get(reference),
        ) else {
            continue;
        };
        xml.open("w:num").attr("w:numId", index + 1).end();
        xml.val("w:abstractNumId", abstract_id);
        for (ilvl, level) in numbering.levels.iter().enumerate() {
            xml.open("w:lvlOverride").attr("w:ilvl", ilvl).end();
            xml.val("w:startOverride", level.start);
            xml.close("w:lvlOverride");
        }
        xml.close("w:num");
    }

    xml.close("w:numbering");
    xml.into_string()
}

fn write_level(xml: &mut Xml, ilvl: usize, level: &Level) {
    xml.open("w:lvl").attr("w:ilvl", ilvl).end();
    xml.val("w:start", level.start);
    xml.val("w:numFmt", &level.format);
    if let Some(suffix) = &level.suffix {
        xml.val("w:suff", suffix);
    }
    if level.text.is_empty() {
        xml.val("w:lvlText", format!("%{}.", ilvl + 1));
    } else {
        xml.val("w:lvlText", &level.text);
    }
    xml.val(
        "w:lvlJc",
        level.alignment.map_or("left", Alignment::as_str),
    );
    if let Some(style) = &level.style {
        props::paragraph_properties_element(xml, style.paragraph.as_ref());
        props::run_properties_element(xml, style.run.as_ref());
    }
    xml.close("w:lvl");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_levels_and_instances() {
        let config = Config::load(
            r#"
[[numbering.heading.levels]]
format = "chineseCounting"
text = "%1、"
suffix = "nothing"

[[numbering.heading.levels]]
text = "%1.%2"
start = 0
"#,
        )
        .unwrap();
        let instances = NumberingInstances {
            used: vec![("heading".to_owned(), 1), ("heading".to_owned(), 2)],
        };

        let xml = write_numbering(&config, &instances);

        // `bullet` is synthesized and sorts before `heading`.
        assert_eq!(abstract_id(&config, "heading"), Some(1));
        assert!(xml.contains(concat!(
            r#"<w:abstractNum w:abstractNumId="1"><w:multiLevelType w:val="multilevel"/>"#,
            r#"<w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="chineseCounting"/>"#,
            r#"<w:suff w:val="nothing"/><w:lvlText w:val="%1、"/><w:lvlJc w:val="left"/></w:lvl>"#,
            r#"<w:lvl w:ilvl="1"><w:start w:val="0"/><w:numFmt w:val="decimal"/>"#,
            r#"<w:lvlText w:val="%1.%2"/><w:lvlJc w:val="left"/></w:lvl></w:abstractNum>"#,
        )));
        assert!(xml.contains(concat!(
            r#"<w:num w:numId="2"><w:abstractNumId w:val="1"/>"#,
            r#"<w:lvlOverride w:ilvl="0"><w:startOverride w:val="1"/></w:lvlOverride>"#,
            r#"<w:lvlOverride w:ilvl="1"><w:startOverride w:val="0"/></w:lvlOverride></w:num>"#,
        )));
    }

    #[test]
    fn test_default_bullets_carry_indent() {
        let xml = write_numbering(&Config::default(), &NumberingInstances::default());

        assert!(xml.contains(concat!(
            r#"<w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/>"#,
            r#"<w:suff w:val="tab"/><w:lvlText w:val="●"/><w:lvlJc w:val="left"/>"#,
            r#"<w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>"#,
        )));
        assert!(!xml.contains("<w:num "));
    }
}
