//! Word document model and `.docx` packaging for md2docx.
//!
//! A [`Document`] is a list of [`Section`]s, each carrying its own page
//! geometry, holding [`Block`]s built from the model types in this crate.
//! [`Document::to_bytes`] writes the body, styles and numbering parts from
//! the document-level [`md2docx_config::Config`], zips them together with
//! any embedded media, and finally patches paragraph properties the part
//! writers leave out (character-based indents and `w:snapToGrid`).
//!
//! # Example
//!
//! ```ignore
//! use md2docx_config::Config;
//! use md2docx_docx::{Document, Inline, Paragraph};
//!
//! let config = Config::default();
//! let mut document = Document::new(config.clone());
//! document
//!     .add_section(config)
//!     .push(Paragraph::new(vec![Inline::text("Hello")]).with_style("normalIndent"));
//! let bytes = document.to_bytes()?;
//! ```

mod body;
mod document;
mod error;
mod model;
mod numbering;
mod package;
mod patch;
mod props;
mod styles;
mod xml;

pub use document::{Document, Section};
pub use error::DocxError;
pub use model::{
    Block, ComplexField, ImageRun, Inline, NumberingRef, Paragraph, RunOptions, Table, TableCell,
    TableRow, TableWidth, TextCell, TextRun, VertAlign,
};

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use md2docx_config::Config;
    use zip::ZipArchive;

    use super::*;
    use pretty_assertions::assert_eq;

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut text = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        text
    }

    #[test]
    fn test_to_bytes_writes_patched_package() {
        let config = Config::load(
            r#"
[style.normal.run]
snapToGrid = false
"#,
        )
        .unwrap();
        let mut document = Document::new(config.clone());
        let section = document.add_section(config);
        section.push(Paragraph::new(vec![Inline::text("第一段")]).with_style("normalIndent"));
        section.push(Paragraph {
            numbering: Some(NumberingRef {
                reference: "bullet".to_owned(),
                level: 0,
                instance: 1,
            }),
            ..Paragraph::new(vec![Inline::text("item")])
        });

        let bytes = document.to_bytes().unwrap();

        let body = read_entry(&bytes, "word/document.xml");
        assert!(body.contains(r#"<w:pStyle w:val="normalIndent"/>"#));
        assert!(body.contains(r#"<w:t xml:space="preserve">第一段</w:t>"#));
        assert!(body.contains(r#"<w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr>"#));

        let styles = read_entry(&bytes, "word/styles.xml");
        assert!(styles.contains(r#"<w:ind w:left="0" w:right="0" w:firstLineChars="200"/>"#));
        assert!(styles.contains(r#"<w:snapToGrid w:val="0"/>"#));

        let numbering = read_entry(&bytes, "word/numbering.xml");
        assert!(numbering.contains(r#"<w:num w:numId="1"><w:abstractNumId w:val="0"/>"#));
    }

    #[test]
    fn test_empty_document_is_a_valid_package() {
        let document = Document::new(Config::default());

        let bytes = document.to_bytes().unwrap();

        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        assert_eq!(archive.len(), 6);
        let body = read_entry(&bytes, "word/document.xml");
        assert!(body.contains("<w:body><w:sectPr>"));
    }
}
