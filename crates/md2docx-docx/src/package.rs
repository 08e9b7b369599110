//! Zip packaging of the document parts.

use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::body::Media;
use crate::error::DocxError;

pub(crate) const CONTENT_TYPES: &str = "[Content_Types].xml";
pub(crate) const DOCUMENT: &str = "word/document.xml";
pub(crate) const STYLES: &str = "word/styles.xml";
pub(crate) const NUMBERING: &str = "word/numbering.xml";

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpg" ContentType="image/jpeg"/><Default Extension="jpeg" ContentType="image/jpeg"/><Default Extension="gif" ContentType="image/gif"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/></Types>"#;

/// Serialized parts of one document.
pub(crate) struct Parts<'a> {
    pub document: &'a str,
    pub document_rels: &'a str,
    pub styles: &'a str,
    pub numbering: &'a str,
    pub media: &'a [Media],
}

/// Zip `parts` into a package.
pub(crate) fn write_package(parts: &Parts<'_>) -> Result<Vec<u8>, DocxError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (path, contents) in [
        (CONTENT_TYPES, CONTENT_TYPES_XML),
        ("_rels/.rels", ROOT_RELS),
        (DOCUMENT, parts.document),
        ("word/_rels/document.xml.rels", parts.document_rels),
        (STYLES, parts.styles),
        (NUMBERING, parts.numbering),
    ] {
        zip.start_file(path, options)?;
        zip.write_all(contents.as_bytes())?;
    }

    for media in parts.media {
        zip.start_file(format!("word/{}", media.path), options)?;
        zip.write_all(&media.data)?;
    }

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::rc::Rc;

    use zip::ZipArchive;

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_package_entries() {
        let media = [Media {
            path: "media/image1.png".to_owned(),
            data: Rc::from(&b"\x89PNG"[..]),
        }];
        let bytes = write_package(&Parts {
            document: "<w:document/>",
            document_rels: "<Relationships/>",
            styles: "<w:styles/>",
            numbering: "<w:numbering/>",
            media: &media,
        })
        .unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_owned).collect();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "word/document.xml",
                "word/_rels/document.xml.rels",
                "word/styles.xml",
                "word/numbering.xml",
                "word/media/image1.png",
            ]
        );

        let mut styles = String::new();
        archive
            .by_name(STYLES)
            .unwrap()
            .read_to_string(&mut styles)
            .unwrap();
        assert_eq!(styles, "<w:styles/>");
    }
}
