//! Minimal streaming XML builder for package parts.

use std::fmt::{Display, Write};

use quick_xml::escape::escape;

pub(crate) const DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Namespace of WordprocessingML.
pub(crate) const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// Namespace of officeDocument relationships.
pub(crate) const NS_R: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Output buffer of one XML part.
#[derive(Debug, Default)]
pub(crate) struct Xml {
    out: String,
}

/// An element whose start tag is still open for attributes.
#[must_use]
pub(crate) struct Tag<'a> {
    xml: &'a mut Xml,
}

impl Xml {
    /// Buffer starting with the XML declaration.
    pub fn document() -> Self {
        let mut out = String::with_capacity(8192);
        out.push_str(DECLARATION);
        Self { out }
    }

    /// Begin `<tag`.
    pub fn open(&mut self, tag: &str) -> Tag<'_> {
        self.out.push('<');
        self.out.push_str(tag);
        Tag { xml: self }
    }

    /// `</tag>`
    pub fn close(&mut self, tag: &str) -> &mut Self {
        let _ = write!(self.out, "</{tag}>");
        self
    }

    /// `<tag>`
    pub fn start(&mut self, tag: &str) -> &mut Self {
        self.open(tag).end();
        self
    }

    /// `<tag/>`
    pub fn empty(&mut self, tag: &str) -> &mut Self {
        self.open(tag).empty();
        self
    }

    /// `<tag w:val="value"/>`
    pub fn val(&mut self, tag: &str, value: impl Display) -> &mut Self {
        self.open(tag).attr("w:val", value).empty();
        self
    }

    /// On/off property: `<tag/>` when set, `<tag w:val="0"/>` when cleared.
    pub fn flag(&mut self, tag: &str, on: bool) -> &mut Self {
        if on {
            self.empty(tag)
        } else {
            self.val(tag, 0)
        }
    }

    /// Escaped character data.
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.out.push_str(&escape(text));
        self
    }

    pub fn into_string(self) -> String {
        self.out
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.out
    }
}

impl Tag<'_> {
    pub fn attr(self, name: &str, value: impl Display) -> Self {
        let value = value.to_string();
        let _ = write!(self.xml.out, r#" {name}="{}""#, escape(value.as_str()));
        self
    }

    pub fn attr_opt(self, name: &str, value: Option<impl Display>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    /// Finish as a start tag.
    pub fn end(self) {
        self.xml.out.push('>');
    }

    /// Finish as a self-closing tag.
    pub fn empty(self) {
        self.xml.out.push_str("/>");
    }
}
