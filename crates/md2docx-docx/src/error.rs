//! Error types for document serialization.

use std::string::FromUtf8Error;

use md2docx_config::ConfigError;

/// Error while serializing or patching a package.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DocxError {
    /// Zip archive error.
    #[error("zip error")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// XML parse error while patching a part.
    #[error("XML parse error")]
    XmlParse(#[from] quick_xml::Error),

    /// XML attribute error while patching a part.
    #[error("XML attribute error")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// A package part is not valid UTF-8.
    #[error("UTF-8 error")]
    Utf8(#[from] FromUtf8Error),

    /// Style resolution failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
