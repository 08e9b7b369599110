//! Errors raised while transforming a markdown tree.

use md2docx_storage::StorageError;

/// Error from a visitor or loader.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// No loader accepts the embed url.
    #[error("no loader accepts embed url `{url}`")]
    UnresolvedEmbed { url: String },

    #[error("`{directive}` directive is missing required attribute `{attribute}`")]
    MissingAttribute {
        directive: &'static str,
        attribute: &'static str,
    },

    /// Image bytes could not be decoded.
    #[error("cannot read image `{url}`: {source}")]
    Image {
        url: String,
        #[source]
        source: image::ImageError,
    },

    /// Remote image download failed.
    #[error("cannot fetch `{url}`: {message}")]
    Fetch { url: String, message: String },

    /// A loader failed for its own reasons.
    #[error("{loader} loader failed: {source}")]
    Loader {
        loader: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
