//! Errors of the conversion pipeline.

use md2docx_config::ConfigError;
use md2docx_docx::DocxError;
use md2docx_markdown::TransformError;
use md2docx_storage::StorageError;

/// Error from any stage of a conversion.
///
/// Every variant aborts the whole conversion; there is no partial output.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Docx(#[from] DocxError),
}
