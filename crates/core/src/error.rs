//! The unified error type for render pipeline operations.

use formfill_template::TemplateError;
use thiserror::Error;

/// Everything `Renderer::render` can fail with.
///
/// Per-field image/signature failures are not here on purpose: they are
/// logged and skipped, never fatal to a page. Everything else is
/// all-or-nothing; no partial PDF bytes are ever returned.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Unsupported template kind: {0}")]
    UnsupportedKind(String),

    #[error("Payload rejected by template schema: {0}")]
    SchemaValidation(String),

    #[error("Document conversion failed: {0}")]
    Conversion(String),

    #[error("Template configuration error: {0}")]
    Config(String),

    #[error("PDF processing error: {0}")]
    Pdf(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Overlay rendering error: {0}")]
    Overlay(#[from] formfill_overlay::OverlayError),

    #[error("Page merge error: {0}")]
    Compose(#[from] formfill_compose::ComposeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<TemplateError> for RenderError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::NotFound(id) => RenderError::TemplateNotFound(id),
            TemplateError::UnsupportedKind(kind) => RenderError::UnsupportedKind(kind),
            TemplateError::Parse(msg) => RenderError::Config(msg),
            TemplateError::Io(e) => RenderError::Io(e),
            TemplateError::Json(e) => RenderError::Json(e),
        }
    }
}

impl From<lopdf::Error> for RenderError {
    fn from(err: lopdf::Error) -> Self {
        RenderError::Pdf(err.to_string())
    }
}

impl From<zip::result::ZipError> for RenderError {
    fn from(err: zip::result::ZipError) -> Self {
        RenderError::Archive(err.to_string())
    }
}
