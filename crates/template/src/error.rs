use thiserror::Error;

/// Errors raised while loading or interpreting template metadata
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Unsupported template kind: {0}")]
    UnsupportedKind(String),

    #[error("Invalid template configuration: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
