use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Base template has no pages")]
    EmptyBase,

    #[error("{0}")]
    Other(String),
}
