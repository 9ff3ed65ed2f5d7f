use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("PDF content error: {0}")]
    Pdf(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("HTTP fetch error: {0}")]
    Http(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for OverlayError {
    fn from(err: lopdf::Error) -> Self {
        OverlayError::Pdf(err.to_string())
    }
}

impl From<reqwest::Error> for OverlayError {
    fn from(err: reqwest::Error) -> Self {
        OverlayError::Http(err.to_string())
    }
}
