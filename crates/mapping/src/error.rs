use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MappingError {
    #[error("Path parse error in '{0}': {1}")]
    PathParse(String, String),
}
