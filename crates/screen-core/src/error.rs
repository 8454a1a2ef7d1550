use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("Store API error: {0}")]
    Api(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),
}
