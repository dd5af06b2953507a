//! Error types for FormScan.
//!
//! Only document-level and start-up failures live here. A field that does not
//! match its rule is represented as an absent value, never as an error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error aborts processing of a single document only
    /// (as opposed to a start-up failure that stops the process).
    pub fn is_document_level(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::UnsupportedFormat(_) | Self::InvalidInput(_) | Self::Ocr(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
