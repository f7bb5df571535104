use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Crate-wide error type.
///
/// Only structural failures end up here (unreadable file, unreachable store,
/// bad configuration). Data-quality problems are never errors: they are
/// reported per row by the validator.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum AppError {
    #[error("Empty file: a header row and at least one data row are required")]
    EmptyFile,
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Geocode error: {0}")]
    GeocodeError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Structural failures that are worth retrying as-is (backend hiccups).
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::DatabaseError(_) | AppError::IoError(_))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
