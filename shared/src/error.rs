//! Error types for the appointment service.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while handling appointment requests.
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Storage-level rejection (required field missing, commit failure, ...)
    #[error("Storage error: {0}")]
    Storage(String),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::Serialization(_) => 400,
            _ => 500,
        }
    }

    /// Whether the failure came from the persistence layer.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Storage(_))
    }
}
