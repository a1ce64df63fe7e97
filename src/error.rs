//! Error types for Quill.

use thiserror::Error;

/// Common error type for Quill.
#[derive(Error, Debug)]
pub enum QuillError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error (bad credentials, missing or invalid session).
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error (acting on another user's resource).
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Object storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for QuillError {
    fn from(e: sqlx::Error) -> Self {
        QuillError::Database(e.to_string())
    }
}

/// Result type alias for Quill operations.
pub type Result<T> = std::result::Result<T, QuillError>;
