//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Input record could not be decoded.
    #[error("Record parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither the structured sender nor the header yielded a usable
    /// participant; the record is skipped whole.
    #[error("no valid sender in {file}")]
    NoValidSender {
        /// Source filename of the record.
        file: String,
    },

    /// Duplicate linkage was refused.
    #[error(transparent)]
    Duplicate(#[from] crate::duplicates::DuplicateError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
