//! Error types for the inkpad note store.

use thiserror::Error;

/// Result type alias using inkpad's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for note store operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found (notebook, note, tombstone, or version ref)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Create/move/copy target already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Invalid input (blank identifiers, source == destination)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// History commit did not complete after a successful filesystem write.
    /// The working tree is ahead of history for this path; never swallowed.
    #[error("Commit failed for {0}")]
    Commit(String),

    /// Registry (tombstone/draft store) operation failed
    #[error("Registry error: {0}")]
    Registry(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// True when the error means "the thing you asked for does not exist",
    /// as opposed to a storage fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
