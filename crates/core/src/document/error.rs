//! Document error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Document operation errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Extension has no known content type and the policy rejects it.
    #[error("unsupported file type '{extension}' for {filename}")]
    UnsupportedExtension {
        /// Filename as sent by the client.
        filename: String,
        /// Extracted extension (may be empty).
        extension: String,
    },

    /// A required form field was not sent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Email cannot be used as a per-user key prefix.
    #[error("invalid email for storage key: {0}")]
    InvalidEmail(String),

    /// The request contained no file parts.
    #[error("no files in upload")]
    NoFiles,

    /// Two files in one upload resolve to the same key.
    #[error("duplicate storage key in upload: {0}")]
    DuplicateKey(String),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DocumentError {
    /// Create an unsupported extension error.
    #[must_use]
    pub fn unsupported_extension(filename: impl Into<String>, extension: impl Into<String>) -> Self {
        Self::UnsupportedExtension {
            filename: filename.into(),
            extension: extension.into(),
        }
    }
}
