//! Error types for the core crate.

use thiserror::Error;

/// Errors that can occur in the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A database URI is malformed.
    #[error("invalid database URI: {0}")]
    InvalidUri(String),

    /// An index key is malformed or truncated.
    #[error("invalid index key: {0}")]
    InvalidKey(String),
}

impl CoreError {
    /// Creates an encoding error from any displayable cause.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
