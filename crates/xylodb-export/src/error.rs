//! Error types for the export engine.
//!
//! The engine distinguishes three severity tiers behaviorally rather than in
//! the type: fatal failures abort the export, per-collection failures skip
//! one collection, per-document failures skip one payload. All tiers are
//! carried by [`ExportError`]; the exporter decides how far each one
//! propagates.

use thiserror::Error;
use xylodb_core::CoreError;

/// Errors that can occur while exporting a database.
#[derive(Debug, Error)]
pub enum ExportError {
    /// An I/O error from the archive or the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A zip container error.
    #[error("zip error: {0}")]
    Zip(String),

    /// A record, key, or name failed to decode.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The storage broker reported a failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// A backup manifest could not be parsed.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// The status callback requested cooperative termination.
    #[error("export terminated")]
    Terminated,

    /// An archive sink operation was called out of sequence.
    #[error("invalid sink state: {0}")]
    InvalidState(String),
}

impl ExportError {
    /// Returns `true` if this error is a cooperative termination request,
    /// which must abort the traversal instead of being swallowed.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Zip(e.to_string())
    }
}

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
