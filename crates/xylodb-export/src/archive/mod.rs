//! Archive sinks.
//!
//! An [`ArchiveWriter`] is the uniform, scoped write target for one backup
//! archive: collection scopes contain a manifest stream and one entry per
//! resource payload, plus a single `backup.properties` sidecar at the
//! archive root. Two interchangeable backends exist: a real directory tree
//! ([`FileSystemWriter`]) and a zip container ([`ZipArchiveWriter`]).
//!
//! Scope discipline is the caller's job: `new_collection`/`close_collection`
//! and `new_entry`/`close_entry` must pair on every exit path. The
//! exporters guarantee this by capturing the scope body's result and
//! closing before propagating it.

mod fs;
mod zip;

pub use fs::FileSystemWriter;
pub use zip::ZipArchiveWriter;

use std::io::Write;

use crate::backup::BackupProperties;
use crate::error::ExportResult;

/// Scoped writer over one backup archive.
///
/// Paths handed to [`ArchiveWriter::new_collection`] are absolute,
/// safe-encoded collection paths (e.g. `/db/my%20coll`); entry names are
/// safe-encoded file names. The backend maps them into its container with
/// the database root as the top-level `db` segment.
pub trait ArchiveWriter {
    /// Write the `backup.properties` sidecar at the archive root. Called
    /// once, before any collection scope is opened.
    ///
    /// # Errors
    ///
    /// Returns an error if the sidecar cannot be written.
    fn set_properties(&mut self, properties: &BackupProperties) -> ExportResult<()>;

    /// Open a collection scope for the given safe-encoded absolute path.
    ///
    /// # Errors
    ///
    /// Returns an error if the scope cannot be created in the container.
    fn new_collection(&mut self, path: &str) -> ExportResult<()>;

    /// Close the innermost collection scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the scope cannot be finalized.
    fn close_collection(&mut self) -> ExportResult<()>;

    /// Open the manifest stream for the current collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest stream cannot be opened.
    fn new_contents(&mut self) -> ExportResult<&mut dyn Write>;

    /// Flush and close the manifest stream.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn close_contents(&mut self) -> ExportResult<()>;

    /// Open one resource payload stream in the current collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be created.
    fn new_entry(&mut self, name: &str) -> ExportResult<&mut dyn Write>;

    /// Close the current resource payload stream.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn close_entry(&mut self) -> ExportResult<()>;

    /// Finalize the archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be finalized.
    fn close(&mut self) -> ExportResult<()>;
}

/// Normalize a safe-encoded absolute collection path to a container-relative
/// one: `/db/x` becomes `db/x`.
pub(crate) fn relative_collection_path(path: &str) -> &str {
    path.trim_start_matches('/')
}
