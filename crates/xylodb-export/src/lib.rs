//! XyloDB Export
//!
//! This crate provides the failsafe system export engine for XyloDB
//! databases: it walks the on-disk collection and document indices directly
//! (bypassing the transactional read path), reconstructs the logical tree
//! of collections and resources, and emits a self-describing, restorable
//! backup archive.
//!
//! # Overview
//!
//! - Descendant collections are exported even when an ancestor collection
//!   is corrupted.
//! - Intact documents whose parent collection was destroyed are rescued
//!   into the `/db/__lost_and_found__` collection.
//! - Documents flagged by the consistency checker are removed from the
//!   backup.
//! - Incremental archives skip unchanged payloads and record deletions
//!   against their predecessor.
//!
//! # Example
//!
//! ```ignore
//! use xylodb_export::{ExportOptions, SystemExporter};
//!
//! let mut exporter = SystemExporter::new(&broker, false);
//! let options = ExportOptions::new("/var/backups/xylodb").incremental(true);
//! let archive = exporter.export(&options, &consistency_errors);
//! ```
//!
//! # Modules
//!
//! - [`exporter`] - The export engine ([`SystemExporter`], [`ExportOptions`])
//! - [`broker`] - Storage broker contract consumed by the engine
//! - [`archive`] - Archive sinks (directory tree, zip)
//! - [`backup`] - Prior-backup discovery and descriptors
//! - [`manifest`] - Collection manifest schema and reader
//! - [`serializer`] - SAX-style receiver and XML rendering
//! - [`stream`] - Node-tree to receiver-event rendering
//! - [`progress`] - Status callbacks and percent tracking
//! - [`report`] - Consistency-check error reports
//! - [`error`] - Error types ([`ExportError`])

pub mod archive;
pub mod backup;
pub mod broker;
pub mod error;
pub mod exporter;
pub mod manifest;
pub mod progress;
pub mod report;
pub mod serializer;
pub mod stream;

// Re-export commonly used types
pub use archive::{ArchiveWriter, FileSystemWriter, ZipArchiveWriter};
pub use backup::{BackupDescriptor, BackupDirectory, BackupProperties};
pub use broker::{
    Attribute, NamespaceDecl, NodeHandle, NodeKind, ReadContext, ScanNext, StorageBroker,
    StreamEvent, XmlStreamReader,
};
pub use error::{ExportError, ExportResult};
pub use exporter::{ExportOptions, SystemExporter};
pub use progress::{ProgressObserver, ProgressTracker, StatusCallback};
pub use report::ErrorReport;
