//! The system export engine.
//!
//! [`SystemExporter`] walks the collection and document indices directly
//! through the failsafe broker scans, reconstructs the collection tree, and
//! writes a restorable backup archive. It tries to preserve as much data as
//! possible: descendant collections are exported even when an ancestor is
//! corrupted, documents whose parent collection was destroyed are rescued
//! into `/db/__lost_and_found__`, and documents flagged by the consistency
//! checker are left out of the archive.
//!
//! The engine never mutates the database; all failures short of archive
//! allocation degrade gracefully and are surfaced through the
//! [`StatusCallback`](crate::progress::StatusCallback).

mod collection;
mod document;
mod orphan;

use std::path::PathBuf;

use tracing::{info, warn};
use xylodb_core::{time, DocumentSet};

use crate::archive::{ArchiveWriter, FileSystemWriter, ZipArchiveWriter};
use crate::backup::{
    BackupDescriptor, BackupDirectory, BackupProperties, PROP_DATE, PROP_INCREMENTAL,
    PROP_NR_IN_SEQUENCE, PROP_PREVIOUS,
};
use crate::broker::{ReadContext, ScanNext, StorageBroker};
use crate::error::{ExportError, ExportResult};
use crate::progress::{ProgressObserver, StatusCallback};
use crate::report::ErrorReport;

/// Inputs of one `export` invocation.
///
/// # Example
///
/// ```
/// use xylodb_export::ExportOptions;
///
/// let options = ExportOptions::new("/var/backups/xylodb")
///     .incremental(true)
///     .max_incremental(10)
///     .zip(true);
/// # let _ = options;
/// ```
#[derive(Debug, Clone)]
pub struct ExportOptions {
    target_dir: PathBuf,
    incremental: bool,
    max_incremental: i64,
    zip: bool,
}

impl ExportOptions {
    /// Target the given backup directory; full backup, directory tree
    /// output, no chain cap.
    #[must_use]
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self { target_dir: target_dir.into(), incremental: false, max_incremental: -1, zip: false }
    }

    /// Request an incremental backup against the most recent archive in the
    /// target directory.
    #[must_use]
    pub const fn incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    /// Cap the incremental chain length; reaching the cap silently promotes
    /// the export to a full backup. `-1` disables the cap.
    #[must_use]
    pub const fn max_incremental(mut self, max: i64) -> Self {
        self.max_incremental = max;
        self
    }

    /// Write a zip container instead of a directory tree.
    #[must_use]
    pub const fn zip(mut self, zip: bool) -> Self {
        self.zip = zip;
        self
    }
}

/// Failsafe database exporter.
///
/// Construct one per export run; the cached collection count assumes the
/// index does not change underneath the run.
pub struct SystemExporter<'a, B: StorageBroker> {
    broker: &'a B,
    callback: Option<&'a mut dyn StatusCallback>,
    observer: Option<&'a mut dyn ProgressObserver>,
    direct_access: bool,
    collection_count: Option<usize>,
}

impl<'a, B: StorageBroker> SystemExporter<'a, B> {
    /// Create an exporter over the given broker. `direct_access` makes the
    /// document-index scan bypass caches.
    #[must_use]
    pub fn new(broker: &'a B, direct_access: bool) -> Self {
        Self { broker, callback: None, observer: None, direct_access, collection_count: None }
    }

    /// Attach a status callback.
    #[must_use]
    pub fn with_callback(mut self, callback: &'a mut dyn StatusCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Attach a percent-complete observer.
    #[must_use]
    pub fn with_observer(mut self, observer: &'a mut dyn ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Export the database, preserving as much data as possible.
    ///
    /// `error_list` carries the consistency checker's findings; damaged
    /// documents are excluded and damaged collections are skipped so their
    /// intact documents can be rescued by the orphan pass.
    ///
    /// Returns the archive path, or `None` if the export had to be aborted.
    /// Failures are never raised to the caller directly; they are reported
    /// through the status callback.
    pub fn export(&mut self, options: &ExportOptions, error_list: &[ErrorReport]) -> Option<PathBuf> {
        match self.try_export(options, error_list) {
            Ok(path) => Some(path),
            Err(e) => {
                self.report_error(
                    &format!("A write error occurred while exporting data: '{e}'. Aborting export."),
                    Some(&e),
                );
                None
            }
        }
    }

    fn try_export(&mut self, options: &ExportOptions, errors: &[ErrorReport]) -> ExportResult<PathBuf> {
        let directory = BackupDirectory::new(&options.target_dir);
        let mut incremental = options.incremental;
        let mut prev = if incremental { directory.last_backup()? } else { None };
        if incremental {
            match &prev {
                Some(p) => info!(previous = %p.symbolic_path(), "creating incremental backup"),
                None => info!(previous = "none", "creating incremental backup"),
            }
        }

        let mut seq: i64 = 1;
        if incremental {
            if let Some(p) = &prev {
                if let Some(props) = p.properties()? {
                    let raw = props.get(PROP_NR_IN_SEQUENCE).unwrap_or("1");
                    match raw.parse::<i64>() {
                        Ok(n) if n == options.max_incremental => {
                            seq = 1;
                            incremental = false;
                            prev = None;
                        }
                        Ok(n) => seq = n + 1,
                        Err(_) => {
                            warn!(archive = %p.name(), value = raw, "bad sequence number in backup descriptor");
                        }
                    }
                }
            }
        }

        let mut properties = BackupProperties::new();
        properties.set(PROP_DATE, time::format_datetime_ms(time::now_ms()));
        properties.set(PROP_INCREMENTAL, if incremental { "yes" } else { "no" });
        properties.set(PROP_PREVIOUS, prev.as_ref().map(BackupDescriptor::name).unwrap_or_default());
        properties.set(PROP_NR_IN_SEQUENCE, seq.to_string());

        let path = directory.create_backup(incremental && prev.is_some(), options.zip)?;
        let mut writer: Box<dyn ArchiveWriter> = if options.zip {
            Box::new(ZipArchiveWriter::create(&path)?)
        } else {
            Box::new(FileSystemWriter::create(&path)?)
        };
        writer.set_properties(&properties)?;

        let prev_date_ms =
            prev.as_ref().and_then(BackupDescriptor::date).map(|d| d.timestamp_millis());
        let total = self.collection_count()?;
        let mut docs = DocumentSet::new();
        self.collection_pass(writer.as_mut(), prev_date_ms, prev.as_ref(), errors, &mut docs, total)?;
        self.export_orphans(writer.as_mut(), &docs, errors)?;
        writer.close()?;
        Ok(path)
    }

    /// The number of collection-index keys, counted once and cached.
    ///
    /// The counting pass runs with permission verification disabled so the
    /// denominator matches what the export pass will visit.
    ///
    /// # Errors
    ///
    /// Returns an error if the index scan fails outright.
    pub fn collection_count(&mut self) -> ExportResult<usize> {
        if let Some(count) = self.collection_count {
            return Ok(count);
        }
        let ctx = ReadContext::unverified();
        let mut count = 0usize;
        self.broker.scan_collections_failsafe(&ctx, &mut |_key, _input| {
            count += 1;
            Ok(ScanNext::Continue)
        })?;
        self.collection_count = Some(count);
        Ok(count)
    }

    pub(crate) fn start_collection_cb(&mut self, path: &str) -> ExportResult<()> {
        match self.callback.as_mut() {
            Some(cb) => cb.start_collection(path),
            None => Ok(()),
        }
    }

    pub(crate) fn start_document_cb(
        &mut self,
        name: &str,
        current: usize,
        total: usize,
    ) -> ExportResult<()> {
        match self.callback.as_mut() {
            Some(cb) => cb.start_document(name, current, total),
            None => Ok(()),
        }
    }

    pub(crate) fn observe_progress(&mut self, percent: Option<i32>) {
        if let (Some(percent), Some(observer)) = (percent, self.observer.as_mut()) {
            observer.progress(percent);
        }
    }

    /// Report through the callback with the fatal/engine `EXPORT:` prefix.
    pub(crate) fn report_error(&mut self, message: &str, cause: Option<&ExportError>) {
        if let Some(cb) = self.callback.as_mut() {
            cb.error(&format!("EXPORT: {message}"), cause);
        }
    }

    /// Report through the callback without a prefix.
    pub(crate) fn callback_error(&mut self, message: &str, cause: Option<&ExportError>) {
        if let Some(cb) = self.callback.as_mut() {
            cb.error(message, cause);
        }
    }
}

impl<B: StorageBroker> std::fmt::Debug for SystemExporter<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemExporter")
            .field("direct_access", &self.direct_access)
            .field("collection_count", &self.collection_count)
            .finish_non_exhaustive()
    }
}
