//! Backup directory scanning and archive allocation.

use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};

use crate::backup::BackupDescriptor;
use crate::error::ExportResult;

/// Base name of every archive produced by this engine.
pub const FILE_PREFIX: &str = "backup";

/// Timestamp format embedded in archive names.
pub const DATE_FORMAT: &str = "%Y%m%d-%H%M";

/// A target directory holding a chain of backup archives.
#[derive(Debug, Clone)]
pub struct BackupDirectory {
    dir: PathBuf,
}

/// Parsed parts of an archive file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ArchiveName {
    pub stamp: NaiveDateTime,
    pub uniquifier: u32,
}

impl BackupDirectory {
    /// Wrap a target directory path.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Find the most recent archive produced by this engine, if any.
    ///
    /// Archives are ordered by the timestamp embedded in their name, with
    /// the uniquifier suffix as tie-break.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be read. A missing
    /// directory yields `Ok(None)`.
    pub fn last_backup(&self) -> ExportResult<Option<BackupDescriptor>> {
        if !self.dir.is_dir() {
            return Ok(None);
        }
        let mut best: Option<(ArchiveName, PathBuf)> = None;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else { continue };
            let Some(parsed) = parse_archive_name(name) else { continue };
            if best.as_ref().is_none_or(|(current, _)| parsed > *current) {
                best = Some((parsed, entry.path()));
            }
        }
        match best {
            Some((_, path)) => Ok(Some(BackupDescriptor::open(&path)?)),
            None => Ok(None),
        }
    }

    /// Allocate a fresh, unused archive path.
    ///
    /// Full backups are named `backup-YYYYMMDD-HHMM`; incremental backups
    /// always carry a `_N` suffix. In both cases the suffix is incremented
    /// until the path does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the target directory cannot be created.
    pub fn create_backup(&self, incremental: bool, zip: bool) -> ExportResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let stamp = Utc::now().format(DATE_FORMAT);
        let base = format!("{FILE_PREFIX}-{stamp}");
        let extension = if zip { ".zip" } else { "" };
        let mut version: u32 = u32::from(incremental);
        loop {
            let name = if version == 0 {
                format!("{base}{extension}")
            } else {
                format!("{base}_{version}{extension}")
            };
            let candidate = self.dir.join(name);
            if !candidate.exists() {
                return Ok(candidate);
            }
            version += 1;
        }
    }
}

/// Parse `backup-YYYYMMDD-HHMM[_N][.zip]`; returns `None` for foreign files.
pub(crate) fn parse_archive_name(name: &str) -> Option<ArchiveName> {
    let rest = name.strip_prefix(FILE_PREFIX)?.strip_prefix('-')?;
    let rest = rest.strip_suffix(".zip").unwrap_or(rest);
    let (stamp_part, uniquifier) = match rest.split_once('_') {
        Some((stamp, n)) => (stamp, n.parse().ok()?),
        None => (rest, 0),
    };
    let stamp = NaiveDateTime::parse_from_str(stamp_part, DATE_FORMAT).ok()?;
    Some(ArchiveName { stamp, uniquifier })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_archive_names() {
        assert!(parse_archive_name("backup-20260101-1200").is_some());
        assert!(parse_archive_name("backup-20260101-1200.zip").is_some());
        let with_n = parse_archive_name("backup-20260101-1200_3.zip").unwrap();
        assert_eq!(with_n.uniquifier, 3);
        assert!(parse_archive_name("notes.txt").is_none());
        assert!(parse_archive_name("backup-garbage").is_none());
        assert!(parse_archive_name("backup-20260101-1200_x").is_none());
    }

    #[test]
    fn ordering_prefers_newer_then_uniquifier() {
        let a = parse_archive_name("backup-20260101-1200").unwrap();
        let b = parse_archive_name("backup-20260101-1200_2").unwrap();
        let c = parse_archive_name("backup-20260102-0900").unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn create_backup_allocates_unique_paths() {
        let dir = tempdir().unwrap();
        let directory = BackupDirectory::new(dir.path());

        let first = directory.create_backup(false, false).unwrap();
        std::fs::create_dir_all(&first).unwrap();
        let second = directory.create_backup(false, false).unwrap();
        assert_ne!(first, second);
        assert!(second.to_string_lossy().contains('_'));
    }

    #[test]
    fn incremental_names_carry_suffix() {
        let dir = tempdir().unwrap();
        let directory = BackupDirectory::new(dir.path());
        let path = directory.create_backup(true, true).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("backup-"));
        assert!(name.ends_with(".zip"));
        assert!(name.contains("_1"));
    }

    #[test]
    fn last_backup_empty_dir() {
        let dir = tempdir().unwrap();
        let directory = BackupDirectory::new(dir.path());
        assert!(directory.last_backup().unwrap().is_none());
        let missing = BackupDirectory::new(dir.path().join("nope"));
        assert!(missing.last_backup().unwrap().is_none());
    }
}
