//! Directory-tree archive backend.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::archive::{relative_collection_path, ArchiveWriter};
use crate::backup::{BackupProperties, PROPERTIES_FILE};
use crate::error::{ExportError, ExportResult};
use crate::manifest::CONTENTS_FILE;

/// Mirrors the archive layout into real directories under the archive root.
///
/// The database root collection maps to `<root>/db`; both directories are
/// created eagerly so an export of an empty database still produces a
/// restorable skeleton.
pub struct FileSystemWriter {
    root: PathBuf,
    dirs: Vec<PathBuf>,
    contents: Option<BufWriter<File>>,
    entry: Option<BufWriter<File>>,
}

impl FileSystemWriter {
    /// Create the archive root directory (and `db/` inside it).
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created.
    pub fn create(root: impl Into<PathBuf>) -> ExportResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("db"))?;
        Ok(Self { root, dirs: Vec::new(), contents: None, entry: None })
    }

    fn current_dir(&self) -> PathBuf {
        self.dirs.last().cloned().unwrap_or_else(|| self.root.join("db"))
    }
}

impl ArchiveWriter for FileSystemWriter {
    fn set_properties(&mut self, properties: &BackupProperties) -> ExportResult<()> {
        let mut file = File::create(self.root.join(PROPERTIES_FILE))?;
        file.write_all(properties.to_string().as_bytes())?;
        Ok(())
    }

    fn new_collection(&mut self, path: &str) -> ExportResult<()> {
        let dir = self.root.join(relative_collection_path(path));
        fs::create_dir_all(&dir)?;
        self.dirs.push(dir);
        Ok(())
    }

    fn close_collection(&mut self) -> ExportResult<()> {
        self.dirs
            .pop()
            .map(|_| ())
            .ok_or_else(|| ExportError::InvalidState("no open collection scope".to_owned()))
    }

    fn new_contents(&mut self) -> ExportResult<&mut dyn Write> {
        let file = File::create(self.current_dir().join(CONTENTS_FILE))?;
        Ok(self.contents.insert(BufWriter::new(file)) as &mut dyn Write)
    }

    fn close_contents(&mut self) -> ExportResult<()> {
        match self.contents.take() {
            Some(mut writer) => {
                writer.flush()?;
                Ok(())
            }
            None => Err(ExportError::InvalidState("no open manifest stream".to_owned())),
        }
    }

    fn new_entry(&mut self, name: &str) -> ExportResult<&mut dyn Write> {
        let file = File::create(self.current_dir().join(name))?;
        Ok(self.entry.insert(BufWriter::new(file)) as &mut dyn Write)
    }

    fn close_entry(&mut self) -> ExportResult<()> {
        match self.entry.take() {
            Some(mut writer) => {
                writer.flush()?;
                Ok(())
            }
            None => Err(ExportError::InvalidState("no open entry stream".to_owned())),
        }
    }

    fn close(&mut self) -> ExportResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn mirrors_layout_into_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("backup-20260101-0000");
        let mut writer = FileSystemWriter::create(&root).unwrap();

        let mut props = BackupProperties::new();
        props.set("incremental", "no");
        writer.set_properties(&props).unwrap();

        writer.new_collection("/db/plays").unwrap();
        {
            let entry = writer.new_entry("a.xml").unwrap();
            entry.write_all(b"<r/>").unwrap();
        }
        writer.close_entry().unwrap();
        {
            let contents = writer.new_contents().unwrap();
            contents.write_all(b"<collection/>").unwrap();
        }
        writer.close_contents().unwrap();
        writer.close_collection().unwrap();
        writer.close().unwrap();

        assert!(root.join("db").is_dir());
        assert!(root.join("backup.properties").is_file());
        assert_eq!(fs::read(root.join("db/plays/a.xml")).unwrap(), b"<r/>");
        assert_eq!(fs::read(root.join("db/plays/__contents__.xml")).unwrap(), b"<collection/>");
    }

    #[test]
    fn root_scope_writes_under_db() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("backup-20260101-0001");
        let mut writer = FileSystemWriter::create(&root).unwrap();
        {
            let contents = writer.new_contents().unwrap();
            contents.write_all(b"<collection/>").unwrap();
        }
        writer.close_contents().unwrap();
        assert!(root.join("db/__contents__.xml").is_file());
    }

    #[test]
    fn unbalanced_close_fails() {
        let dir = tempdir().unwrap();
        let mut writer = FileSystemWriter::create(dir.path().join("b")).unwrap();
        assert!(writer.close_collection().is_err());
        assert!(writer.close_entry().is_err());
    }
}
