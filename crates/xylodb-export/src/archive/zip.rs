//! Zip-container archive backend.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::archive::{relative_collection_path, ArchiveWriter};
use crate::backup::{BackupProperties, PROPERTIES_FILE};
use crate::error::{ExportError, ExportResult};
use crate::manifest::CONTENTS_FILE;

/// Writes the archive layout into a single zip file.
///
/// Every entry is prefixed with the database-root segment, so the root
/// collection lands at `db/` inside the container. Zip files allow only one
/// open entry at a time; callers keep manifest bytes buffered until all of
/// a collection's payload entries are written (the exporter does).
pub struct ZipArchiveWriter {
    zip: Option<ZipWriter<File>>,
    paths: Vec<String>,
    entry_open: bool,
}

impl ZipArchiveWriter {
    /// Create the zip file and its `db/` root entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path) -> ExportResult<Self> {
        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        zip.add_directory("db", dir_options())?;
        Ok(Self { zip: Some(zip), paths: Vec::new(), entry_open: false })
    }

    fn zip_mut(&mut self) -> ExportResult<&mut ZipWriter<File>> {
        self.zip
            .as_mut()
            .ok_or_else(|| ExportError::InvalidState("archive already closed".to_owned()))
    }

    fn current_path(&self) -> &str {
        self.paths.last().map_or("db", String::as_str)
    }

    fn start_entry(&mut self, name: String) -> ExportResult<&mut dyn Write> {
        let zip = self.zip_mut()?;
        zip.start_file(name, file_options())?;
        self.entry_open = true;
        Ok(self.zip_mut()? as &mut dyn Write)
    }

    fn finish_entry(&mut self, kind: &str) -> ExportResult<()> {
        if !self.entry_open {
            return Err(ExportError::InvalidState(format!("no open {kind} stream")));
        }
        self.entry_open = false;
        Ok(())
    }
}

fn dir_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

impl ArchiveWriter for ZipArchiveWriter {
    fn set_properties(&mut self, properties: &BackupProperties) -> ExportResult<()> {
        let text = properties.to_string();
        let sink = self.start_entry(PROPERTIES_FILE.to_owned())?;
        sink.write_all(text.as_bytes())?;
        self.finish_entry("properties")
    }

    fn new_collection(&mut self, path: &str) -> ExportResult<()> {
        let rel = relative_collection_path(path).to_owned();
        self.zip_mut()?.add_directory(rel.clone(), dir_options())?;
        self.paths.push(rel);
        Ok(())
    }

    fn close_collection(&mut self) -> ExportResult<()> {
        self.paths
            .pop()
            .map(|_| ())
            .ok_or_else(|| ExportError::InvalidState("no open collection scope".to_owned()))
    }

    fn new_contents(&mut self) -> ExportResult<&mut dyn Write> {
        let name = format!("{}/{CONTENTS_FILE}", self.current_path());
        self.start_entry(name)
    }

    fn close_contents(&mut self) -> ExportResult<()> {
        self.finish_entry("manifest")
    }

    fn new_entry(&mut self, name: &str) -> ExportResult<&mut dyn Write> {
        let name = format!("{}/{name}", self.current_path());
        self.start_entry(name)
    }

    fn close_entry(&mut self) -> ExportResult<()> {
        self.finish_entry("entry")
    }

    fn close(&mut self) -> ExportResult<()> {
        let zip = self
            .zip
            .take()
            .ok_or_else(|| ExportError::InvalidState("archive already closed".to_owned()))?;
        zip.finish()?;
        Ok(())
    }
}
