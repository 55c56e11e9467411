//! Read access to prior backup archives.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use xylodb_core::encoding::escape::escape_path;
use xylodb_core::DbUri;

use crate::backup::directory::parse_archive_name;
use crate::backup::{BackupProperties, PROPERTIES_FILE};
use crate::error::{ExportError, ExportResult};
use crate::manifest::{parse_manifest, ManifestVisitor, CONTENTS_FILE};

/// Which container format holds the prior archive.
#[derive(Debug, Clone)]
enum Location {
    /// A directory tree rooted at the archive directory.
    FileTree(PathBuf),
    /// A zip container.
    Zip(PathBuf),
}

/// A readable handle onto one collection of a prior backup archive.
///
/// The descriptor returned by
/// [`BackupDirectory::last_backup`](crate::backup::BackupDirectory::last_backup)
/// points at the root collection; [`BackupDescriptor::descriptor_for`]
/// narrows it to a sub-collection for manifest diffing.
#[derive(Debug, Clone)]
pub struct BackupDescriptor {
    location: Location,
    collection_path: String,
}

impl BackupDescriptor {
    /// Open a descriptor onto an archive's root collection.
    ///
    /// Zip archives are recognized by their `.zip` extension; anything else
    /// is treated as a directory tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive does not exist.
    pub fn open(path: &Path) -> ExportResult<Self> {
        if !path.exists() {
            return Err(ExportError::InvalidState(format!(
                "backup archive not found: {}",
                path.display()
            )));
        }
        let location = if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("zip")) {
            Location::Zip(path.to_path_buf())
        } else {
            Location::FileTree(path.to_path_buf())
        };
        Ok(Self { location, collection_path: "db".to_owned() })
    }

    /// The archive's file name.
    #[must_use]
    pub fn name(&self) -> String {
        let path = match &self.location {
            Location::FileTree(p) | Location::Zip(p) => p,
        };
        path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }

    /// A human-readable pointer to this descriptor's manifest.
    #[must_use]
    pub fn symbolic_path(&self) -> String {
        let path = match &self.location {
            Location::FileTree(p) | Location::Zip(p) => p,
        };
        format!("{}#{}/{CONTENTS_FILE}", path.display(), self.collection_path)
    }

    /// The archive's `backup.properties`, when present and readable.
    ///
    /// # Errors
    ///
    /// Returns an error only on container-level failures; a missing sidecar
    /// yields `Ok(None)`.
    pub fn properties(&self) -> ExportResult<Option<BackupProperties>> {
        match self.read_file_at("", PROPERTIES_FILE)? {
            Some(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                Ok(Some(BackupProperties::parse(&text)))
            }
            None => Ok(None),
        }
    }

    /// The archive date: the `date` property, falling back to the timestamp
    /// embedded in the archive name.
    #[must_use]
    pub fn date(&self) -> Option<DateTime<Utc>> {
        if let Ok(Some(props)) = self.properties() {
            if let Some(date) = props.date() {
                return Some(date);
            }
        }
        parse_archive_name(&self.name()).map(|parsed| parsed.stamp.and_utc())
    }

    /// Narrow this descriptor to the given collection, if that collection's
    /// manifest exists in the archive.
    #[must_use]
    pub fn descriptor_for(&self, uri: &DbUri) -> Option<Self> {
        let rel = escape_path(uri.as_str()).trim_start_matches('/').to_owned();
        let narrowed = Self { location: self.location.clone(), collection_path: rel };
        if narrowed.contents_exists() {
            Some(narrowed)
        } else {
            None
        }
    }

    /// Stream this descriptor's collection manifest to the visitor.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Manifest`] on malformed manifests, or an I/O
    /// error if the archive cannot be read.
    pub fn parse(&self, visitor: &mut dyn ManifestVisitor) -> ExportResult<()> {
        match self.read_file_at(&self.collection_path, CONTENTS_FILE)? {
            Some(bytes) => parse_manifest(&bytes, visitor),
            None => Err(ExportError::Manifest(format!(
                "missing manifest: {}",
                self.symbolic_path()
            ))),
        }
    }

    fn contents_exists(&self) -> bool {
        match &self.location {
            Location::FileTree(root) => {
                root.join(&self.collection_path).join(CONTENTS_FILE).is_file()
            }
            Location::Zip(_) => {
                matches!(self.read_file_at(&self.collection_path, CONTENTS_FILE), Ok(Some(_)))
            }
        }
    }

    /// Read one file from the archive; `dir` is container-relative, empty
    /// for the archive root.
    fn read_file_at(&self, dir: &str, file: &str) -> ExportResult<Option<Vec<u8>>> {
        let rel = if dir.is_empty() { file.to_owned() } else { format!("{dir}/{file}") };
        match &self.location {
            Location::FileTree(root) => {
                let path = root.join(&rel);
                if !path.is_file() {
                    return Ok(None);
                }
                Ok(Some(std::fs::read(path)?))
            }
            Location::Zip(archive) => {
                let mut zip = zip::ZipArchive::new(File::open(archive)?)?;
                let mut entry = match zip.by_name(&rel) {
                    Ok(entry) => entry,
                    Err(zip::result::ZipError::FileNotFound) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes)?;
                Ok(Some(bytes))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Attributes;
    use std::io::Write;
    use tempfile::tempdir;

    #[derive(Default)]
    struct Names(Vec<String>);

    impl ManifestVisitor for Names {
        fn start_element(&mut self, local: &str, _attributes: &Attributes) -> ExportResult<()> {
            self.0.push(local.to_owned());
            Ok(())
        }
    }

    fn write_tree_archive(root: &Path) {
        std::fs::create_dir_all(root.join("db/sub")).unwrap();
        std::fs::write(
            root.join(PROPERTIES_FILE),
            "date=2026-03-01T10:00:00.000Z\nincremental=no\nnr-in-sequence=1\n",
        )
        .unwrap();
        std::fs::write(root.join("db").join(CONTENTS_FILE), br#"<collection name="/db"/>"#)
            .unwrap();
        std::fs::write(
            root.join("db/sub").join(CONTENTS_FILE),
            br#"<collection name="/db/sub"><resource name="a.xml"/></collection>"#,
        )
        .unwrap();
    }

    #[test]
    fn file_tree_descriptor() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("backup-20260301-1000");
        write_tree_archive(&root);

        let descriptor = BackupDescriptor::open(&root).unwrap();
        assert_eq!(descriptor.name(), "backup-20260301-1000");
        let props = descriptor.properties().unwrap().unwrap();
        assert_eq!(props.get("incremental"), Some("no"));
        assert!(descriptor.date().is_some());

        let sub = descriptor.descriptor_for(&DbUri::new("/db/sub").unwrap()).unwrap();
        let mut names = Names::default();
        sub.parse(&mut names).unwrap();
        assert_eq!(names.0, vec!["collection", "resource"]);

        assert!(descriptor.descriptor_for(&DbUri::new("/db/absent").unwrap()).is_none());
    }

    #[test]
    fn zip_descriptor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup-20260301-1000.zip");
        {
            let file = File::create(&path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            zip.start_file(PROPERTIES_FILE, zip::write::SimpleFileOptions::default()).unwrap();
            zip.write_all(b"date=2026-03-01T10:00:00.000Z\n").unwrap();
            zip.start_file(
                format!("db/{CONTENTS_FILE}"),
                zip::write::SimpleFileOptions::default(),
            )
            .unwrap();
            zip.write_all(br#"<collection name="/db"/>"#).unwrap();
            zip.finish().unwrap();
        }

        let descriptor = BackupDescriptor::open(&path).unwrap();
        assert_eq!(descriptor.date().unwrap().timestamp_millis(), 1_772_359_200_000);
        let mut names = Names::default();
        descriptor.parse(&mut names).unwrap();
        assert_eq!(names.0, vec!["collection"]);
        assert!(descriptor.descriptor_for(&DbUri::new("/db/none").unwrap()).is_none());
    }

    #[test]
    fn date_falls_back_to_name_stamp() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("backup-20260301-1030");
        std::fs::create_dir_all(root.join("db")).unwrap();
        let descriptor = BackupDescriptor::open(&root).unwrap();
        let date = descriptor.date().unwrap();
        assert_eq!(date.format("%Y%m%d-%H%M").to_string(), "20260301-1030");
    }
}
