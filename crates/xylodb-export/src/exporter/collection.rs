//! The collection pass: failsafe traversal and per-collection export.

use std::io::Write;

use tracing::warn;
use xylodb_core::encoding::escape::{escape_name, escape_path, unescape};
use xylodb_core::encoding::keys::{collection_uri_from_key, is_reserved_collection_key};
use xylodb_core::encoding::RecordReader;
use xylodb_core::{time, Collection, DbUri, DocumentSet, QName};

use crate::archive::ArchiveWriter;
use crate::backup::BackupDescriptor;
use crate::broker::{ReadContext, ScanNext, StorageBroker};
use crate::error::ExportResult;
use crate::exporter::SystemExporter;
use crate::manifest::{
    Attributes, ManifestVisitor, ATTR_CREATED, ATTR_FILENAME, ATTR_GROUP, ATTR_MODE, ATTR_NAME,
    ATTR_OWNER, ATTR_TYPE, ATTR_VERSION, BACKUP_NS, CONTENTS_FILE, CURRENT_VERSION,
    ELEM_COLLECTION, ELEM_DELETED, ELEM_RESOURCE, ELEM_SUBCOLLECTION, LOST_AND_FOUND_NAME,
    LOST_AND_FOUND_URI, TEMP_COLLECTION_URI, TYPE_COLLECTION, TYPE_RESOURCE,
};
use crate::progress::ProgressTracker;
use crate::report::{damaged_child, damaged_collection, damaged_document, ErrorReport};
use crate::serializer::{AttrList, OutputOptions, Receiver, XmlSerializer};

impl<B: StorageBroker> SystemExporter<'_, B> {
    /// Walk the collection index and export every surviving collection.
    ///
    /// A corrupted key never aborts the pass: per-key failures are reported
    /// through the status callback and the traversal continues. Only
    /// cooperative termination propagates.
    pub(crate) fn collection_pass(
        &mut self,
        writer: &mut dyn ArchiveWriter,
        prev_date_ms: Option<i64>,
        prev: Option<&BackupDescriptor>,
        errors: &[ErrorReport],
        docs: &mut DocumentSet,
        total: usize,
    ) -> ExportResult<()> {
        let broker = self.broker;
        let mut tracker = ProgressTracker::new(total);
        let ctx = ReadContext::default();
        broker.scan_collections_failsafe(&ctx, &mut |key, input| {
            let percent = tracker.advance();
            match self
                .visit_collection_key(writer, key, input, percent, prev_date_ms, prev, errors, docs)
            {
                Ok(()) => Ok(ScanNext::Continue),
                Err(e) if e.is_terminated() => Err(e),
                Err(e) => {
                    let uri = collection_uri_from_key(key).unwrap_or("<undecodable>");
                    self.report_error(
                        &format!("Caught exception while scanning collections: {uri}"),
                        Some(&e),
                    );
                    Ok(ScanNext::Continue)
                }
            }
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_collection_key(
        &mut self,
        writer: &mut dyn ArchiveWriter,
        key: &[u8],
        input: &mut RecordReader<'_>,
        percent: Option<i32>,
        prev_date_ms: Option<i64>,
        prev: Option<&BackupDescriptor>,
        errors: &[ErrorReport],
        docs: &mut DocumentSet,
    ) -> ExportResult<()> {
        let uri_str = collection_uri_from_key(key)?.to_owned();
        if is_reserved_collection_key(&uri_str) {
            return Ok(());
        }
        // a leftover lost-and-found from a restored backup would collide
        // with the orphan scope; its documents are rescued there instead
        if uri_str == LOST_AND_FOUND_URI {
            return Ok(());
        }
        let uri = DbUri::new(uri_str)?;
        let collection = Collection::decode(uri, input)?;
        if damaged_collection(errors, collection.id) {
            self.report_error(&format!("Skipping damaged collection {}", collection.uri), None);
            return Ok(());
        }
        let sub_descriptor = prev.and_then(|p| p.descriptor_for(&collection.uri));
        self.observe_progress(percent);
        self.export_collection(writer, &collection, prev_date_ms, sub_descriptor.as_ref(), errors, docs)
    }

    /// Export one collection: manifest, documents, child entries, and
    /// deletions against the prior backup.
    ///
    /// The root collection writes into the already-open archive root; every
    /// other collection opens its own sink scope, which is closed on all
    /// exit paths.
    pub(crate) fn export_collection(
        &mut self,
        writer: &mut dyn ArchiveWriter,
        collection: &Collection,
        prev_date_ms: Option<i64>,
        prev: Option<&BackupDescriptor>,
        errors: &[ErrorReport],
        docs: &mut DocumentSet,
    ) -> ExportResult<()> {
        self.start_collection_cb(collection.uri.as_str())?;

        let is_root = collection.uri.is_root();
        if !is_root {
            writer.new_collection(&escape_path(collection.uri.as_str()))?;
        }
        let result = self.write_collection(writer, collection, prev_date_ms, prev, errors, docs);
        if !is_root {
            writer.close_collection()?;
        }
        result
    }

    fn write_collection(
        &mut self,
        writer: &mut dyn ArchiveWriter,
        collection: &Collection,
        prev_date_ms: Option<i64>,
        prev: Option<&BackupDescriptor>,
        errors: &[ErrorReport],
        docs: &mut DocumentSet,
    ) -> ExportResult<()> {
        // The manifest is buffered so payload entries can interleave with
        // its events; zip containers only support one open entry at a time.
        let mut buf = Vec::new();
        let mut serializer = XmlSerializer::new(&mut buf, OutputOptions::manifest());
        serializer.start_document()?;
        serializer.start_prefix_mapping("", BACKUP_NS)?;

        let collection_elem = QName::namespaced(ELEM_COLLECTION, BACKUP_NS);
        let mut attrs = AttrList::new();
        attrs.add(QName::new(ATTR_NAME), collection.uri.as_str());
        attrs.add(QName::new(ATTR_VERSION), CURRENT_VERSION.to_string());
        attrs.add(QName::new(ATTR_OWNER), collection.permissions.owner.clone());
        attrs.add(QName::new(ATTR_GROUP), collection.permissions.group.clone());
        attrs.add(QName::new(ATTR_MODE), collection.permissions.mode_octal());
        attrs.add(QName::new(ATTR_CREATED), time::format_datetime_ms(collection.created_ms));
        serializer.start_element(&collection_elem, &attrs)?;

        let total = collection.documents().len();
        for (index, doc) in collection.documents().iter().enumerate() {
            if damaged_document(errors, doc.id) {
                self.report_error(&format!("Skipping damaged document {}", doc.file_name), None);
                continue;
            }
            if doc.file_name == CONTENTS_FILE || doc.file_name == LOST_AND_FOUND_NAME {
                continue;
            }
            self.export_document(writer, &mut serializer, doc, prev_date_ms, index, total)?;
            docs.insert(doc.id);
        }

        for child in collection.children() {
            if child == LOST_AND_FOUND_NAME {
                continue;
            }
            let child_uri = collection.uri.child(child)?;
            if child_uri.as_str() == TEMP_COLLECTION_URI {
                continue;
            }
            if damaged_child(errors, &child_uri) {
                self.report_error(&format!("Skipping damaged child collection {child_uri}"), None);
                continue;
            }
            let sub_elem = QName::namespaced(ELEM_SUBCOLLECTION, BACKUP_NS);
            let mut sub_attrs = AttrList::new();
            sub_attrs.add(QName::new(ATTR_NAME), child.clone());
            sub_attrs.add(QName::new(ATTR_FILENAME), escape_name(child));
            serializer.start_element(&sub_elem, &sub_attrs)?;
            serializer.end_element(&sub_elem)?;
        }

        if let Some(prev) = prev {
            let mut check = CheckDeleted { collection, serializer: &mut serializer };
            if let Err(e) = prev.parse(&mut check) {
                warn!(
                    descriptor = %prev.symbolic_path(),
                    error = %e,
                    "failed to parse previous backup descriptor"
                );
            }
        }

        serializer.end_element(&collection_elem)?;
        serializer.end_prefix_mapping("")?;
        serializer.end_document()?;
        drop(serializer);

        let contents = writer.new_contents()?;
        contents.write_all(&buf)?;
        writer.close_contents()?;
        Ok(())
    }
}

/// Emits `<deleted>` entries for items present in the prior backup's
/// manifest but missing from the current collection.
struct CheckDeleted<'a, W: Write> {
    collection: &'a Collection,
    serializer: &'a mut XmlSerializer<W>,
}

impl<W: Write> CheckDeleted<'_, W> {
    fn emit_deleted(&mut self, name: &str, kind: &str) -> ExportResult<()> {
        let deleted_elem = QName::namespaced(ELEM_DELETED, BACKUP_NS);
        let mut attrs = AttrList::new();
        attrs.add(QName::new(ATTR_NAME), name);
        attrs.add(QName::new(ATTR_TYPE), kind);
        self.serializer.start_element(&deleted_elem, &attrs)?;
        self.serializer.end_element(&deleted_elem)
    }
}

impl<W: Write> ManifestVisitor for CheckDeleted<'_, W> {
    fn start_element(&mut self, local: &str, attributes: &Attributes) -> ExportResult<()> {
        if local == ELEM_SUBCOLLECTION {
            let raw = attributes.get(ATTR_FILENAME).or_else(|| attributes.get(ATTR_NAME));
            if let Some(raw) = raw {
                // the filename attribute carries the escaped form
                let name = unescape(raw).unwrap_or_else(|_| raw.to_owned());
                if !self.collection.has_child(&name) {
                    self.emit_deleted(&name, TYPE_COLLECTION)?;
                }
            }
        } else if local == ELEM_RESOURCE {
            if let Some(name) = attributes.get(ATTR_NAME) {
                if !self.collection.has_document(name) {
                    self.emit_deleted(name, TYPE_RESOURCE)?;
                }
            }
        }
        Ok(())
    }
}
