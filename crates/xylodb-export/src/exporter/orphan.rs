//! The orphan pass: rescue documents whose parent collection is gone.

use std::collections::BTreeSet;
use std::io::Write;

use xylodb_core::encoding::escape::escape_path;
use xylodb_core::encoding::keys::{document_id_from_key, document_kind_from_key};
use xylodb_core::encoding::RecordReader;
use xylodb_core::{Document, DocumentSet, QName, DBA_GROUP, DBA_USER};

use crate::archive::ArchiveWriter;
use crate::broker::{ReadContext, ScanNext, StorageBroker};
use crate::error::ExportResult;
use crate::exporter::SystemExporter;
use crate::manifest::{
    ATTR_GROUP, ATTR_MODE, ATTR_NAME, ATTR_OWNER, ATTR_VERSION, BACKUP_NS, CURRENT_VERSION,
    ELEM_COLLECTION, LOST_AND_FOUND_MODE, LOST_AND_FOUND_URI,
};
use crate::report::{damaged_document, ErrorReport};
use crate::serializer::{AttrList, OutputOptions, Receiver, XmlSerializer};

impl<B: StorageBroker> SystemExporter<'_, B> {
    /// Scan the document index for entries not covered by the collection
    /// pass and export them into `/db/__lost_and_found__`.
    ///
    /// The lost-and-found scope is opened once with a synthetic manifest;
    /// colliding file names get `.1`, `.2`, ... suffixes. Per-document
    /// failures are reported and the scan continues.
    pub(crate) fn export_orphans(
        &mut self,
        writer: &mut dyn ArchiveWriter,
        docs: &DocumentSet,
        errors: &[ErrorReport],
    ) -> ExportResult<()> {
        writer.new_collection(&escape_path(LOST_AND_FOUND_URI))?;
        let result = self.write_orphans(writer, docs, errors);
        let closed = writer.close_collection();
        match result {
            Ok(()) => {}
            Err(e) if e.is_terminated() => return Err(e),
            Err(e) => {
                let message = e.to_string();
                self.callback_error(&message, Some(&e));
            }
        }
        closed?;
        Ok(())
    }

    fn write_orphans(
        &mut self,
        writer: &mut dyn ArchiveWriter,
        docs: &DocumentSet,
        errors: &[ErrorReport],
    ) -> ExportResult<()> {
        let broker = self.broker;
        let mut buf = Vec::new();
        let mut serializer = XmlSerializer::new(&mut buf, OutputOptions::manifest());
        serializer.start_document()?;
        serializer.start_prefix_mapping("", BACKUP_NS)?;
        let collection_elem = QName::namespaced(ELEM_COLLECTION, BACKUP_NS);
        let mut attrs = AttrList::new();
        attrs.add(QName::new(ATTR_NAME), LOST_AND_FOUND_URI);
        attrs.add(QName::new(ATTR_VERSION), CURRENT_VERSION.to_string());
        attrs.add(QName::new(ATTR_OWNER), DBA_USER);
        attrs.add(QName::new(ATTR_GROUP), DBA_GROUP);
        attrs.add(QName::new(ATTR_MODE), LOST_AND_FOUND_MODE);
        serializer.start_element(&collection_elem, &attrs)?;

        let mut written_names: BTreeSet<String> = BTreeSet::new();
        let ctx = ReadContext::default();
        let direct_access = self.direct_access;
        broker.scan_documents_failsafe(&ctx, direct_access, &mut |key, input| {
            match self.visit_document_key(writer, &mut serializer, key, input, docs, errors, &mut written_names)
            {
                Ok(()) => Ok(ScanNext::Continue),
                Err(e) if e.is_terminated() => Err(e),
                Err(e) => {
                    self.report_error(
                        &format!("Caught an exception while scanning documents: {e}"),
                        Some(&e),
                    );
                    Ok(ScanNext::Continue)
                }
            }
        })?;

        serializer.end_element(&collection_elem)?;
        serializer.end_prefix_mapping("")?;
        serializer.end_document()?;
        drop(serializer);

        let contents = writer.new_contents()?;
        contents.write_all(&buf)?;
        writer.close_contents()?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_document_key<W: Write>(
        &mut self,
        writer: &mut dyn ArchiveWriter,
        serializer: &mut XmlSerializer<W>,
        key: &[u8],
        input: &mut RecordReader<'_>,
        docs: &DocumentSet,
        errors: &[ErrorReport],
        written_names: &mut BTreeSet<String>,
    ) -> ExportResult<()> {
        let doc_id = document_id_from_key(key)?;
        if docs.contains(doc_id) || damaged_document(errors, doc_id) {
            return Ok(());
        }
        let kind = document_kind_from_key(key)?;
        let mut doc = Document::decode(input, kind)?;
        self.report_error(&format!("Found an orphaned document: {}", doc.file_name), None);

        let original = doc.file_name.clone();
        let mut candidate = original.clone();
        let mut suffix = 1u32;
        while written_names.contains(&candidate) {
            candidate = format!("{original}.{suffix}");
            suffix += 1;
        }
        written_names.insert(candidate.clone());
        doc.file_name = candidate;

        // no predecessor here: orphan payloads are always written
        self.export_document(writer, serializer, &doc, None, 0, 0)
    }
}
