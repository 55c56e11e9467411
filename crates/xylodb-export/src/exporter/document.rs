//! The document pass: one payload entry plus one manifest record.

use std::io::{BufWriter, Write};

use xylodb_core::encoding::escape::escape_name;
use xylodb_core::{time, Document, QName, ResourceKind, DEFAULT_MIME_TYPE};

use crate::archive::ArchiveWriter;
use crate::broker::StorageBroker;
use crate::error::ExportResult;
use crate::exporter::SystemExporter;
use crate::manifest::{
    ATTR_CREATED, ATTR_FILENAME, ATTR_GROUP, ATTR_MIMETYPE, ATTR_MODE, ATTR_MODIFIED, ATTR_NAME,
    ATTR_NAMEDOCTYPE, ATTR_OWNER, ATTR_PUBLICID, ATTR_SKIP, ATTR_SYSTEMID, ATTR_TYPE, BACKUP_NS,
    ELEM_RESOURCE, SKIP_NO, SKIP_YES, TYPE_BINARY_RESOURCE, TYPE_XML_RESOURCE,
};
use crate::serializer::{AttrList, OutputOptions, Receiver, XmlSerializer};
use crate::stream;

impl<B: StorageBroker> SystemExporter<'_, B> {
    /// Export one document.
    ///
    /// The payload entry is written only when the incremental rule demands
    /// it; the `resource` manifest record is emitted either way. A payload
    /// failure is reported and the record still lands in the manifest, so a
    /// half-written entry never loses the document's identity.
    pub(crate) fn export_document<W: Write>(
        &mut self,
        writer: &mut dyn ArchiveWriter,
        serializer: &mut XmlSerializer<W>,
        doc: &Document,
        prev_date_ms: Option<i64>,
        current: usize,
        total: usize,
    ) -> ExportResult<()> {
        self.start_document_cb(&doc.file_name, current, total)?;

        // The metadata sub-record is stored apart from the document record
        // and may be unreadable on its own; fall back to "now" and the
        // default mime type.
        let now = time::now_ms();
        let (created_ms, modified_ms, mime_type) = match &doc.metadata {
            Some(meta) => (meta.created_ms, meta.modified_ms, meta.mime_type.as_str()),
            None => (now, now, DEFAULT_MIME_TYPE),
        };
        let modified_signed = i64::try_from(modified_ms).unwrap_or(i64::MAX);
        let needs_backup = prev_date_ms.is_none_or(|prev| prev < modified_signed);

        if needs_backup {
            if let Err(e) = self.write_payload(writer, doc) {
                if e.is_terminated() {
                    return Err(e);
                }
                self.report_error(
                    &format!(
                        "A write error occurred while exporting document: '{}'. Continuing with next document.",
                        doc.file_name
                    ),
                    Some(&e),
                );
            }
        }

        let resource_elem = QName::namespaced(ELEM_RESOURCE, BACKUP_NS);
        let mut attrs = AttrList::new();
        attrs.add(
            QName::new(ATTR_TYPE),
            if doc.kind.is_binary() { TYPE_BINARY_RESOURCE } else { TYPE_XML_RESOURCE },
        );
        attrs.add(QName::new(ATTR_NAME), doc.file_name.clone());
        attrs.add(QName::new(ATTR_SKIP), if needs_backup { SKIP_NO } else { SKIP_YES });
        attrs.add(QName::new(ATTR_OWNER), doc.permissions.owner.clone());
        attrs.add(QName::new(ATTR_GROUP), doc.permissions.group.clone());
        attrs.add(QName::new(ATTR_MODE), doc.permissions.mode_octal());
        attrs.add(QName::new(ATTR_CREATED), time::format_datetime_ms(created_ms));
        attrs.add(QName::new(ATTR_MODIFIED), time::format_datetime_ms(modified_ms));
        attrs.add(QName::new(ATTR_FILENAME), escape_name(&doc.file_name));
        attrs.add(QName::new(ATTR_MIMETYPE), mime_type);
        if doc.kind == ResourceKind::Xml {
            if let Some(doctype) = doc.metadata.as_ref().and_then(|m| m.doctype.as_ref()) {
                attrs.add(QName::new(ATTR_NAMEDOCTYPE), doctype.name.clone());
                if let Some(public_id) = &doctype.public_id {
                    attrs.add(QName::new(ATTR_PUBLICID), public_id.clone());
                }
                if let Some(system_id) = &doctype.system_id {
                    attrs.add(QName::new(ATTR_SYSTEMID), system_id.clone());
                }
            }
        }
        serializer.start_element(&resource_elem, &attrs)?;
        serializer.end_element(&resource_elem)
    }

    /// Stream the payload into a fresh archive entry, closing the entry on
    /// every exit path once it has been opened.
    fn write_payload(&mut self, writer: &mut dyn ArchiveWriter, doc: &Document) -> ExportResult<()> {
        let broker = self.broker;
        let body = {
            let entry = writer.new_entry(&escape_name(&doc.file_name))?;
            match doc.kind {
                ResourceKind::Binary => broker.read_binary_resource(doc, entry),
                ResourceKind::Xml => write_xml_payload(broker, doc, entry),
            }
        };
        let closed = writer.close_entry();
        body.and(closed)
    }
}

/// Render an XML document's node tree into `sink`, UTF-8, declaration, no
/// indentation.
fn write_xml_payload<B: StorageBroker>(
    broker: &B,
    doc: &Document,
    sink: &mut dyn Write,
) -> ExportResult<()> {
    let mut serializer = XmlSerializer::new(BufWriter::new(sink), OutputOptions::document());
    serializer.start_document()?;
    stream::write_document(broker, doc, &mut serializer)?;
    serializer.end_document()?;
    Ok(())
}
