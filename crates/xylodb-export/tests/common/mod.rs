//! In-memory storage broker and callback recorders shared by the
//! integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use xylodb_core::encoding::keys::{encode_collection_key, encode_document_key};
use xylodb_core::encoding::{RecordReader, RecordWriter};
use xylodb_core::{Collection, CollectionId, DocId, Document, QName};
use xylodb_export::broker::IndexVisitor;
use xylodb_export::{
    ExportError, ExportResult, NodeHandle, NodeKind, ReadContext, ScanNext, StatusCallback,
    StorageBroker, StreamEvent, XmlStreamReader,
};

/// A broker over in-memory index maps, mirroring the on-disk layout the
/// engine scans: encoded collection records keyed by URI, encoded document
/// records keyed by collection id + type byte + doc id.
#[derive(Default)]
pub struct MemoryBroker {
    collection_index: BTreeMap<Vec<u8>, Vec<u8>>,
    document_index: BTreeMap<Vec<u8>, Vec<u8>>,
    blobs: HashMap<DocId, Vec<u8>>,
    xml_docs: HashMap<DocId, Vec<Vec<StreamEvent>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection record and the document-index entries for its
    /// documents.
    pub fn add_collection(&mut self, collection: &Collection) {
        let mut writer = RecordWriter::new();
        collection.encode_to(&mut writer);
        self.collection_index
            .insert(encode_collection_key(collection.uri.as_str()), writer.into_bytes());
        for doc in collection.documents() {
            self.add_document_record(collection.id, doc);
        }
    }

    /// Register a document-index entry on its own, e.g. an orphan whose
    /// collection record no longer exists.
    pub fn add_document_record(&mut self, collection_id: CollectionId, doc: &Document) {
        let mut writer = RecordWriter::new();
        doc.encode_to(&mut writer);
        self.document_index
            .insert(encode_document_key(collection_id, doc.kind, doc.id), writer.into_bytes());
    }

    /// Register an allocator bookkeeping entry under a reserved name.
    pub fn add_meta_key(&mut self, name: &str) {
        self.collection_index.insert(encode_collection_key(name), vec![0]);
    }

    /// Register a collection-index entry whose record bytes are garbage.
    pub fn add_corrupt_collection(&mut self, uri: &str) {
        self.collection_index.insert(encode_collection_key(uri), vec![0xff, 0xff]);
    }

    /// Attach the event streams of an XML document's top-level nodes.
    pub fn set_xml(&mut self, id: DocId, nodes: Vec<Vec<StreamEvent>>) {
        self.xml_docs.insert(id, nodes);
    }

    /// Attach a binary document's payload.
    pub fn set_blob(&mut self, id: DocId, bytes: Vec<u8>) {
        self.blobs.insert(id, bytes);
    }

    fn scan(
        index: &BTreeMap<Vec<u8>, Vec<u8>>,
        visitor: &mut IndexVisitor<'_>,
    ) -> ExportResult<()> {
        for (key, value) in index {
            let mut reader = RecordReader::new(value);
            match visitor(key, &mut reader) {
                Ok(ScanNext::Continue) => {}
                Ok(ScanNext::Stop) => return Ok(()),
                Err(e) if e.is_terminated() => return Err(e),
                // failsafe contract: per-entry failures are swallowed
                Err(_) => {}
            }
        }
        Ok(())
    }
}

impl StorageBroker for MemoryBroker {
    type Reader = VecReader;

    fn scan_collections_failsafe(
        &self,
        _ctx: &ReadContext,
        visitor: &mut IndexVisitor<'_>,
    ) -> ExportResult<()> {
        Self::scan(&self.collection_index, visitor)
    }

    fn scan_documents_failsafe(
        &self,
        _ctx: &ReadContext,
        _direct_access: bool,
        visitor: &mut IndexVisitor<'_>,
    ) -> ExportResult<()> {
        Self::scan(&self.document_index, visitor)
    }

    fn read_binary_resource(&self, doc: &Document, sink: &mut dyn Write) -> ExportResult<()> {
        let blob = self
            .blobs
            .get(&doc.id)
            .ok_or_else(|| ExportError::Storage(format!("no blob for doc {}", doc.id.as_u32())))?;
        sink.write_all(blob)?;
        Ok(())
    }

    fn document_nodes(&self, doc: &Document) -> ExportResult<Vec<NodeHandle>> {
        let streams = self
            .xml_docs
            .get(&doc.id)
            .ok_or_else(|| ExportError::Storage(format!("no node tree for doc {}", doc.id.as_u32())))?;
        Ok(streams
            .iter()
            .enumerate()
            .map(|(index, events)| NodeHandle { id: index as u64, kind: node_kind_of(events) })
            .collect())
    }

    fn xml_stream_reader(&self, doc: &Document, node: &NodeHandle) -> ExportResult<VecReader> {
        let events = self
            .xml_docs
            .get(&doc.id)
            .and_then(|streams| streams.get(node.id as usize))
            .cloned()
            .ok_or_else(|| ExportError::Storage(format!("no stream for node {}", node.id)))?;
        Ok(VecReader { events: events.into_iter() })
    }
}

fn node_kind_of(events: &[StreamEvent]) -> NodeKind {
    match events.first() {
        Some(StreamEvent::StartElement { .. }) => NodeKind::Element,
        Some(StreamEvent::Comment(_)) => NodeKind::Comment,
        Some(StreamEvent::ProcessingInstruction { .. }) => NodeKind::ProcessingInstruction,
        _ => NodeKind::Text,
    }
}

/// Pull reader over a pre-recorded event stream.
pub struct VecReader {
    events: std::vec::IntoIter<StreamEvent>,
}

impl XmlStreamReader for VecReader {
    fn next_event(&mut self) -> ExportResult<Option<StreamEvent>> {
        Ok(self.events.next())
    }
}

/// The event streams of a document holding a single empty element.
pub fn empty_element(name: &str) -> Vec<Vec<StreamEvent>> {
    vec![vec![
        StreamEvent::StartElement {
            name: QName::new(name),
            attributes: Vec::new(),
            namespaces: Vec::new(),
        },
        StreamEvent::EndElement { name: QName::new(name) },
    ]]
}

/// Status callback that records everything it is told.
#[derive(Default)]
pub struct RecordingCallback {
    pub collections: Vec<String>,
    pub documents: Vec<(String, usize, usize)>,
    pub errors: Vec<String>,
}

impl StatusCallback for RecordingCallback {
    fn start_collection(&mut self, path: &str) -> ExportResult<()> {
        self.collections.push(path.to_owned());
        Ok(())
    }

    fn start_document(&mut self, name: &str, current: usize, total: usize) -> ExportResult<()> {
        self.documents.push((name.to_owned(), current, total));
        Ok(())
    }

    fn error(&mut self, message: &str, _cause: Option<&ExportError>) {
        self.errors.push(message.to_owned());
    }
}

/// Status callback that requests termination on the first collection.
#[derive(Default)]
pub struct TerminatingCallback {
    pub errors: Vec<String>,
}

impl StatusCallback for TerminatingCallback {
    fn start_collection(&mut self, _path: &str) -> ExportResult<()> {
        Err(ExportError::Terminated)
    }

    fn error(&mut self, message: &str, _cause: Option<&ExportError>) {
        self.errors.push(message.to_owned());
    }
}
