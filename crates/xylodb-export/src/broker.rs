//! Storage broker contract.
//!
//! The export engine never touches B-tree pages itself; it consumes the
//! broker interface defined here. Brokers provide failsafe index scans
//! (per-entry decoding failures are reported and skipped, never fatal),
//! blob streaming for binary resources, and forward-only pull readers over
//! stored XML node trees.

use std::io::Write;

use xylodb_core::{Document, QName};

use crate::error::ExportResult;

pub use xylodb_core::encoding::RecordReader;

/// Per-call read context threaded through broker scans.
///
/// The counting pass runs without permission verification so that a
/// damaged security store cannot hide collections from the progress
/// denominator; everything else uses the default.
#[derive(Debug, Clone, Copy)]
pub struct ReadContext {
    /// Whether the broker should verify the calling user's permissions.
    pub verify_permissions: bool,
}

impl ReadContext {
    /// A context with permission verification disabled.
    #[must_use]
    pub const fn unverified() -> Self {
        Self { verify_permissions: false }
    }
}

impl Default for ReadContext {
    fn default() -> Self {
        Self { verify_permissions: true }
    }
}

/// Visitor decision after handling one index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanNext {
    /// Keep scanning.
    Continue,
    /// End the scan successfully.
    Stop,
}

/// Visitor invoked once per index entry with the raw key bytes and a reader
/// over the serialized record.
pub type IndexVisitor<'a> =
    dyn FnMut(&[u8], &mut RecordReader<'_>) -> ExportResult<ScanNext> + 'a;

/// The kind of a stored XML node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An element node.
    Element,
    /// A text node.
    Text,
    /// A comment node.
    Comment,
    /// A processing-instruction node.
    ProcessingInstruction,
}

/// An opaque handle to a stored node, as handed out by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle {
    /// Broker-defined node identity.
    pub id: u64,
    /// The node's kind.
    pub kind: NodeKind,
}

/// A namespace declaration appearing on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// The declared prefix; empty string for the default namespace.
    pub prefix: String,
    /// The namespace URI.
    pub uri: String,
}

/// One attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name.
    pub name: QName,
    /// The attribute value.
    pub value: String,
}

/// One event pulled from a stored node subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Start of the framing document; suppressed by the renderer.
    StartDocument,
    /// End of the framing document; suppressed by the renderer.
    EndDocument,
    /// An element starts, carrying its attributes and the namespace
    /// declarations newly in scope at this element.
    StartElement {
        /// The element name.
        name: QName,
        /// Attributes in document order.
        attributes: Vec<Attribute>,
        /// Namespace declarations on this element.
        namespaces: Vec<NamespaceDecl>,
    },
    /// An element ends.
    EndElement {
        /// The element name.
        name: QName,
    },
    /// A run of character data.
    Characters(String),
    /// A CDATA section.
    Cdata(String),
    /// A comment.
    Comment(String),
    /// A processing instruction.
    ProcessingInstruction {
        /// The PI target.
        target: String,
        /// The PI data, possibly empty.
        data: String,
    },
}

/// Forward-only pull reader over one stored node subtree.
pub trait XmlStreamReader {
    /// Pull the next event, or `None` at the end of the subtree.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Storage`] if the underlying pages cannot be
    /// read.
    fn next_event(&mut self) -> ExportResult<Option<StreamEvent>>;
}

/// Read-side storage access consumed by the export engine.
///
/// Implementations hold a consistent-enough read view for the duration of
/// one export call. Scans are failsafe: a visitor error other than
/// [`ExportError::Terminated`] is reported by the broker and the scan
/// continues with the next entry; `Terminated` aborts the scan and
/// propagates.
pub trait StorageBroker {
    /// The pull-reader type for stored XML subtrees.
    type Reader: XmlStreamReader;

    /// Walk every entry of the collection index.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Terminated`] when the visitor requests
    /// cooperative termination, or [`ExportError::Storage`] on an
    /// unrecoverable index failure.
    fn scan_collections_failsafe(
        &self,
        ctx: &ReadContext,
        visitor: &mut IndexVisitor<'_>,
    ) -> ExportResult<()>;

    /// Walk every entry of the document index. `direct_access` bypasses
    /// caches and reads pages directly.
    ///
    /// # Errors
    ///
    /// Same contract as [`StorageBroker::scan_collections_failsafe`].
    fn scan_documents_failsafe(
        &self,
        ctx: &ReadContext,
        direct_access: bool,
        visitor: &mut IndexVisitor<'_>,
    ) -> ExportResult<()>;

    /// Copy a binary resource's payload verbatim to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Storage`] if the blob cannot be read, or
    /// [`ExportError::Io`] if the sink fails.
    fn read_binary_resource(&self, doc: &Document, sink: &mut dyn Write) -> ExportResult<()>;

    /// The top-level children of an XML document's node tree, in document
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Storage`] if the document node cannot be read.
    fn document_nodes(&self, doc: &Document) -> ExportResult<Vec<NodeHandle>>;

    /// Open a forward-only pull reader over one stored subtree.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Storage`] if the subtree cannot be opened.
    fn xml_stream_reader(&self, doc: &Document, node: &NodeHandle) -> ExportResult<Self::Reader>;
}
