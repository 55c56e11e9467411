//! SAX-style serialization sinks.
//!
//! The stream renderer and the exporters emit documents as a sequence of
//! [`Receiver`] events; [`XmlSerializer`] is the concrete sink that renders
//! those events as XML text.

mod xml;

pub use xml::{OutputOptions, XmlSerializer};

use xylodb_core::QName;

use crate::error::ExportResult;

/// An ordered list of attributes for one element.
#[derive(Debug, Default, Clone)]
pub struct AttrList {
    items: Vec<(QName, String)>,
}

impl AttrList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute.
    pub fn add(&mut self, name: QName, value: impl Into<String>) {
        self.items.push((name, value.into()));
    }

    /// Iterate attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&QName, &str)> {
        self.items.iter().map(|(n, v)| (n, v.as_str()))
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove all attributes, keeping the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// A SAX-style event sink.
///
/// Event order obligations mirror SAX: prefix mappings surround the element
/// that declared them, `start_document`/`end_document` frame everything.
pub trait Receiver {
    /// Begin the output document.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    fn start_document(&mut self) -> ExportResult<()>;

    /// Finish the output document and flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    fn end_document(&mut self) -> ExportResult<()>;

    /// A namespace prefix comes into scope. An empty prefix declares the
    /// default namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> ExportResult<()>;

    /// A namespace prefix goes out of scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    fn end_prefix_mapping(&mut self, prefix: &str) -> ExportResult<()>;

    /// An element starts.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    fn start_element(&mut self, name: &QName, attributes: &AttrList) -> ExportResult<()>;

    /// An element ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    fn end_element(&mut self, name: &QName) -> ExportResult<()>;

    /// Character data.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    fn characters(&mut self, text: &str) -> ExportResult<()>;

    /// A CDATA section.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    fn cdata_section(&mut self, text: &str) -> ExportResult<()>;

    /// A comment.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    fn comment(&mut self, text: &str) -> ExportResult<()>;

    /// A processing instruction.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying sink fails.
    fn processing_instruction(&mut self, target: &str, data: &str) -> ExportResult<()>;
}
