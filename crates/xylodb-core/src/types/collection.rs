//! Collection records.

use serde::{Deserialize, Serialize};

use crate::encoding::{RecordReader, RecordWriter};
use crate::error::{CoreError, CoreResult};
use crate::types::{CollectionId, Document, Permissions, ResourceKind};
use crate::uri::DbUri;

/// A read-only view of one collection: its identity, permissions, ordered
/// child collection names, and ordered document records.
///
/// The collection URI is not part of the serialized record; it travels in
/// the collection-index key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// The collection id.
    pub id: CollectionId,
    /// Absolute collection URI.
    pub uri: DbUri,
    /// Ownership and mode bits.
    pub permissions: Permissions,
    /// Creation time, epoch milliseconds.
    pub created_ms: u64,
    children: Vec<String>,
    documents: Vec<Document>,
}

impl Collection {
    /// Create an empty collection record.
    #[must_use]
    pub fn new(id: CollectionId, uri: DbUri, permissions: Permissions, created_ms: u64) -> Self {
        Self { id, uri, permissions, created_ms, children: Vec::new(), documents: Vec::new() }
    }

    /// Append a child collection name (last URI segment).
    #[must_use]
    pub fn with_child(mut self, name: impl Into<String>) -> Self {
        self.children.push(name.into());
        self
    }

    /// Append a document record.
    #[must_use]
    pub fn with_document(mut self, document: Document) -> Self {
        self.documents.push(document);
        self
    }

    /// Ordered child collection names.
    #[must_use]
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Ordered document records.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Returns `true` if a child collection with this name exists.
    #[must_use]
    pub fn has_child(&self, name: &str) -> bool {
        self.children.iter().any(|c| c == name)
    }

    /// Returns `true` if a document with this file name exists.
    #[must_use]
    pub fn has_document(&self, name: &str) -> bool {
        self.documents.iter().any(|d| d.file_name == name)
    }

    /// Serialize the record fields (everything but the URI).
    pub fn encode_to(&self, writer: &mut RecordWriter) {
        writer.write_vuint(u64::from(self.id.as_u32()));
        writer.write_string(&self.permissions.owner);
        writer.write_string(&self.permissions.group);
        writer.write_vuint(u64::from(self.permissions.mode));
        writer.write_vuint(self.created_ms);
        writer.write_vuint(self.children.len() as u64);
        for child in &self.children {
            writer.write_string(child);
        }
        writer.write_vuint(self.documents.len() as u64);
        for doc in &self.documents {
            writer.write_u8(doc.kind.type_byte());
            doc.encode_to(writer);
        }
    }

    /// Deserialize a record; the URI comes from the index key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Encoding`] on truncated or malformed input.
    pub fn decode(uri: DbUri, reader: &mut RecordReader<'_>) -> CoreResult<Self> {
        let id = CollectionId::new(
            u32::try_from(reader.read_vuint()?)
                .map_err(|_| CoreError::encoding("collection id out of range"))?,
        );
        let owner = reader.read_string()?;
        let group = reader.read_string()?;
        let mode = u16::try_from(reader.read_vuint()?)
            .map_err(|_| CoreError::encoding("mode out of range"))?;
        let created_ms = reader.read_vuint()?;
        let child_count = reader.read_vuint()?;
        let mut children = Vec::with_capacity(child_count.min(1024) as usize);
        for _ in 0..child_count {
            children.push(reader.read_string()?);
        }
        let doc_count = reader.read_vuint()?;
        let mut documents = Vec::with_capacity(doc_count.min(1024) as usize);
        for _ in 0..doc_count {
            let kind = ResourceKind::from_type_byte(reader.read_u8()?)?;
            documents.push(Document::decode(reader, kind)?);
        }
        Ok(Self {
            id,
            uri,
            permissions: Permissions::new(owner, group, mode),
            created_ms,
            children,
            documents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocId;

    #[test]
    fn record_roundtrip() {
        let collection = Collection::new(
            CollectionId::new(3),
            DbUri::new("/db/plays").unwrap(),
            Permissions::new("will", "authors", 0o755),
            42_000,
        )
        .with_child("tragedies")
        .with_child("comedies")
        .with_document(Document::new(
            DocId::new(1),
            "index.xml",
            ResourceKind::Xml,
            Permissions::default(),
        ));

        let mut w = RecordWriter::new();
        collection.encode_to(&mut w);
        let bytes = w.into_bytes();
        let decoded =
            Collection::decode(DbUri::new("/db/plays").unwrap(), &mut RecordReader::new(&bytes))
                .unwrap();
        assert_eq!(decoded, collection);
        assert!(decoded.has_child("comedies"));
        assert!(decoded.has_document("index.xml"));
        assert!(!decoded.has_document("missing.xml"));
    }

    #[test]
    fn corrupt_record_fails() {
        let bytes = [0xffu8, 0xff, 0xff];
        let result = Collection::decode(DbUri::root(), &mut RecordReader::new(&bytes));
        assert!(result.is_err());
    }
}
