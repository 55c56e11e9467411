//! Document records.
//!
//! A [`Document`] is a read-only view of one stored resource: its identity,
//! kind, ownership, and metadata. Payloads are not part of the record; the
//! storage broker streams them separately (node tree for XML resources,
//! opaque blob for binary resources).

use serde::{Deserialize, Serialize};

use crate::encoding::{RecordReader, RecordWriter};
use crate::error::{CoreError, CoreResult};
use crate::types::{DocId, Permissions};

/// Default mime type assumed when document metadata is unreadable.
pub const DEFAULT_MIME_TYPE: &str = "text/xml";

/// The kind of a stored resource, discriminated on disk by a type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// An XML document stored as a node tree.
    Xml,
    /// An opaque binary blob.
    Binary,
}

impl ResourceKind {
    /// The on-disk type byte for this kind.
    #[must_use]
    pub const fn type_byte(self) -> u8 {
        match self {
            Self::Xml => 0,
            Self::Binary => 1,
        }
    }

    /// Decode a kind from its on-disk type byte.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Encoding`] for an unknown type byte.
    pub fn from_type_byte(byte: u8) -> CoreResult<Self> {
        match byte {
            0 => Ok(Self::Xml),
            1 => Ok(Self::Binary),
            other => Err(CoreError::encoding(format!("unknown resource type byte {other:#04x}"))),
        }
    }

    /// Returns `true` for binary resources.
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(self, Self::Binary)
    }
}

/// The DOCTYPE declaration of an XML document, when one was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocTypeDecl {
    /// The document type name.
    pub name: String,
    /// The public identifier, if declared.
    pub public_id: Option<String>,
    /// The system identifier, if declared.
    pub system_id: Option<String>,
}

/// Document metadata stored in a separate sub-record.
///
/// The sub-record can be damaged independently of the main document record,
/// so consumers treat it as optional and substitute defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Creation time, epoch milliseconds.
    pub created_ms: u64,
    /// Last-modified time, epoch milliseconds.
    pub modified_ms: u64,
    /// Declared mime type.
    pub mime_type: String,
    /// DOCTYPE declaration, for XML documents that carried one.
    pub doctype: Option<DocTypeDecl>,
}

impl DocumentMetadata {
    /// Create metadata with the default mime type.
    #[must_use]
    pub fn new(created_ms: u64, modified_ms: u64) -> Self {
        Self { created_ms, modified_ms, mime_type: DEFAULT_MIME_TYPE.to_owned(), doctype: None }
    }

    /// Set the mime type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Attach a DOCTYPE declaration.
    #[must_use]
    pub fn with_doctype(mut self, doctype: DocTypeDecl) -> Self {
        self.doctype = Some(doctype);
        self
    }
}

/// A read-only view of one stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// The document id.
    pub id: DocId,
    /// File name within the parent collection (last URI segment).
    pub file_name: String,
    /// XML or binary.
    pub kind: ResourceKind,
    /// Ownership and mode bits.
    pub permissions: Permissions,
    /// Metadata sub-record, `None` when it could not be read.
    pub metadata: Option<DocumentMetadata>,
}

impl Document {
    /// Create a document record.
    #[must_use]
    pub fn new(
        id: DocId,
        file_name: impl Into<String>,
        kind: ResourceKind,
        permissions: Permissions,
    ) -> Self {
        Self { id, file_name: file_name.into(), kind, permissions, metadata: None }
    }

    /// Attach a metadata sub-record.
    #[must_use]
    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Serialize the record fields.
    ///
    /// The resource kind is not part of the record; it travels in the index
    /// key (or in the enclosing collection record's per-document envelope).
    pub fn encode_to(&self, writer: &mut RecordWriter) {
        writer.write_vuint(u64::from(self.id.as_u32()));
        writer.write_string(&self.file_name);
        writer.write_string(&self.permissions.owner);
        writer.write_string(&self.permissions.group);
        writer.write_vuint(u64::from(self.permissions.mode));
        match &self.metadata {
            None => writer.write_bool(false),
            Some(meta) => {
                writer.write_bool(true);
                writer.write_vuint(meta.created_ms);
                writer.write_vuint(meta.modified_ms);
                writer.write_string(&meta.mime_type);
                match &meta.doctype {
                    None => writer.write_bool(false),
                    Some(dt) => {
                        writer.write_bool(true);
                        writer.write_string(&dt.name);
                        write_opt_string(writer, dt.public_id.as_deref());
                        write_opt_string(writer, dt.system_id.as_deref());
                    }
                }
            }
        }
    }

    /// Deserialize a record whose kind was taken from the index key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Encoding`] on truncated or malformed input.
    pub fn decode(reader: &mut RecordReader<'_>, kind: ResourceKind) -> CoreResult<Self> {
        let id = DocId::new(read_u32(reader)?);
        let file_name = reader.read_string()?;
        let owner = reader.read_string()?;
        let group = reader.read_string()?;
        let mode = u16::try_from(reader.read_vuint()?)
            .map_err(|_| CoreError::encoding("mode out of range"))?;
        let metadata = if reader.read_bool()? {
            let created_ms = reader.read_vuint()?;
            let modified_ms = reader.read_vuint()?;
            let mime_type = reader.read_string()?;
            let doctype = if reader.read_bool()? {
                Some(DocTypeDecl {
                    name: reader.read_string()?,
                    public_id: read_opt_string(reader)?,
                    system_id: read_opt_string(reader)?,
                })
            } else {
                None
            };
            Some(DocumentMetadata { created_ms, modified_ms, mime_type, doctype })
        } else {
            None
        };
        Ok(Self {
            id,
            file_name,
            kind,
            permissions: Permissions::new(owner, group, mode),
            metadata,
        })
    }
}

fn write_opt_string(writer: &mut RecordWriter, value: Option<&str>) {
    match value {
        None => writer.write_bool(false),
        Some(s) => {
            writer.write_bool(true);
            writer.write_string(s);
        }
    }
}

fn read_opt_string(reader: &mut RecordReader<'_>) -> CoreResult<Option<String>> {
    if reader.read_bool()? {
        Ok(Some(reader.read_string()?))
    } else {
        Ok(None)
    }
}

fn read_u32(reader: &mut RecordReader<'_>) -> CoreResult<u32> {
    u32::try_from(reader.read_vuint()?).map_err(|_| CoreError::encoding("id out of range"))
}
