//! Core data types for XyloDB.
//!
//! This module defines the read-only views of stored state that the export
//! engine works with: identifiers, permissions, document and collection
//! records, and qualified XML names.

mod collection;
mod docset;
mod document;
mod id;
mod permission;
mod qname;

pub use collection::Collection;
pub use docset::DocumentSet;
pub use document::{
    DocTypeDecl, Document, DocumentMetadata, ResourceKind, DEFAULT_MIME_TYPE,
};
pub use id::{CollectionId, DocId};
pub use permission::{Permissions, DBA_GROUP, DBA_USER};
pub use qname::QName;
