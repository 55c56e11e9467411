//! XyloDB Core
//!
//! This crate provides the fundamental types shared across XyloDB: database
//! URIs, collection and document records, identifiers, and the storage
//! encoding they are serialized with.
//!
//! # Overview
//!
//! - **Identifiers**: [`CollectionId`] and [`DocId`] for referencing stored
//!   collections and documents
//! - **Records**: [`Collection`] and [`Document`] read-only views decoded
//!   from the collection store
//! - **URIs**: [`DbUri`], the hierarchical namespace rooted at `/db`
//! - **Encoding**: variable-byte records, index key layout, and the
//!   reversible archive-name escaping
//!
//! # Example
//!
//! ```
//! use xylodb_core::{Collection, CollectionId, DbUri, Document, DocId, Permissions, ResourceKind};
//!
//! let uri = DbUri::new("/db/plays").unwrap();
//! let collection = Collection::new(CollectionId::new(1), uri, Permissions::default(), 0)
//!     .with_child("tragedies")
//!     .with_document(Document::new(
//!         DocId::new(1),
//!         "hamlet.xml",
//!         ResourceKind::Xml,
//!         Permissions::default(),
//!     ));
//!
//! assert!(collection.has_document("hamlet.xml"));
//! ```
//!
//! # Modules
//!
//! - [`types`] - Core data types ([`Collection`], [`Document`], IDs)
//! - [`encoding`] - Record wire format, key layout, name escaping
//! - [`uri`] - Database URIs ([`DbUri`])
//! - [`time`] - Timestamp formatting helpers
//! - [`error`] - Error types ([`CoreError`])

pub mod encoding;
pub mod error;
pub mod time;
pub mod types;
pub mod uri;

// Re-export commonly used types
pub use error::{CoreError, CoreResult};
pub use types::{
    Collection, CollectionId, DocId, DocTypeDecl, Document, DocumentMetadata, DocumentSet,
    Permissions, QName, ResourceKind, DBA_GROUP, DBA_USER, DEFAULT_MIME_TYPE,
};
pub use uri::DbUri;
