//! Index key layout.
//!
//! The collection store holds two B-tree indices that the failsafe export
//! scanners walk directly:
//!
//! - collection keys: `[0x01][flags u8][collection URI as UTF-8]`, with the
//!   URI starting at [`COLLECTION_KEY_OFFSET_VALUE`];
//! - document keys: `[0x02][collection id u32 BE][type byte][doc id u32 BE]`.
//!
//! A handful of allocator bookkeeping entries live in the collection index
//! under reserved names; scanners skip them silently.

use crate::error::{CoreError, CoreResult};
use crate::types::{CollectionId, DocId, ResourceKind};

/// Key prefix for collection entries.
pub const KEY_PREFIX_COLLECTION: u8 = 0x01;
/// Key prefix for document entries.
pub const KEY_PREFIX_DOCUMENT: u8 = 0x02;

/// Offset of the URI bytes within a collection key.
pub const COLLECTION_KEY_OFFSET_VALUE: usize = 2;

/// Offset of the type byte within a document key.
pub const DOCUMENT_KEY_OFFSET_TYPE: usize = 1 + 4;
/// Offset of the document id within a document key.
pub const DOCUMENT_KEY_OFFSET_DOC_ID: usize = 1 + 4 + 1;
/// Total length of a document key.
pub const DOCUMENT_KEY_LEN: usize = 1 + 4 + 1 + 4;

/// Reserved collection-index entry holding the next collection id.
pub const NEXT_COLLECTION_ID_KEY: &str = "__next_collection_id__";
/// Reserved collection-index entry holding the next document id.
pub const NEXT_DOC_ID_KEY: &str = "__next_doc_id__";
/// Reserved collection-index entry holding freed collection ids.
pub const FREE_COLLECTION_ID_KEY: &str = "__free_collection_ids__";
/// Reserved collection-index entry holding freed document ids.
pub const FREE_DOC_ID_KEY: &str = "__free_doc_ids__";

/// Returns `true` for the allocator bookkeeping names above.
#[must_use]
pub fn is_reserved_collection_key(value: &str) -> bool {
    value == NEXT_COLLECTION_ID_KEY
        || value == NEXT_DOC_ID_KEY
        || value == FREE_COLLECTION_ID_KEY
        || value == FREE_DOC_ID_KEY
}

/// Encode a collection-index key for the given URI.
#[must_use]
pub fn encode_collection_key(uri: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(COLLECTION_KEY_OFFSET_VALUE + uri.len());
    key.push(KEY_PREFIX_COLLECTION);
    key.push(0);
    key.extend_from_slice(uri.as_bytes());
    key
}

/// Decode the URI (or reserved name) stored in a collection key.
///
/// # Errors
///
/// Returns [`CoreError::InvalidKey`] if the key is shorter than the value
/// offset or the value portion is not UTF-8.
pub fn collection_uri_from_key(key: &[u8]) -> CoreResult<&str> {
    let value = key
        .get(COLLECTION_KEY_OFFSET_VALUE..)
        .ok_or_else(|| CoreError::InvalidKey(format!("collection key too short: {} bytes", key.len())))?;
    std::str::from_utf8(value)
        .map_err(|e| CoreError::InvalidKey(format!("collection key is not UTF-8: {e}")))
}

/// Encode a document-index key.
#[must_use]
pub fn encode_document_key(collection: CollectionId, kind: ResourceKind, doc: DocId) -> Vec<u8> {
    let mut key = Vec::with_capacity(DOCUMENT_KEY_LEN);
    key.push(KEY_PREFIX_DOCUMENT);
    key.extend_from_slice(&collection.as_u32().to_be_bytes());
    key.push(kind.type_byte());
    key.extend_from_slice(&doc.as_u32().to_be_bytes());
    key
}

/// Extract the document id from a document key.
///
/// # Errors
///
/// Returns [`CoreError::InvalidKey`] on a truncated key.
pub fn document_id_from_key(key: &[u8]) -> CoreResult<DocId> {
    let bytes = key
        .get(DOCUMENT_KEY_OFFSET_DOC_ID..DOCUMENT_KEY_OFFSET_DOC_ID + 4)
        .ok_or_else(|| CoreError::InvalidKey(format!("document key too short: {} bytes", key.len())))?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    Ok(DocId::new(u32::from_be_bytes(raw)))
}

/// Extract the resource kind from a document key's type byte.
///
/// # Errors
///
/// Returns [`CoreError::InvalidKey`] on a truncated key or
/// [`CoreError::Encoding`] for an unknown type byte.
pub fn document_kind_from_key(key: &[u8]) -> CoreResult<ResourceKind> {
    let byte = *key
        .get(DOCUMENT_KEY_OFFSET_TYPE)
        .ok_or_else(|| CoreError::InvalidKey(format!("document key too short: {} bytes", key.len())))?;
    ResourceKind::from_type_byte(byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_key_roundtrip() {
        let key = encode_collection_key("/db/plays");
        assert_eq!(key[0], KEY_PREFIX_COLLECTION);
        assert_eq!(collection_uri_from_key(&key).unwrap(), "/db/plays");
    }

    #[test]
    fn document_key_roundtrip() {
        let key =
            encode_document_key(CollectionId::new(7), ResourceKind::Binary, DocId::new(1234));
        assert_eq!(key.len(), DOCUMENT_KEY_LEN);
        assert_eq!(document_id_from_key(&key).unwrap(), DocId::new(1234));
        assert_eq!(document_kind_from_key(&key).unwrap(), ResourceKind::Binary);
    }

    #[test]
    fn reserved_keys_recognized() {
        assert!(is_reserved_collection_key(NEXT_COLLECTION_ID_KEY));
        assert!(is_reserved_collection_key(FREE_DOC_ID_KEY));
        assert!(!is_reserved_collection_key("/db"));
    }

    #[test]
    fn short_keys_fail() {
        assert!(collection_uri_from_key(&[KEY_PREFIX_COLLECTION]).is_err());
        assert!(document_id_from_key(&[KEY_PREFIX_DOCUMENT, 0, 0]).is_err());
        assert!(document_kind_from_key(&[KEY_PREFIX_DOCUMENT]).is_err());
    }
}
