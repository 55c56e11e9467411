//! Consistency-check error reports.
//!
//! The consistency checker runs before an export and hands the engine an
//! ordered list of damage reports. Only two kinds influence the export:
//! damaged resources are left out of the archive, and damaged collections
//! are skipped so their surviving documents can be rescued by the orphan
//! pass.

use xylodb_core::{CollectionId, DbUri, DocId};

/// One finding from the consistency checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorReport {
    /// A document's payload or metadata could not be accessed.
    ResourceAccessFailed {
        /// Id of the damaged document.
        doc_id: DocId,
    },
    /// A collection subtree is damaged.
    ChildCollection {
        /// Id of the damaged collection.
        collection_id: CollectionId,
        /// URI of the damaged collection.
        uri: DbUri,
    },
}

/// Returns `true` if the reports mark this document as inaccessible.
#[must_use]
pub fn damaged_document(reports: &[ErrorReport], id: DocId) -> bool {
    reports
        .iter()
        .any(|r| matches!(r, ErrorReport::ResourceAccessFailed { doc_id } if *doc_id == id))
}

/// Returns `true` if the reports mark this collection id as damaged.
#[must_use]
pub fn damaged_collection(reports: &[ErrorReport], id: CollectionId) -> bool {
    reports
        .iter()
        .any(|r| matches!(r, ErrorReport::ChildCollection { collection_id, .. } if *collection_id == id))
}

/// Returns `true` if the reports mark this collection URI as damaged.
#[must_use]
pub fn damaged_child(reports: &[ErrorReport], uri: &DbUri) -> bool {
    reports
        .iter()
        .any(|r| matches!(r, ErrorReport::ChildCollection { uri: u, .. } if u == uri))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reports_mark_nothing() {
        assert!(!damaged_document(&[], DocId::new(1)));
        assert!(!damaged_collection(&[], CollectionId::new(1)));
        assert!(!damaged_child(&[], &DbUri::root()));
    }

    #[test]
    fn matches_by_id_and_uri() {
        let uri = DbUri::new("/db/broken").unwrap();
        let reports = vec![
            ErrorReport::ResourceAccessFailed { doc_id: DocId::new(7) },
            ErrorReport::ChildCollection { collection_id: CollectionId::new(3), uri: uri.clone() },
        ];
        assert!(damaged_document(&reports, DocId::new(7)));
        assert!(!damaged_document(&reports, DocId::new(8)));
        assert!(damaged_collection(&reports, CollectionId::new(3)));
        assert!(damaged_child(&reports, &uri));
        assert!(!damaged_child(&reports, &DbUri::root()));
    }
}
