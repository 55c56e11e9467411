//! Collection manifest schema.
//!
//! Every exported collection carries a `__contents__.xml` manifest in the
//! reserved backup namespace describing its permissions, resources, child
//! collections, and (for incremental archives) deletions since the
//! predecessor. This module holds the schema constants shared by the
//! writers and the [`reader`].

pub mod reader;

pub use reader::{parse_manifest, Attributes, ManifestVisitor};

/// The reserved backup namespace.
pub const BACKUP_NS: &str = "http://xylodb.org/ns/backup";

/// Manifest file name within each collection.
pub const CONTENTS_FILE: &str = "__contents__.xml";
/// Name of the synthetic collection holding rescued orphans.
pub const LOST_AND_FOUND_NAME: &str = "__lost_and_found__";
/// Full URI of the synthetic collection holding rescued orphans.
pub const LOST_AND_FOUND_URI: &str = "/db/__lost_and_found__";
/// Permission mode written for the lost-and-found collection.
pub const LOST_AND_FOUND_MODE: &str = "0771";
/// The transient temp collection, never exported.
pub const TEMP_COLLECTION_URI: &str = "/db/system/temp";

/// Current manifest schema version.
pub const CURRENT_VERSION: u32 = 1;

/// `collection` element.
pub const ELEM_COLLECTION: &str = "collection";
/// `subcollection` element.
pub const ELEM_SUBCOLLECTION: &str = "subcollection";
/// `resource` element.
pub const ELEM_RESOURCE: &str = "resource";
/// `deleted` element.
pub const ELEM_DELETED: &str = "deleted";

/// `name` attribute.
pub const ATTR_NAME: &str = "name";
/// `filename` attribute.
pub const ATTR_FILENAME: &str = "filename";
/// `version` attribute.
pub const ATTR_VERSION: &str = "version";
/// `owner` attribute.
pub const ATTR_OWNER: &str = "owner";
/// `group` attribute.
pub const ATTR_GROUP: &str = "group";
/// `mode` attribute.
pub const ATTR_MODE: &str = "mode";
/// `created` attribute.
pub const ATTR_CREATED: &str = "created";
/// `modified` attribute.
pub const ATTR_MODIFIED: &str = "modified";
/// `type` attribute.
pub const ATTR_TYPE: &str = "type";
/// `skip` attribute.
pub const ATTR_SKIP: &str = "skip";
/// `mimetype` attribute.
pub const ATTR_MIMETYPE: &str = "mimetype";
/// `namedoctype` attribute.
pub const ATTR_NAMEDOCTYPE: &str = "namedoctype";
/// `publicid` attribute.
pub const ATTR_PUBLICID: &str = "publicid";
/// `systemid` attribute.
pub const ATTR_SYSTEMID: &str = "systemid";

/// `type` value for XML resources.
pub const TYPE_XML_RESOURCE: &str = "XMLResource";
/// `type` value for binary resources.
pub const TYPE_BINARY_RESOURCE: &str = "BinaryResource";
/// `deleted type` value for collections.
pub const TYPE_COLLECTION: &str = "collection";
/// `deleted type` value for resources.
pub const TYPE_RESOURCE: &str = "resource";

/// `skip` value for omitted payloads.
pub const SKIP_YES: &str = "yes";
/// `skip` value for written payloads.
pub const SKIP_NO: &str = "no";
