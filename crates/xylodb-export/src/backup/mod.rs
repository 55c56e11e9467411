//! Prior-backup discovery and archive naming.
//!
//! - [`BackupDirectory`] - locate the most recent archive, allocate the
//!   next archive's path
//! - [`BackupDescriptor`] - read a prior archive's properties and
//!   per-collection manifests
//! - [`BackupProperties`] - the `backup.properties` sidecar

mod descriptor;
mod directory;
mod properties;

pub use descriptor::BackupDescriptor;
pub use directory::{BackupDirectory, DATE_FORMAT, FILE_PREFIX};
pub use properties::{
    BackupProperties, PROPERTIES_FILE, PROP_DATE, PROP_INCREMENTAL, PROP_NR_IN_SEQUENCE,
    PROP_PREVIOUS,
};
