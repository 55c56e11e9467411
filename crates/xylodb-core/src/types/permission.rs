//! Unix-style ownership and permission bits.

use serde::{Deserialize, Serialize};

/// Default database administrator account.
pub const DBA_USER: &str = "admin";
/// Default database administrator group.
pub const DBA_GROUP: &str = "dba";

/// Owner, group, and mode bits attached to a collection or document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// Owning user name.
    pub owner: String,
    /// Owning group name.
    pub group: String,
    /// Permission bits (Unix octal semantics).
    pub mode: u16,
}

impl Permissions {
    /// Create permissions from owner, group, and mode bits.
    #[must_use]
    pub fn new(owner: impl Into<String>, group: impl Into<String>, mode: u16) -> Self {
        Self { owner: owner.into(), group: group.into(), mode }
    }

    /// Administrator-owned permissions used for synthetic collections.
    #[must_use]
    pub fn dba() -> Self {
        Self::new(DBA_USER, DBA_GROUP, 0o771)
    }

    /// The mode bits rendered as an octal string, e.g. `755`.
    #[must_use]
    pub fn mode_octal(&self) -> String {
        format!("{:o}", self.mode)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::new(DBA_USER, DBA_GROUP, 0o755)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octal_rendering() {
        assert_eq!(Permissions::new("alice", "users", 0o644).mode_octal(), "644");
        assert_eq!(Permissions::dba().mode_octal(), "771");
    }
}
