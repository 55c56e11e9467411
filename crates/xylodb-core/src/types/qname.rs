//! Qualified XML names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A qualified XML name: local part plus optional namespace URI and prefix.
///
/// # Example
///
/// ```
/// use xylodb_core::QName;
///
/// let plain = QName::new("scene");
/// assert_eq!(plain.qualified(), "scene");
///
/// let prefixed = QName::prefixed("tei", "body", "http://www.tei-c.org/ns/1.0");
/// assert_eq!(prefixed.qualified(), "tei:body");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QName {
    /// The local part of the name.
    pub local: String,
    /// The namespace URI, if the name is in a namespace.
    pub ns_uri: Option<String>,
    /// The bound prefix, if any.
    pub prefix: Option<String>,
}

impl QName {
    /// Create a name with no namespace.
    #[must_use]
    pub fn new(local: impl Into<String>) -> Self {
        Self { local: local.into(), ns_uri: None, prefix: None }
    }

    /// Create a name in a namespace bound to the default (empty) prefix.
    #[must_use]
    pub fn namespaced(local: impl Into<String>, ns_uri: impl Into<String>) -> Self {
        Self { local: local.into(), ns_uri: Some(ns_uri.into()), prefix: None }
    }

    /// Create a name in a namespace bound to an explicit prefix.
    #[must_use]
    pub fn prefixed(
        prefix: impl Into<String>,
        local: impl Into<String>,
        ns_uri: impl Into<String>,
    ) -> Self {
        Self { local: local.into(), ns_uri: Some(ns_uri.into()), prefix: Some(prefix.into()) }
    }

    /// The name as written in markup: `prefix:local`, or just `local`.
    #[must_use]
    pub fn qualified(&self) -> String {
        match self.prefix.as_deref() {
            Some(p) if !p.is_empty() => format!("{p}:{}", self.local),
            _ => self.local.clone(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_forms() {
        assert_eq!(QName::new("r").qualified(), "r");
        assert_eq!(QName::namespaced("r", "urn:x").qualified(), "r");
        assert_eq!(QName::prefixed("p", "r", "urn:x").qualified(), "p:r");
    }
}
