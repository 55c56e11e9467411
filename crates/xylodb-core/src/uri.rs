//! Hierarchical database URIs.
//!
//! Every collection and resource in a XyloDB database is addressed by a
//! hierarchical URI rooted at `/db`. URIs are stored fully decoded; the
//! reversible archive-name encoding lives in [`crate::encoding::escape`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A decoded, absolute database URI.
///
/// Invariants: the path always starts with [`DbUri::ROOT`], has no trailing
/// slash (the root itself is exactly `/db`), and contains no empty segments.
///
/// # Example
///
/// ```
/// use xylodb_core::DbUri;
///
/// let uri = DbUri::new("/db/shakespeare/plays").unwrap();
/// assert_eq!(uri.last_segment(), "plays");
/// assert_eq!(uri.parent().unwrap().as_str(), "/db/shakespeare");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DbUri(String);

impl DbUri {
    /// The root collection path.
    pub const ROOT: &'static str = "/db";

    /// Returns the root collection URI.
    #[must_use]
    pub fn root() -> Self {
        Self(Self::ROOT.to_owned())
    }

    /// Parses and validates an absolute database URI.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidUri`] if the path does not start at the
    /// database root, has a trailing slash, or contains empty segments.
    pub fn new(path: impl Into<String>) -> CoreResult<Self> {
        let path = path.into();
        if path == Self::ROOT {
            return Ok(Self(path));
        }
        let rest = path
            .strip_prefix(Self::ROOT)
            .and_then(|r| r.strip_prefix('/'))
            .ok_or_else(|| CoreError::InvalidUri(path.clone()))?;
        if rest.is_empty() || rest.split('/').any(str::is_empty) {
            return Err(CoreError::InvalidUri(path));
        }
        Ok(Self(path))
    }

    /// Appends one segment to this URI.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidUri`] if the segment is empty or contains
    /// a path separator.
    pub fn child(&self, segment: &str) -> CoreResult<Self> {
        if segment.is_empty() || segment.contains('/') {
            return Err(CoreError::InvalidUri(format!("{}/{segment}", self.0)));
        }
        Ok(Self(format!("{}/{segment}", self.0)))
    }

    /// Returns the parent collection URI, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let idx = self.0.rfind('/')?;
        Some(Self(self.0[..idx].to_owned()))
    }

    /// Returns the last path segment (`db` for the root).
    #[must_use]
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns `true` if this is the root collection URI.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    /// The URI as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DbUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
