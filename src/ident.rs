//! Package identifiers.
//!
//! A package identifier is a slash-delimited path such as `gh/user/repo/sub`. It names a
//! location in the package namespace and, through the workspace layout, a directory on
//! disk. Ancestry is always separator-bounded: `a/b` owns `a/b/c` but not `a/bc`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix of the whole-subtree wildcard form (`id/...`).
pub const SUBTREE_SUFFIX: &str = "/...";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self(id.trim_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `self` equals `parent` or is nested beneath it.
    pub fn is_same_or_descendant_of(&self, parent: &PackageId) -> bool {
        self.0 == parent.0
            || (self.0.len() > parent.0.len()
                && self.0.starts_with(parent.as_str())
                && self.0.as_bytes()[parent.0.len()] == b'/')
    }

    /// Path of `self` below `parent`, or `None` when `self` is not a strict descendant.
    pub fn relative_to(&self, parent: &PackageId) -> Option<&str> {
        self.0
            .strip_prefix(parent.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PackageId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl AsRef<str> for PackageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A package identifier as handed to the toolchain: a single package, or every package at
/// or below it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageSpec {
    pub id: PackageId,
    pub subtree: bool,
}

impl PackageSpec {
    pub fn single(id: PackageId) -> Self {
        Self { id, subtree: false }
    }

    pub fn subtree(id: PackageId) -> Self {
        Self { id, subtree: true }
    }

    /// True if the spec selects `id`.
    pub fn covers(&self, id: &PackageId) -> bool {
        if self.subtree {
            id.is_same_or_descendant_of(&self.id)
        } else {
            id == &self.id
        }
    }

    /// Render a member of this spec the way failure lists show it: `.../rest` for packages
    /// nested under the spec root, the full identifier otherwise.
    pub fn abbreviate(&self, id: &PackageId) -> String {
        match id.relative_to(&self.id) {
            Some(rest) => format!(".../{}", rest),
            None => id.to_string(),
        }
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subtree {
            write!(f, "{}{}", self.id, SUBTREE_SUFFIX)
        } else {
            write!(f, "{}", self.id)
        }
    }
}
