//! Canonical relative paths
//!
//! Relative paths are compared as strings with `/` as the only separator,
//! so trees indexed on different platforms (or paths typed by hand with
//! `\`) line up in set operations.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Replace every `\` with `/`
pub fn normalize_separators(path: &str) -> Cow<'_, str> {
    if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    }
}

/// A separator-normalized path relative to a tree root
///
/// Equality, hashing and ordering all work on the canonical form, so
/// `RelativePath::new("a\\b")` and `RelativePath::new("a/b")` are the same
/// value. Ordering is plain lexicographic order of the canonical string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelativePath(String);

impl RelativePath {
    /// Create from any string, normalizing separators
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(normalize_separators(path.as_ref()).into_owned())
    }

    /// Create from a native relative path
    ///
    /// Returns `None` when the path is not valid UTF-8.
    pub fn from_path(path: &Path) -> Option<Self> {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                Component::CurDir => {}
                // Roots and `..` never come out of a walk below a root; keep them
                // verbatim so the value still round-trips.
                other => parts.push(other.as_os_str().to_str()?),
            }
        }
        Some(Self::new(parts.join("/")))
    }

    /// Canonical string form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty components, `.` and `..` excluded
    ///
    /// Dropping `..` keeps [`to_native`](Self::to_native) below its root.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0
            .split('/')
            .filter(|c| !c.is_empty() && *c != "." && *c != "..")
    }

    /// File name (last component)
    pub fn file_name(&self) -> Option<&str> {
        self.components().last()
    }

    /// Join onto `root` using the platform separator
    pub fn to_native(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for component in self.components() {
            path.push(component);
        }
        path
    }

    /// Consume into the canonical string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RelativePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RelativePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for RelativePath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}
