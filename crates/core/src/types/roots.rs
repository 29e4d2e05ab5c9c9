//! Watched folder roots and watched collection members

use crate::error::{Result, SyncWatchError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Path separator used by document paths
pub const SEPARATOR: char = '/';

/// Normalizes an absolute document path used as a synchronization root
///
/// Trailing separators are dropped (except for the repository root `/`).
/// Relative paths, empty segments and `.`/`..` segments are rejected.
pub fn normalize_root(path: &str) -> Result<String> {
    if path.trim().is_empty() {
        return Err(SyncWatchError::invalid_root(path, "must not be empty"));
    }
    if !path.starts_with(SEPARATOR) {
        return Err(SyncWatchError::invalid_root(path, "must be absolute"));
    }

    let trimmed = path.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        return Ok(SEPARATOR.to_string());
    }

    for segment in trimmed[1..].split(SEPARATOR) {
        match segment {
            "" => return Err(SyncWatchError::invalid_root(path, "contains an empty segment")),
            "." | ".." => {
                return Err(SyncWatchError::invalid_root(
                    path,
                    "contains a relative segment",
                ))
            }
            _ => {}
        }
    }

    Ok(trimmed.to_string())
}

/// Splits a root into the path it matches exactly and the prefix every
/// descendant starts with
///
/// Trailing separators are ignored, so `/a/b` and `/a/b/` both give
/// `("/a/b", "/a/b/")`. The repository root gives `("/", "/")`.
pub fn root_bounds(root: &str) -> (&str, String) {
    let trimmed = root.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() && root.starts_with(SEPARATOR) {
        return (&root[..1], SEPARATOR.to_string());
    }
    (trimmed, format!("{}{}", trimmed, SEPARATOR))
}

/// Returns true if `path` is `root` itself or lies below it
///
/// Matching is segment-exact: `/a/b` covers `/a/b/doc` but not `/a/bc/doc`.
pub fn is_under_root(path: &str, root: &str) -> bool {
    let (exact, prefix) = root_bounds(root);
    path == exact || path.starts_with(&prefix)
}

/// Immutable snapshot of the folder paths a user keeps synchronized
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynchronizationRoots {
    paths: BTreeSet<String>,
}

impl SynchronizationRoots {
    /// Builds a snapshot from raw paths, normalizing each one
    ///
    /// Paths that normalize to the same root collapse into one.
    pub fn new<I, S>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = paths
            .into_iter()
            .map(|p| normalize_root(p.as_ref()))
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Self { paths })
    }

    /// A snapshot with no root
    pub fn empty() -> Self {
        Self::default()
    }

    /// Iterates over the normalized root paths in lexical order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Number of distinct roots
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if no root is watched
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Immutable set of document ids belonging to the user's watched collections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMembership {
    ids: BTreeSet<String>,
}

impl CollectionMembership {
    /// Builds a membership set, ignoring blank ids
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &String| !id.trim().is_empty())
            .collect();
        Self { ids }
    }

    /// A membership set with no document
    pub fn empty() -> Self {
        Self::default()
    }

    /// Iterates over member ids
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if there is no member
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_trailing_separator() {
        assert_eq!(normalize_root("/a/b/").unwrap(), "/a/b");
        assert_eq!(normalize_root("/a/b").unwrap(), "/a/b");
        assert_eq!(normalize_root("/").unwrap(), "/");
        assert_eq!(normalize_root("///").unwrap(), "/");
    }

    #[test]
    fn test_normalize_rejects_malformed_paths() {
        for bad in ["", "   ", "a/b", "/a//b", "/a/./b", "/a/../b"] {
            let err = normalize_root(bad).unwrap_err();
            assert!(err.is_configuration(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_under_root_is_segment_exact() {
        assert!(is_under_root("/a/b/doc1", "/a/b"));
        assert!(is_under_root("/a/b", "/a/b"));
        assert!(!is_under_root("/a/bc/doc1", "/a/b"));
        assert!(!is_under_root("/a", "/a/b"));
        assert!(is_under_root("/anything", "/"));
    }

    #[test]
    fn test_trailing_separator_on_root_is_ignored() {
        assert_eq!(root_bounds("/a/b/"), ("/a/b", "/a/b/".to_string()));
        assert_eq!(root_bounds("/a/b"), ("/a/b", "/a/b/".to_string()));
        assert_eq!(root_bounds("/"), ("/", "/".to_string()));
        assert!(is_under_root("/a/b/c", "/a/b/"));
        assert!(is_under_root("/a/b", "/a/b/"));
        assert!(!is_under_root("/a/bc", "/a/b/"));
    }

    #[test]
    fn test_roots_collapse_duplicates() {
        let roots = SynchronizationRoots::new(["/x", "/x/", "/x/y"]).unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots.paths().collect::<Vec<_>>(), vec!["/x", "/x/y"]);
    }

    #[test]
    fn test_roots_reject_any_bad_path() {
        assert!(SynchronizationRoots::new(["/ok", "relative"]).is_err());
        assert!(SynchronizationRoots::empty().is_empty());
    }

    #[test]
    fn test_collection_membership() {
        let members = CollectionMembership::new(["doc-1", "doc-2", " ", "doc-1"]);
        assert_eq!(members.len(), 2);
        assert_eq!(members.ids().collect::<Vec<_>>(), vec!["doc-1", "doc-2"]);
        assert!(CollectionMembership::empty().is_empty());
    }
}
