//! I define [`TrellisIdentifier`], the identifier of a repository
//! resource.
//!

use std::fmt::Display;

/// Scheme prefix of internal resource iris.
const INTERNAL_PREFIX: &str = "trellis:";

/// Identifier of a repository resource, addressed by partition and
/// path.
///
/// An identifier has two total renderings, inverses of each other
/// for every in scope value:
///
/// - internal iri: `trellis:<partition>/<path>`,
/// - external url: `<base_url><partition>/<path>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrellisIdentifier {
    partition: String,
    path: String,
}

/// Error of an invalid identifier rendering.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum InvalidIdentifier {
    /// Rendering doesn't carry the internal scheme.
    #[error("Given iri is not in the internal identifier scheme.")]
    NotInternal,

    /// Rendering is outside the repository url space.
    #[error("Given url is not inside the repository url space.")]
    NotInRepository,

    /// Partition segment is empty.
    #[error("Given rendering has an empty partition segment.")]
    EmptyPartition,
}

impl TrellisIdentifier {
    /// Create a new identifier from partition and path. The path
    /// may be empty, and may end with `/`.
    pub fn new(partition: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            path: path.into(),
        }
    }

    /// The partition segment.
    #[inline]
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// The path under the partition.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Render the internal iri, `trellis:<partition>/<path>`.
    pub fn internal_iri(&self) -> String {
        if self.path.is_empty() {
            format!("{}{}", INTERNAL_PREFIX, self.partition)
        } else {
            format!("{}{}/{}", INTERNAL_PREFIX, self.partition, self.path)
        }
    }

    /// Resolve an identifier from an internal iri.
    pub fn from_internal(iri: &str) -> Result<Self, InvalidIdentifier> {
        let rest = iri
            .strip_prefix(INTERNAL_PREFIX)
            .ok_or(InvalidIdentifier::NotInternal)?;
        Self::from_relative(rest)
    }

    /// Render the external url under given base url. The base url
    /// must end with `/`.
    pub fn external_url(&self, base_url: &str) -> String {
        debug_assert!(base_url.ends_with('/'));
        if self.path.is_empty() {
            format!("{}{}", base_url, self.partition)
        } else {
            format!("{}{}/{}", base_url, self.partition, self.path)
        }
    }

    /// Resolve an identifier from an external url under given base
    /// url.
    pub fn from_external(url: &str, base_url: &str) -> Result<Self, InvalidIdentifier> {
        let rest = url
            .strip_prefix(base_url)
            .ok_or(InvalidIdentifier::NotInRepository)?;
        Self::from_relative(rest)
    }

    fn from_relative(rest: &str) -> Result<Self, InvalidIdentifier> {
        let (partition, path) = match rest.split_once('/') {
            Some((partition, path)) => (partition, path),
            None => (rest, ""),
        };
        if partition.is_empty() {
            return Err(InvalidIdentifier::EmptyPartition);
        }
        Ok(Self::new(partition, path))
    }

    /// Identifier of the parent, when the path has at least one
    /// segment.
    pub fn parent(&self) -> Option<Self> {
        let path = self.path.trim_end_matches('/');
        if path.is_empty() {
            return None;
        }
        let parent_path = match path.rsplit_once('/') {
            Some((parent_path, _)) => parent_path,
            None => "",
        };
        Some(Self::new(self.partition.clone(), parent_path))
    }

    /// Identifier of a child with given last segment.
    pub fn child(&self, segment: &str) -> Self {
        let parent_path = self.path.trim_end_matches('/');
        let path = if parent_path.is_empty() {
            segment.to_owned()
        } else {
            format!("{}/{}", parent_path, segment)
        };
        Self::new(self.partition.clone(), path)
    }
}

impl Display for TrellisIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_iri())
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_err, assert_ok};
    use rstest::rstest;

    use super::*;

    const BASE_URL: &str = "http://example.org/";

    #[rstest]
    #[case("repo1", "resource", "trellis:repo1/resource", "http://example.org/repo1/resource")]
    #[case("repo1", "", "trellis:repo1", "http://example.org/repo1")]
    #[case("repo1", "a/b/", "trellis:repo1/a/b/", "http://example.org/repo1/a/b/")]
    fn renderings_are_inverses(
        #[case] partition: &str,
        #[case] path: &str,
        #[case] expected_iri: &str,
        #[case] expected_url: &str,
    ) {
        let id = TrellisIdentifier::new(partition, path);

        assert_eq!(id.internal_iri(), expected_iri);
        assert_eq!(id.external_url(BASE_URL), expected_url);

        assert_eq!(assert_ok!(TrellisIdentifier::from_internal(expected_iri)), id);
        assert_eq!(
            assert_ok!(TrellisIdentifier::from_external(expected_url, BASE_URL)),
            id
        );
    }

    #[test]
    fn foreign_renderings_are_rejected(){
        assert_err!(TrellisIdentifier::from_internal("urn:uuid:abc"));
        assert_err!(TrellisIdentifier::from_external(
            "http://other.example/repo1/x",
            BASE_URL
        ));
        assert_err!(TrellisIdentifier::from_internal("trellis:"));
    }

    #[rstest]
    #[case("repo1", "", "child", "trellis:repo1/child")]
    #[case("repo1", "resource", "child", "trellis:repo1/resource/child")]
    #[case("repo1", "resource/", "child", "trellis:repo1/resource/child")]
    fn child_appends_one_segment(
        #[case] partition: &str,
        #[case] path: &str,
        #[case] segment: &str,
        #[case] expected_iri: &str,
    ) {
        let child = TrellisIdentifier::new(partition, path).child(segment);
        assert_eq!(child.internal_iri(), expected_iri);
    }

    #[rstest]
    #[case("repo1", "a/b/c", Some("trellis:repo1/a/b"))]
    #[case("repo1", "a/", Some("trellis:repo1"))]
    #[case("repo1", "", None)]
    fn parent_strips_one_segment(
        #[case] partition: &str,
        #[case] path: &str,
        #[case] expected_iri: Option<&str>,
    ) {
        let parent = TrellisIdentifier::new(partition, path).parent();
        assert_eq!(parent.map(|p| p.internal_iri()), expected_iri.map(ToOwned::to_owned));
    }

    #[test]
    fn child_and_parent_are_inverses() {
        let container = TrellisIdentifier::new("repo1", "resource");
        assert_eq!(container.child("x").parent(), Some(container));
    }
}
