//! I define the weak entity tags of repository representations.
//!

use std::fmt::Display;

use chrono::{DateTime, Utc};
use md5::{Digest as _, Md5};
use trellis_api::model::{Binary, Resource};

/// An entity tag. The repository only ever produces weak tags;
/// weak comparison is used on both match headers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTag {
    /// If the tag is weak.
    pub weak: bool,

    /// The opaque tag text, without quotes.
    pub opaque: String,
}

impl EntityTag {
    /// Create a weak tag with given opaque text.
    pub fn weak(opaque: impl Into<String>) -> Self {
        Self {
            weak: true,
            opaque: opaque.into(),
        }
    }

    /// Parse an entity tag. The opaque text must be quoted.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (weak, quoted) = match s.strip_prefix("W/") {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
        Some(Self {
            weak,
            opaque: inner.to_owned(),
        })
    }

    /// Weak comparison: opaque texts match, weakness ignored.
    #[inline]
    pub fn weak_eq(&self, other: &Self) -> bool {
        self.opaque == other.opaque
    }
}

impl Display for EntityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.weak {
            write!(f, "W/\"{}\"", self.opaque)
        } else {
            write!(f, "\"{}\"", self.opaque)
        }
    }
}

fn md5_hex(input: &str) -> String {
    let digest = Md5::digest(input.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Weak entity tag of an rdf representation: equal modified
/// instants and urls yield equal tags.
pub fn rdf_etag(modified: DateTime<Utc>, external_url: &str) -> EntityTag {
    EntityTag::weak(md5_hex(&format!("{}{}", modified.timestamp(), external_url)))
}

/// Weak entity tag of a binary representation, sensitive to the
/// content's own modified instant and size.
pub fn binary_etag(binary: &Binary, external_url: &str) -> EntityTag {
    EntityTag::weak(md5_hex(&format!(
        "{}{}{}",
        binary.modified.timestamp(),
        binary.size,
        external_url
    )))
}

/// The entity tag of given resource's selected representation.
pub fn resource_etag(resource: &Resource, external_url: &str, binary_selected: bool) -> EntityTag {
    match (&resource.binary, binary_selected) {
        (Some(binary), true) => binary_etag(binary, external_url),
        _ => rdf_etag(resource.modified, external_url),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use claims::{assert_none, assert_some};
    use rstest::rstest;

    use super::*;

    #[test]
    fn equal_inputs_yield_equal_tags() {
        let modified = Utc.timestamp_opt(1496277129, 0).unwrap();
        let a = rdf_etag(modified, "http://example.org/repo1/resource");
        let b = rdf_etag(modified, "http://example.org/repo1/resource");
        assert_eq!(a, b);
        assert!(a.weak);

        let c = rdf_etag(modified, "http://example.org/repo1/other");
        assert!(!a.weak_eq(&c));
    }

    #[rstest]
    #[case("W/\"abc\"", true, "abc")]
    #[case("\"abc\"", false, "abc")]
    fn quoted_tags_parse(#[case] s: &str, #[case] weak: bool, #[case] opaque: &str) {
        let tag = assert_some!(EntityTag::parse(s));
        assert_eq!(tag.weak, weak);
        assert_eq!(tag.opaque, opaque);
        assert_eq!(tag.to_string(), s);
    }

    #[test]
    fn unquoted_tags_are_rejected() {
        assert_none!(EntityTag::parse("abc"));
        assert_none!(EntityTag::parse("W/abc"));
    }
}
