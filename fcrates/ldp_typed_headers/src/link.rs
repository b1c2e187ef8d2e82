//! I define [`Link`] typed header and related structures.
//!

use std::{fmt::Display, str::FromStr};

use headers::Header;
use iri_string::types::{UriReferenceStr, UriReferenceString};

use crate::common::field::{is_token, parse_param, split_csv, split_semis};

/// `Link` header, defined in
/// [rfc8288](https://datatracker.ietf.org/doc/html/rfc8288).
///
/// The Link header field provides a means for serializing one or
/// more links into HTTP headers.
///
/// ```txt
///     Link       = #link-value
///     link-value = "<" URI-Reference ">" *( OWS ";" OWS link-param )
///     link-param = token BWS [ "=" BWS ( token / quoted-string ) ]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    /// List of link values.
    pub values: Vec<LinkValue>,
}

impl Header for Link {
    fn name() -> &'static headers::HeaderName {
        &http::header::LINK
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        Self: Sized,
        I: Iterator<Item = &'i headers::HeaderValue>,
    {
        Ok(Self {
            values: values
                .flat_map(split_csv)
                .map(LinkValue::from_str)
                .collect::<Result<_, _>>()
                .map_err(|_| headers::Error::invalid())?,
        })
    }

    #[inline]
    fn encode<E: Extend<headers::HeaderValue>>(&self, values: &mut E) {
        values.extend(self.values.iter().map(|v| {
            v.to_string()
                .parse()
                .expect("link value is always a valid HeaderValue")
        }));
    }
}

impl Link {
    /// Iterate over targets of values carrying given relation type.
    pub fn targets_with_rel<'s>(&'s self, rel: &'s str) -> impl Iterator<Item = &'s UriReferenceStr> {
        self.values
            .iter()
            .filter(move |v| v.has_rel(rel))
            .map(|v| v.target.as_ref())
    }
}

impl FromIterator<LinkValue> for Link {
    fn from_iter<T: IntoIterator<Item = LinkValue>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// A single link-value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkValue {
    /// Link target uri reference.
    pub target: UriReferenceString,

    /// Link params, in declared order.
    pub params: Vec<(String, String)>,
}

/// Error of an invalid encoded link-value.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum InvalidEncodedLinkValue {
    /// Target is not angle-bracket delimited.
    #[error("Given link-value has no angle bracketed target.")]
    UnDelimitedTarget,

    /// Target is not a valid uri reference.
    #[error("Given link-value target is not a valid uri reference.")]
    InvalidTargetUri,

    /// A link param is malformed.
    #[error("Given link-value has a malformed param.")]
    InvalidParam,
}

impl FromStr for LinkValue {
    type Err = InvalidEncodedLinkValue;

    fn from_str(value_str: &str) -> Result<Self, Self::Err> {
        let value_str = value_str.trim();
        let rest = value_str
            .strip_prefix('<')
            .ok_or(InvalidEncodedLinkValue::UnDelimitedTarget)?;
        let (target_str, params_str) = rest
            .split_once('>')
            .ok_or(InvalidEncodedLinkValue::UnDelimitedTarget)?;

        let target: UriReferenceString = target_str
            .parse()
            .map_err(|_| InvalidEncodedLinkValue::InvalidTargetUri)?;

        let params = split_semis(params_str)
            .map(|p| parse_param(p).ok_or(InvalidEncodedLinkValue::InvalidParam))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { target, params })
    }
}

impl Display for LinkValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.target)?;
        for (name, value) in &self.params {
            write!(f, "; {}=\"", name)?;
            for c in value.chars() {
                if c == '"' || c == '\\' {
                    write!(f, "\\")?;
                }
                write!(f, "{}", c)?;
            }
            write!(f, "\"")?;
        }
        Ok(())
    }
}

impl LinkValue {
    /// Try to create a new link-value with given target and
    /// relation type.
    pub fn try_new_basic(
        target: impl AsRef<str>,
        rel: impl Into<String>,
    ) -> Result<Self, InvalidEncodedLinkValue> {
        Ok(Self {
            target: target
                .as_ref()
                .parse()
                .map_err(|_| InvalidEncodedLinkValue::InvalidTargetUri)?,
            params: vec![("rel".to_owned(), rel.into())],
        })
    }

    /// Attach a param to this link-value.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name: String = name.into();
        debug_assert!(is_token(&name));
        self.params.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    /// Get the first value of the param with given name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over relation types of this value. The `rel` param
    /// value is a space separated list.
    pub fn rels(&self) -> impl Iterator<Item = &str> {
        self.param("rel").into_iter().flat_map(|v| v.split_whitespace())
    }

    /// Check if this value carries given relation type.
    #[inline]
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels().any(|r| r == rel)
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_err, assert_ok, assert_some_eq};
    use headers::HeaderValue;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::undelimited_target("http://www.w3.org/ns/ldp#Resource; rel=type")]
    #[case::invalid_param_name("<http://example.org/a>; re l=type")]
    #[case::invalid_target("<http://exa mple.org/a>; rel=type")]
    fn invalid_link_values_will_be_rejected(#[case] value_str: &str) {
        assert_err!(LinkValue::from_str(value_str));
    }

    #[rstest]
    #[case(
        "<http://www.w3.org/ns/ldp#Container>; rel=\"type\"",
        "http://www.w3.org/ns/ldp#Container",
        "type"
    )]
    #[case(
        "<http://example.org/res?version=1496262729000>; rel=\"memento\"; datetime=\"Wed, 31 May 2017 20:32:09 GMT\"",
        "http://example.org/res?version=1496262729000",
        "memento"
    )]
    fn valid_link_values_will_be_decoded(
        #[case] value_str: &str,
        #[case] expected_target: &str,
        #[case] expected_rel: &str,
    ) {
        let value = assert_ok!(LinkValue::from_str(value_str));
        assert_eq!(value.target.as_str(), expected_target);
        assert!(value.has_rel(expected_rel));
    }

    #[test]
    fn multi_value_header_will_be_flattened() {
        let header_value = HeaderValue::from_static(
            "<http://example.org/a>; rel=\"original timegate\", <http://example.org/b>; rel=memento",
        );
        let link = assert_ok!(Link::decode(&mut std::iter::once(&header_value)));
        assert_eq!(link.values.len(), 2);
        assert!(link.values[0].has_rel("original"));
        assert!(link.values[0].has_rel("timegate"));
        assert_some_eq!(
            link.targets_with_rel("memento").next().map(|t| t.as_str()),
            "http://example.org/b"
        );
    }

    #[test]
    fn round_trip_preserves_value() {
        let value = assert_ok!(LinkValue::try_new_basic(
            "http://example.org/res?ext=timemap",
            "timemap"
        ))
        .with_param("type", "application/link-format");

        let re_parsed = assert_ok!(LinkValue::from_str(&value.to_string()));
        assert_eq!(value, re_parsed);
    }
}
