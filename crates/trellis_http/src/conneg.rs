//! I define the content negotiator: it picks a concrete rdf
//! syntax or a binary media type from an `Accept` list and the set
//! of available variants.
//!

use ldp_typed_headers::accept::{Accept, AcceptValue};
use mime::Mime;
use once_cell::sync::Lazy;
use trellis_api::service::{JsonLdProfile, RdfSyntax};

use crate::error::LdpError;

/// application/link-format
pub static APPLICATION_LINK_FORMAT: Lazy<Mime> =
    Lazy::new(|| "application/link-format".parse().unwrap());

/// An rdf representation variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RdfVariant {
    /// The concrete syntax.
    pub syntax: RdfSyntax,

    /// The serialization profile, for syntaxes that have one.
    pub profile: Option<JsonLdProfile>,
}

impl RdfVariant {
    /// The default variant when no `Accept` is supplied.
    pub const DEFAULT: Self = Self {
        syntax: RdfSyntax::Turtle,
        profile: None,
    };

    /// Media type of the variant.
    pub fn media_type(&self) -> Mime {
        self.syntax.media_type()
    }
}

/// The selected representation of a non-rdf resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarySelection {
    /// The blob content itself.
    Content,

    /// The description graph, in an rdf variant.
    Description(RdfVariant),
}

/// The selected representation of a time map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimemapVariant {
    /// application/link-format, the default.
    LinkFormat,

    /// A json-ld rendering.
    JsonLd(JsonLdProfile),
}

/// Match one accept-value against one rdf syntax, resolving the
/// json-ld profile. `None` means no match.
fn match_rdf(value: &AcceptValue, syntax: RdfSyntax) -> Option<RdfVariant> {
    if !value.matches_essence(&syntax.media_type()) {
        return None;
    }

    if syntax != RdfSyntax::JsonLd {
        return Some(RdfVariant {
            syntax,
            profile: None,
        });
    }

    // A json-ld request without a profile is treated as the
    // expanded profile. A profile param is matched literally
    // against the known profile iris.
    let profile = match value.media_range.get_param("profile") {
        None => JsonLdProfile::Expanded,
        Some(param) => param
            .as_str()
            .split_whitespace()
            .find_map(JsonLdProfile::from_iri)?,
    };

    Some(RdfVariant {
        syntax,
        profile: Some(profile),
    })
}

/// Pick an rdf variant for given `Accept` list. With no `Accept`,
/// turtle wins.
pub fn negotiate_rdf(accept: Option<&Accept>) -> Result<RdfVariant, LdpError> {
    let accept = match accept {
        Some(accept) if !accept.values.is_empty() => accept,
        _ => return Ok(RdfVariant::DEFAULT),
    };

    for value in accept.sorted_values() {
        if value.q.is_zero() {
            continue;
        }
        // Ties at equal rank break by the declared variant order.
        for syntax in RdfSyntax::ALL {
            if let Some(variant) = match_rdf(value, *syntax) {
                return Ok(variant);
            }
        }
    }

    Err(LdpError::NotAcceptable)
}

/// Pick the representation of a non-rdf resource: its own content
/// type, or an rdf variant of its description.
pub fn negotiate_binary(
    accept: Option<&Accept>,
    content_type: &Mime,
) -> Result<BinarySelection, LdpError> {
    let accept = match accept {
        Some(accept) if !accept.values.is_empty() => accept,
        _ => return Ok(BinarySelection::Content),
    };

    for value in accept.sorted_values() {
        if value.q.is_zero() {
            continue;
        }
        if value.matches(content_type) {
            return Ok(BinarySelection::Content);
        }
        for syntax in RdfSyntax::ALL {
            if let Some(variant) = match_rdf(value, *syntax) {
                return Ok(BinarySelection::Description(variant));
            }
        }
    }

    Err(LdpError::NotAcceptable)
}

/// Pick the representation of a time map.
pub fn negotiate_timemap(accept: Option<&Accept>) -> Result<TimemapVariant, LdpError> {
    let accept = match accept {
        Some(accept) if !accept.values.is_empty() => accept,
        _ => return Ok(TimemapVariant::LinkFormat),
    };

    for value in accept.sorted_values() {
        if value.q.is_zero() {
            continue;
        }
        if value.matches_essence(&APPLICATION_LINK_FORMAT) {
            return Ok(TimemapVariant::LinkFormat);
        }
        if let Some(variant) = match_rdf(value, RdfSyntax::JsonLd) {
            return Ok(TimemapVariant::JsonLd(
                variant.profile.unwrap_or(JsonLdProfile::Expanded),
            ));
        }
    }

    Err(LdpError::NotAcceptable)
}

#[cfg(test)]
mod tests {
    use claims::{assert_err, assert_ok};
    use headers::{Header, HeaderValue};
    use rstest::rstest;

    use super::*;

    fn accept(value_str: &str) -> Accept {
        let header_value = HeaderValue::from_str(value_str).unwrap();
        Accept::decode(&mut std::iter::once(&header_value)).unwrap()
    }

    #[rstest]
    #[case("text/turtle", RdfSyntax::Turtle, None)]
    #[case("application/n-triples", RdfSyntax::NTriples, None)]
    #[case("application/ld+json", RdfSyntax::JsonLd, Some(JsonLdProfile::Expanded))]
    #[case(
        "application/ld+json;profile=\"http://www.w3.org/ns/json-ld#compacted\"",
        RdfSyntax::JsonLd,
        Some(JsonLdProfile::Compacted)
    )]
    #[case("text/html", RdfSyntax::Html, None)]
    #[case("text/*", RdfSyntax::Turtle, None)]
    #[case("*/*", RdfSyntax::Turtle, None)]
    fn rdf_negotiation_picks_the_first_compatible_variant(
        #[case] accept_str: &str,
        #[case] expected_syntax: RdfSyntax,
        #[case] expected_profile: Option<JsonLdProfile>,
    ) {
        let variant = assert_ok!(negotiate_rdf(Some(&accept(accept_str))));
        assert_eq!(variant.syntax, expected_syntax);
        assert_eq!(variant.profile, expected_profile);
    }

    #[test]
    fn rdf_negotiation_defaults_to_turtle() {
        assert_eq!(assert_ok!(negotiate_rdf(None)), RdfVariant::DEFAULT);
    }

    #[test]
    fn rdf_negotiation_honours_weights() {
        let variant = assert_ok!(negotiate_rdf(Some(&accept(
            "text/turtle;q=0.3, application/ld+json;q=0.9"
        ))));
        assert_eq!(variant.syntax, RdfSyntax::JsonLd);
    }

    #[test]
    fn unacceptable_requests_are_rejected() {
        assert_err!(negotiate_rdf(Some(&accept("application/zip"))));
        assert_err!(negotiate_rdf(Some(&accept(
            "application/ld+json;profile=\"http://www.w3.org/ns/json-ld#framed\""
        ))));
    }

    #[rstest]
    #[case(None, BinarySelection::Content)]
    #[case(Some("text/plain"), BinarySelection::Content)]
    #[case(Some("*/*"), BinarySelection::Content)]
    #[case(
        Some("text/turtle"),
        BinarySelection::Description(RdfVariant { syntax: RdfSyntax::Turtle, profile: None })
    )]
    fn binary_negotiation_prefers_own_content_type(
        #[case] accept_str: Option<&str>,
        #[case] expected: BinarySelection,
    ) {
        let accept_value = accept_str.map(accept);
        let selection = assert_ok!(negotiate_binary(accept_value.as_ref(), &mime::TEXT_PLAIN));
        assert_eq!(selection, expected);
    }

    #[test]
    fn timemap_negotiation_defaults_to_link_format() {
        assert_eq!(
            assert_ok!(negotiate_timemap(None)),
            TimemapVariant::LinkFormat
        );
        assert_eq!(
            assert_ok!(negotiate_timemap(Some(&accept("application/link-format")))),
            TimemapVariant::LinkFormat
        );
        assert_eq!(
            assert_ok!(negotiate_timemap(Some(&accept("application/ld+json")))),
            TimemapVariant::JsonLd(JsonLdProfile::Expanded)
        );
    }
}
