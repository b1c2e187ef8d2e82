//! I define [`Accept`] typed header and related structs.
//!

use std::str::FromStr;

use headers::Header;
use mime::Mime;
use tracing::error;

use crate::common::{
    field::{split_csv, split_semis},
    qvalue::QValue,
};

/// `Accept` header, defined in
/// [RFC9110](https://www.rfc-editor.org/rfc/rfc9110.html#name-accept).
///
/// The "Accept" header field can be used by user agents to specify
/// response media types that are acceptable.
///
/// ```txt
///   Accept = #( media-range [ weight ] )
///
///   media-range    = ( "*/*"
///                    / ( type "/" "*" )
///                    / ( type "/" subtype )
///                    ) parameters
/// ```
#[derive(Clone, Debug, Default)]
pub struct Accept {
    /// List of accept-values.
    pub values: Vec<AcceptValue>,
}

impl Header for Accept {
    fn name() -> &'static headers::HeaderName {
        &http::header::ACCEPT
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        Self: Sized,
        I: Iterator<Item = &'i headers::HeaderValue>,
    {
        Ok(Self {
            values: values
                .flat_map(split_csv)
                .map(AcceptValue::from_str)
                .collect::<Result<_, _>>()
                .map_err(|e| {
                    error!("Error in parsing Accept header. Error:\n {}", e);
                    headers::Error::invalid()
                })?,
        })
    }

    fn encode<E: Extend<headers::HeaderValue>>(&self, values: &mut E) {
        values.extend(self.values.iter().map(|v| {
            v.str_encode()
                .parse()
                .expect("accept value is always a valid HeaderValue")
        }));
    }
}

impl Accept {
    /// Get accept values sorted from highest precedence to lowest,
    /// preserving declared order among equals.
    pub fn sorted_values(&self) -> Vec<&AcceptValue> {
        let mut sorted: Vec<_> = self.values.iter().collect();
        // Stable sort, in descending order of precedence.
        sorted.sort_by(|v1, v2| v2.precedence().cmp(&v1.precedence()));
        sorted
    }
}

/// A single accept-value, a media range with an optional weight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptValue {
    /// The media range, with any media type parameters.
    pub media_range: Mime,

    /// The quality weight.
    pub q: QValue,
}

/// Error of an invalid encoded accept-value.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum InvalidEncodedAcceptValue {
    /// Invalid media range.
    #[error("Given accept-value has an invalid media range.")]
    InvalidMediaRange,

    /// Invalid quality weight.
    #[error("Given accept-value has an invalid weight param.")]
    InvalidWeight,
}

impl FromStr for AcceptValue {
    type Err = InvalidEncodedAcceptValue;

    fn from_str(value_str: &str) -> Result<Self, Self::Err> {
        let mut range_str = String::new();
        let mut q = QValue::one();

        // Weight terminates media type params. Accept-ext params
        // after it are ignored.
        let mut seen_weight = false;
        for part in split_semis(value_str) {
            if seen_weight {
                continue;
            }
            if let Some(qvalue_str) = part
                .strip_prefix("q=")
                .or_else(|| part.strip_prefix("Q="))
            {
                q = qvalue_str
                    .parse()
                    .map_err(|_| InvalidEncodedAcceptValue::InvalidWeight)?;
                seen_weight = true;
            } else {
                if !range_str.is_empty() {
                    range_str.push(';');
                }
                range_str.push_str(part);
            }
        }

        let media_range = Mime::from_str(&range_str)
            .map_err(|_| InvalidEncodedAcceptValue::InvalidMediaRange)?;

        Ok(Self { media_range, q })
    }
}

impl AcceptValue {
    /// Precedence of this accept-value, ordered by weight, then
    /// media range specificity, then parameter count.
    pub fn precedence(&self) -> (QValue, u8, usize) {
        let specificity = if self.media_range.type_() == mime::STAR {
            0
        } else if self.media_range.subtype() == mime::STAR {
            1
        } else {
            2
        };
        (self.q, specificity, self.media_range.params().count())
    }

    /// Check if given concrete media type falls in this value's
    /// media range. Media type parameters of the range (other than
    /// weight) must be matched literally.
    pub fn matches(&self, media_type: &Mime) -> bool {
        let range = &self.media_range;

        if range.type_() != mime::STAR && range.type_() != media_type.type_() {
            return false;
        }
        if range.type_() != mime::STAR
            && range.subtype() != mime::STAR
            && range.subtype() != media_type.subtype()
        {
            return false;
        }

        range
            .params()
            .all(|(name, value)| media_type.get_param(name) == Some(value))
    }

    /// Check if given concrete media type falls in this value's
    /// media range, ignoring parameters on both sides.
    pub fn matches_essence(&self, media_type: &Mime) -> bool {
        let range = &self.media_range;

        (range.type_() == mime::STAR || range.type_() == media_type.type_())
            && (range.type_() == mime::STAR
                || range.subtype() == mime::STAR
                || (range.subtype() == media_type.subtype()
                    && range.suffix() == media_type.suffix()))
    }

    /// Get encoded string representation.
    pub fn str_encode(&self) -> String {
        if self.q == QValue::one() {
            self.media_range.to_string()
        } else {
            format!("{}; q={}", self.media_range, self.q)
        }
    }
}

#[cfg(test)]
mod tests_decode {
    use claims::assert_ok;
    use headers::HeaderValue;
    use rstest::rstest;

    use super::*;

    fn decode(header_value_strs: &[&str]) -> Accept {
        let header_values: Vec<HeaderValue> = header_value_strs
            .iter()
            .map(|v| assert_ok!(v.parse::<HeaderValue>(), "Invalid header value"))
            .collect();
        assert_ok!(
            Accept::decode(&mut header_values.iter()),
            "Invalid Accept header value"
        )
    }

    #[rstest]
    #[case(
        &["audio/*; q=0.2", "audio/basic"],
        &["audio/basic", "audio/*"]
    )]
    #[case(
        &["text/*", "text/plain", "text/plain;format=flowed", "*/*"],
        &["text/plain;format=flowed", "text/plain", "text/*", "*/*"]
    )]
    #[case(
        &["text/turtle;q=0.3, application/ld+json;q=0.7", "*/*;q=0.5"],
        &["application/ld+json", "*/*", "text/turtle"]
    )]
    fn values_will_be_sorted_by_precedence(
        #[case] header_value_strs: &[&str],
        #[case] expected_range_order: &[&str],
    ) {
        let accept = decode(header_value_strs);
        let sorted = accept.sorted_values();
        assert_eq!(sorted.len(), expected_range_order.len());
        for (value, expected) in sorted.iter().zip(expected_range_order) {
            assert_eq!(&value.media_range.to_string(), expected);
        }
    }

    #[rstest]
    #[case("*/*", "text/turtle", true)]
    #[case("text/*", "text/turtle", true)]
    #[case("text/*", "application/ld+json", false)]
    #[case("application/ld+json", "application/ld+json", true)]
    #[case(
        "application/ld+json;profile=\"http://www.w3.org/ns/json-ld#compacted\"",
        "application/ld+json",
        false
    )]
    fn media_range_match_honours_wildcards_and_params(
        #[case] range_str: &str,
        #[case] media_type_str: &str,
        #[case] expected: bool,
    ) {
        let value = assert_ok!(AcceptValue::from_str(range_str));
        let media_type = assert_ok!(media_type_str.parse::<Mime>());
        assert_eq!(value.matches(&media_type), expected);
    }

    #[test]
    fn weight_terminates_media_range_params() {
        let value = assert_ok!(AcceptValue::from_str("text/html;level=1;q=0.4;ext=x"));
        assert_eq!(value.q, assert_ok!("0.4".parse()));
        assert_eq!(value.media_range.get_param("level").map(|v| v.as_str()), Some("1"));
        assert_eq!(value.media_range.get_param("ext"), None);
    }

    #[test]
    fn round_trip_preserves_value() {
        let value = assert_ok!(AcceptValue::from_str("text/html; q=0.7"));
        let re_parsed = assert_ok!(AcceptValue::from_str(&value.str_encode()));
        assert_eq!(value, re_parsed);
    }
}
