//! I define the [`Slug`] typed header, as per
//! [rfc5023](https://datatracker.ietf.org/doc/html/rfc5023#section-9.7).
//!

use headers::{Header, HeaderName};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::error;

/// Constant for `slug` header-name.
pub static SLUG: HeaderName = HeaderName::from_static("slug");

/// Characters escaped when encoding a slug back into a header
/// value.
const SLUG_ESCAPES: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'%').add(b'<').add(b'>');

/// `Slug` request header, a client hint for the last path segment
/// of a resource to be created. The decoded text must be a single
/// path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    /// Try to create a new slug from decoded text. Fails if the
    /// text is empty or spans path segments.
    pub fn try_new(text: impl Into<String>) -> Option<Self> {
        let text: String = text.into();
        if text.is_empty() || text.contains('/') {
            return None;
        }
        Some(Self(text))
    }

    /// The decoded slug text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Header for Slug {
    #[inline]
    fn name() -> &'static HeaderName {
        &SLUG
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        Self: Sized,
        I: Iterator<Item = &'i headers::HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        let value_str = value.to_str().map_err(|_| headers::Error::invalid())?;

        let decoded = percent_decode_str(value_str.trim())
            .decode_utf8()
            .map_err(|_| headers::Error::invalid())?;

        Self::try_new(decoded.into_owned()).ok_or_else(|| {
            error!("Slug text must be a non empty single path segment.");
            headers::Error::invalid()
        })
    }

    fn encode<E: Extend<headers::HeaderValue>>(&self, values: &mut E) {
        values.extend(std::iter::once(
            utf8_percent_encode(&self.0, SLUG_ESCAPES)
                .to_string()
                .parse()
                .expect("encoded slug is always a valid HeaderValue"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_err, assert_ok};
    use headers::HeaderValue;
    use rstest::rstest;

    use super::*;

    fn decode(value_str: &str) -> Result<Slug, headers::Error> {
        let header_value = assert_ok!(HeaderValue::from_str(value_str));
        Slug::decode(&mut std::iter::once(&header_value))
    }

    #[rstest]
    #[case::multi_segment("a/b")]
    #[case::encoded_slash("a%2Fb")]
    #[case::empty("")]
    fn invalid_slugs_will_be_rejected(#[case] value_str: &str) {
        assert_err!(decode(value_str));
    }

    #[rstest]
    #[case("child", "child")]
    #[case("some%20name", "some name")]
    fn valid_slugs_will_be_decoded(#[case] value_str: &str, #[case] expected_text: &str) {
        let slug = assert_ok!(decode(value_str));
        assert_eq!(slug.as_str(), expected_text);
    }

    #[test]
    fn round_trip_preserves_value() {
        let slug = assert_ok!(decode("some%20name"));
        let mut header_values = Vec::new();
        slug.encode(&mut header_values);
        let re_parsed = assert_ok!(Slug::decode(&mut header_values.iter()));
        assert_eq!(slug, re_parsed);
    }
}
