//! I define a [`Range`] typed header restricted to a single
//! closed byte range.
//!

use headers::Header;
use tracing::error;

/// `Range` header, defined in
/// [rfc9110](https://www.rfc-editor.org/rfc/rfc9110.html#name-range),
/// restricted to a single `bytes=<first>-<last>` range with
/// `0 <= first <= last`. Suffix ranges, open ranges and multi
/// range sets fail decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    /// First byte position, inclusive.
    pub first: u64,

    /// Last byte position, inclusive.
    pub last: u64,
}

impl Range {
    /// Try to create a new range with given bounds.
    pub fn try_new(first: u64, last: u64) -> Option<Self> {
        (first <= last).then_some(Self { first, last })
    }

    /// Count of bytes the range spans.
    #[inline]
    pub fn len(&self) -> u64 {
        self.last - self.first + 1
    }

    /// A closed range is never empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Header for Range {
    fn name() -> &'static headers::HeaderName {
        &http::header::RANGE
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        Self: Sized,
        I: Iterator<Item = &'i headers::HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        let value_str = value.to_str().map_err(|_| headers::Error::invalid())?;

        let range_set = value_str
            .trim()
            .strip_prefix("bytes=")
            .ok_or_else(|| {
                error!("Only the bytes range unit is supported.");
                headers::Error::invalid()
            })?
            .trim();

        if range_set.contains(',') {
            error!("Multi range sets are not supported.");
            return Err(headers::Error::invalid());
        }

        let (first_str, last_str) = range_set.split_once('-').ok_or_else(headers::Error::invalid)?;
        if first_str.is_empty() || last_str.is_empty() {
            error!("Open and suffix ranges are not supported.");
            return Err(headers::Error::invalid());
        }

        let first: u64 = first_str.parse().map_err(|_| headers::Error::invalid())?;
        let last: u64 = last_str.parse().map_err(|_| headers::Error::invalid())?;

        Self::try_new(first, last).ok_or_else(headers::Error::invalid)
    }

    fn encode<E: Extend<headers::HeaderValue>>(&self, values: &mut E) {
        values.extend(std::iter::once(
            format!("bytes={}-{}", self.first, self.last)
                .parse()
                .expect("range value is always a valid HeaderValue"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_err, assert_ok};
    use headers::HeaderValue;
    use rstest::rstest;

    use super::*;

    fn decode(value_str: &str) -> Result<Range, headers::Error> {
        let header_value = assert_ok!(HeaderValue::from_str(value_str));
        Range::decode(&mut std::iter::once(&header_value))
    }

    #[rstest]
    #[case::suffix("bytes=-5")]
    #[case::open("bytes=2-")]
    #[case::multi("bytes=0-1,3-4")]
    #[case::inverted("bytes=6-2")]
    #[case::other_unit("items=0-4")]
    #[case::garbage("bytes=a-b")]
    fn invalid_ranges_will_be_rejected(#[case] value_str: &str) {
        assert_err!(decode(value_str));
    }

    #[rstest]
    #[case("bytes=2-6", 2, 6, 5)]
    #[case("bytes=0-0", 0, 0, 1)]
    fn valid_ranges_will_be_decoded(
        #[case] value_str: &str,
        #[case] expected_first: u64,
        #[case] expected_last: u64,
        #[case] expected_len: u64,
    ) {
        let range = assert_ok!(decode(value_str));
        assert_eq!(range.first, expected_first);
        assert_eq!(range.last, expected_last);
        assert_eq!(range.len(), expected_len);
    }

    #[test]
    fn round_trip_preserves_value() {
        let range = Range { first: 10, last: 42 };
        let mut header_values = Vec::new();
        range.encode(&mut header_values);
        let re_parsed = assert_ok!(Range::decode(&mut header_values.iter()));
        assert_eq!(range, re_parsed);
    }
}
