//! I define [`AcceptDatetime`] and [`MementoDatetime`] typed
//! headers, as per [rfc7089](https://datatracker.ietf.org/doc/html/rfc7089).
//!

use chrono::{DateTime, NaiveDateTime, Utc};
use headers::{Header, HeaderName};
use tracing::error;

/// Constant for `accept-datetime` header-name.
pub static ACCEPT_DATETIME: HeaderName = HeaderName::from_static("accept-datetime");

/// Constant for `memento-datetime` header-name.
pub static MEMENTO_DATETIME: HeaderName = HeaderName::from_static("memento-datetime");

/// The IMF-fixdate format of rfc1123, the only form valid on the
/// Memento headers.
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Parse an rfc1123 `IMF-fixdate` instant.
pub fn parse_imf_fixdate(value_str: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value_str.trim(), IMF_FIXDATE)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format an instant as an rfc1123 `IMF-fixdate`.
pub fn fmt_imf_fixdate(instant: DateTime<Utc>) -> String {
    instant.format(IMF_FIXDATE).to_string()
}

macro_rules! datetime_header {
    ($(#[$outer:meta])* $name:ident, $header_name:ident) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub DateTime<Utc>);

        impl Header for $name {
            #[inline]
            fn name() -> &'static HeaderName {
                &$header_name
            }

            fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
            where
                Self: Sized,
                I: Iterator<Item = &'i headers::HeaderValue>,
            {
                let value = values.next().ok_or_else(headers::Error::invalid)?;
                let value_str = value.to_str().map_err(|_| headers::Error::invalid())?;
                parse_imf_fixdate(value_str).map(Self).ok_or_else(|| {
                    error!("Invalid rfc1123 datetime: {}", value_str);
                    headers::Error::invalid()
                })
            }

            fn encode<E: Extend<headers::HeaderValue>>(&self, values: &mut E) {
                values.extend(std::iter::once(
                    fmt_imf_fixdate(self.0)
                        .parse()
                        .expect("imf-fixdate is always a valid HeaderValue"),
                ));
            }
        }
    };
}

datetime_header!(
    /// `Accept-Datetime` request header, carrying the instant the
    /// client wants a memento for.
    AcceptDatetime,
    ACCEPT_DATETIME
);

datetime_header!(
    /// `Memento-Datetime` response header, carrying the instant a
    /// memento captures.
    MementoDatetime,
    MEMENTO_DATETIME
);

#[cfg(test)]
mod tests {
    use claims::{assert_none, assert_ok, assert_some};
    use headers::HeaderValue;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Thu, 01 Jun 2017 00:32:09 GMT")]
    #[case("Wed, 31 May 2017 20:32:09 GMT")]
    fn valid_imf_fixdate_round_trips(#[case] value_str: &str) {
        let instant = assert_some!(parse_imf_fixdate(value_str));
        assert_eq!(fmt_imf_fixdate(instant), value_str);
    }

    #[rstest]
    #[case::iso("2017-06-01T00:32:09Z")]
    #[case::no_zone("Thu, 01 Jun 2017 00:32:09")]
    #[case::garbage("tomorrow")]
    fn invalid_datetime_will_be_rejected(#[case] value_str: &str) {
        assert_none!(parse_imf_fixdate(value_str));
    }

    #[test]
    fn accept_datetime_decodes() {
        let header_value = HeaderValue::from_static("Thu, 01 Jun 2017 00:32:09 GMT");
        let accept_datetime = assert_ok!(AcceptDatetime::decode(&mut std::iter::once(
            &header_value
        )));
        assert_eq!(accept_datetime.0.timestamp(), 1496277129);
    }
}
