//! I define `Accept-Post` and `Accept-Patch` typed headers.
//!

use headers::{Header, HeaderName};
use mime::Mime;

use crate::common::field::split_csv;

/// Constant for `accept-post` header-name.
pub static ACCEPT_POST: HeaderName = HeaderName::from_static("accept-post");

/// Constant for `accept-patch` header-name.
pub static ACCEPT_PATCH: HeaderName = HeaderName::from_static("accept-patch");

macro_rules! accept_method_header {
    ($(#[$outer:meta])* $name:ident, $header_name:ident) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            /// Acceptable media ranges.
            pub media_ranges: Vec<Mime>,
        }

        impl $name {
            /// Create a new header value from given media ranges.
            pub fn new(media_ranges: Vec<Mime>) -> Self {
                Self { media_ranges }
            }
        }

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
                Ok(Self {
                    media_ranges: values
                        .flat_map(split_csv)
                        .map(|v| v.parse().map_err(|_| headers::Error::invalid()))
                        .collect::<Result<_, _>>()?,
                })
            }

            fn encode<E: Extend<headers::HeaderValue>>(&self, values: &mut E) {
                let encoded = self
                    .media_ranges
                    .iter()
                    .map(|m| m.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                values.extend(std::iter::once(
                    encoded
                        .parse()
                        .expect("media range list is always a valid HeaderValue"),
                ));
            }
        }
    };
}

accept_method_header!(
    /// `Accept-Post` response header, defined by
    /// [ldp](https://www.w3.org/TR/ldp/#header-accept-post). Advertises
    /// media types acceptable on a POST to the target.
    AcceptPost,
    ACCEPT_POST
);

accept_method_header!(
    /// `Accept-Patch` response header, defined in
    /// [rfc5789](https://datatracker.ietf.org/doc/html/rfc5789#section-3.1).
    /// Advertises media types acceptable on a PATCH to the target.
    AcceptPatch,
    ACCEPT_PATCH
);

#[cfg(test)]
mod tests {
    use claims::assert_ok;
    use headers::HeaderValue;

    use super::*;

    #[test]
    fn media_range_list_round_trips() {
        let header_value =
            HeaderValue::from_static("text/turtle, application/ld+json, application/n-triples");
        let accept_post = assert_ok!(AcceptPost::decode(&mut std::iter::once(&header_value)));
        assert_eq!(accept_post.media_ranges.len(), 3);

        let mut header_values = Vec::new();
        accept_post.encode(&mut header_values);
        let re_parsed = assert_ok!(AcceptPost::decode(&mut header_values.iter()));
        assert_eq!(accept_post, re_parsed);
    }
}
