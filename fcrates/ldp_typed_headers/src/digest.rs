//! I define [`Digest`] and [`WantDigest`] typed headers, as per
//! [rfc3230](https://datatracker.ietf.org/doc/html/rfc3230).
//!

use std::{fmt::Display, str::FromStr};

use headers::{Header, HeaderName};
use tracing::error;

use crate::common::{field::split_csv, qvalue::QValue};

/// Constant for `digest` header-name.
pub static DIGEST: HeaderName = HeaderName::from_static("digest");

/// Constant for `want-digest` header-name.
pub static WANT_DIGEST: HeaderName = HeaderName::from_static("want-digest");

/// A digest algorithm token from the
/// [http digest algorithm registry](https://www.iana.org/assignments/http-dig-alg/http-dig-alg.xhtml).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// The `md5` algorithm.
    Md5,

    /// The `sha` (sha-1) algorithm.
    Sha,

    /// The `sha-256` algorithm.
    Sha256,
}

impl DigestAlgorithm {
    /// All known algorithms.
    pub const ALL: &'static [Self] = &[Self::Md5, Self::Sha, Self::Sha256];

    /// Registered token of the algorithm.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha => "sha",
            Self::Sha256 => "sha-256",
        }
    }

    /// Resolve an algorithm from its registered token,
    /// case-insensitively.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|algo| algo.token().eq_ignore_ascii_case(token))
            .copied()
    }
}

impl Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// `Digest` header carrying a single instance digest.
///
/// ```txt
///    Digest = "Digest" ":" #(instance-digest)
///    instance-digest = digest-algorithm "=" <encoded digest output>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// The digest algorithm.
    pub algorithm: DigestAlgorithm,

    /// The encoded digest output.
    pub value: String,
}

impl Digest {
    /// Create a new digest value.
    pub fn new(algorithm: DigestAlgorithm, value: impl Into<String>) -> Self {
        Self {
            algorithm,
            value: value.into(),
        }
    }
}

impl Header for Digest {
    #[inline]
    fn name() -> &'static HeaderName {
        &DIGEST
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        Self: Sized,
        I: Iterator<Item = &'i headers::HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        let value_str = value.to_str().map_err(|_| headers::Error::invalid())?;

        // The encoded output may itself contain `=` padding, so
        // split on the first separator only.
        let (algo_str, digest_str) = value_str
            .trim()
            .split_once('=')
            .ok_or_else(headers::Error::invalid)?;

        let algorithm = DigestAlgorithm::from_token(algo_str.trim()).ok_or_else(|| {
            error!("Unsupported digest algorithm: {}", algo_str);
            headers::Error::invalid()
        })?;

        if digest_str.is_empty() {
            return Err(headers::Error::invalid());
        }

        Ok(Self {
            algorithm,
            value: digest_str.to_owned(),
        })
    }

    fn encode<E: Extend<headers::HeaderValue>>(&self, values: &mut E) {
        values.extend(std::iter::once(
            format!("{}={}", self.algorithm.token(), self.value)
                .parse()
                .expect("digest value is always a valid HeaderValue"),
        ));
    }
}

/// One item of a `Want-Digest` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WantDigestItem {
    /// The requested algorithm token, lowercased. May be a token
    /// this implementation does not know.
    pub algorithm: String,

    /// The quality weight.
    pub q: QValue,
}

/// `Want-Digest` header, indicating the sender's wish for a
/// `Digest` on the response.
///
/// ```txt
///    Want-Digest = "Want-Digest" ":" #(digest-algorithm [ ";" "q" "=" qvalue])
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WantDigest {
    /// The requested items, in declared order.
    pub items: Vec<WantDigestItem>,
}

impl Header for WantDigest {
    #[inline]
    fn name() -> &'static HeaderName {
        &WANT_DIGEST
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        Self: Sized,
        I: Iterator<Item = &'i headers::HeaderValue>,
    {
        let mut items = Vec::new();

        for item_str in values.flat_map(split_csv) {
            let (algo_str, q) = match item_str.split_once(';') {
                Some((algo_str, q_str)) => {
                    let q_str = q_str.trim();
                    let qvalue_str = q_str
                        .strip_prefix("q=")
                        .or_else(|| q_str.strip_prefix("Q="))
                        .ok_or_else(headers::Error::invalid)?;
                    (
                        algo_str.trim(),
                        qvalue_str
                            .parse()
                            .map_err(|_| headers::Error::invalid())?,
                    )
                }
                None => (item_str, QValue::one()),
            };

            if algo_str.is_empty() {
                return Err(headers::Error::invalid());
            }

            items.push(WantDigestItem {
                algorithm: algo_str.to_ascii_lowercase(),
                q,
            });
        }

        if items.is_empty() {
            return Err(headers::Error::invalid());
        }

        Ok(Self { items })
    }

    fn encode<E: Extend<headers::HeaderValue>>(&self, values: &mut E) {
        let encoded = self
            .items
            .iter()
            .map(|item| {
                if item.q == QValue::one() {
                    item.algorithm.clone()
                } else {
                    format!("{};q={}", item.algorithm, item.q)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        values.extend(std::iter::once(
            encoded
                .parse()
                .expect("want-digest value is always a valid HeaderValue"),
        ));
    }
}

impl WantDigest {
    /// Pick the highest weighted algorithm among the supported
    /// ones. The first listed wins on equal weights; zero weighted
    /// items are never picked.
    pub fn preferred(&self, supported: &[DigestAlgorithm]) -> Option<DigestAlgorithm> {
        let mut best: Option<(DigestAlgorithm, QValue)> = None;
        for item in &self.items {
            if item.q.is_zero() {
                continue;
            }
            if let Some(algo) = DigestAlgorithm::from_token(&item.algorithm) {
                if supported.contains(&algo) && best.map(|(_, q)| item.q > q).unwrap_or(true) {
                    best = Some((algo, item.q));
                }
            }
        }
        best.map(|(algo, _)| algo)
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_err, assert_none, assert_ok, assert_some_eq};
    use headers::HeaderValue;
    use rstest::rstest;

    use super::*;

    fn decode_digest(value_str: &str) -> Result<Digest, headers::Error> {
        let header_value = assert_ok!(HeaderValue::from_str(value_str));
        Digest::decode(&mut std::iter::once(&header_value))
    }

    fn decode_want_digest(value_str: &str) -> Result<WantDigest, headers::Error> {
        let header_value = assert_ok!(HeaderValue::from_str(value_str));
        WantDigest::decode(&mut std::iter::once(&header_value))
    }

    #[rstest]
    #[case::unsupported_algo("crc32c=AAAAAA==")]
    #[case::no_value("md5=")]
    #[case::no_separator("md5")]
    fn invalid_digest_will_be_rejected(#[case] value_str: &str) {
        assert_err!(decode_digest(value_str));
    }

    #[rstest]
    #[case("md5=HUXZLQLMuI/KZ5KDcJPcOA==", DigestAlgorithm::Md5, "HUXZLQLMuI/KZ5KDcJPcOA==")]
    #[case("SHA-256=X48E9qOokqqrvdts8nOJRJN3OWDUoyWxBf7kbu9DBPE=", DigestAlgorithm::Sha256, "X48E9qOokqqrvdts8nOJRJN3OWDUoyWxBf7kbu9DBPE=")]
    fn valid_digest_will_be_decoded(
        #[case] value_str: &str,
        #[case] expected_algorithm: DigestAlgorithm,
        #[case] expected_value: &str,
    ) {
        let digest = assert_ok!(decode_digest(value_str));
        assert_eq!(digest.algorithm, expected_algorithm);
        assert_eq!(digest.value, expected_value);
    }

    #[test]
    fn want_digest_preference_honours_weights() {
        let want_digest = assert_ok!(decode_want_digest("md5;q=0.3, sha-256;q=0.9, sha;q=0.5"));
        assert_some_eq!(
            want_digest.preferred(DigestAlgorithm::ALL),
            DigestAlgorithm::Sha256
        );
    }

    #[test]
    fn want_digest_skips_unsupported_algorithms() {
        let want_digest = assert_ok!(decode_want_digest("crc32c, md5;q=0.1"));
        assert_some_eq!(
            want_digest.preferred(DigestAlgorithm::ALL),
            DigestAlgorithm::Md5
        );
        assert_none!(want_digest.preferred(&[]));
    }

    #[test]
    fn want_digest_first_listed_wins_on_tie() {
        let want_digest = assert_ok!(decode_want_digest("sha, md5"));
        assert_some_eq!(
            want_digest.preferred(DigestAlgorithm::ALL),
            DigestAlgorithm::Sha
        );
    }

    #[test]
    fn digest_round_trip_preserves_value() {
        let digest = Digest::new(DigestAlgorithm::Sha, "qvTGHdzF6KLavt4PO0gs2a6pQ00=");
        let mut header_values = Vec::new();
        digest.encode(&mut header_values);
        let re_parsed = assert_ok!(Digest::decode(&mut header_values.iter()));
        assert_eq!(digest, re_parsed);
    }
}
