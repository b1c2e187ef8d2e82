//! I define the evaluator for http request preconditions, as per
//! [rfc7232](https://www.rfc-editor.org/rfc/rfc7232#section-6).
//!

use chrono::{DateTime, Utc};
use headers::HeaderMap;
use http::{Method, StatusCode};
use ldp_typed_headers::datetime::parse_imf_fixdate;

use crate::{error::LdpError, etag::EntityTag};

/// Resolved action after evaluation of preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedAction {
    /// Apply the request method.
    Proceed,

    /// Return a response with given status.
    Return(StatusCode),
}

/// One member of a match header: an entity tag or `*`.
enum TagMatcher {
    Any,
    Tag(EntityTag),
}

/// Evaluates the precondition header sequence against the selected
/// representation's validators. Weak comparison is used for both
/// match headers, as the repository only produces weak tags.
pub struct PreconditionEvaluator<'p> {
    /// Request method.
    pub method: &'p Method,

    /// Request headers.
    pub headers: &'p HeaderMap,

    /// Selected representation entity tag.
    pub etag: &'p EntityTag,

    /// Selected representation last modified instant.
    pub last_modified: DateTime<Utc>,
}

impl<'p> PreconditionEvaluator<'p> {
    /// Evaluate the precondition sequence: `If-Match`,
    /// `If-Unmodified-Since`, `If-None-Match`,
    /// `If-Modified-Since`. An unquoted tag in a match header is a
    /// protocol error.
    pub fn evaluate(&self) -> Result<ResolvedAction, LdpError> {
        if let Some(matchers) = self.matchers(http::header::IF_MATCH)? {
            if !self.any_matches(&matchers) {
                return Ok(ResolvedAction::Return(StatusCode::PRECONDITION_FAILED));
            }
        } else if let Some(instant) = self.date(http::header::IF_UNMODIFIED_SINCE) {
            if self.last_modified > instant {
                return Ok(ResolvedAction::Return(StatusCode::PRECONDITION_FAILED));
            }
        }

        if let Some(matchers) = self.matchers(http::header::IF_NONE_MATCH)? {
            if self.any_matches(&matchers) {
                return Ok(ResolvedAction::Return(self.read_fallback_status()));
            }
        } else if self.is_read() {
            if let Some(instant) = self.date(http::header::IF_MODIFIED_SINCE) {
                if self.last_modified <= instant {
                    return Ok(ResolvedAction::Return(StatusCode::NOT_MODIFIED));
                }
            }
        }

        Ok(ResolvedAction::Proceed)
    }

    /// Evaluate leniently: reads are optimistic about malformed
    /// conditionals and proceed instead of surfacing the error.
    pub fn evaluate_lenient(&self) -> ResolvedAction {
        self.evaluate().unwrap_or(ResolvedAction::Proceed)
    }

    fn is_read(&self) -> bool {
        [Method::GET, Method::HEAD].contains(self.method)
    }

    fn read_fallback_status(&self) -> StatusCode {
        if self.is_read() {
            StatusCode::NOT_MODIFIED
        } else {
            StatusCode::PRECONDITION_FAILED
        }
    }

    fn any_matches(&self, matchers: &[TagMatcher]) -> bool {
        matchers.iter().any(|m| match m {
            TagMatcher::Any => true,
            TagMatcher::Tag(tag) => tag.weak_eq(self.etag),
        })
    }

    /// Collect the tag matchers of given header, if present.
    fn matchers(&self, name: http::header::HeaderName) -> Result<Option<Vec<TagMatcher>>, LdpError> {
        let header_name = if name == http::header::IF_MATCH {
            "If-Match"
        } else {
            "If-None-Match"
        };

        let mut matchers = Vec::new();
        let mut present = false;
        for value in self.headers.get_all(&name) {
            present = true;
            let value_str = value
                .to_str()
                .map_err(|_| LdpError::MalformedHeader(header_name))?;
            for member in value_str.split(',').map(str::trim).filter(|m| !m.is_empty()) {
                if member == "*" {
                    matchers.push(TagMatcher::Any);
                } else {
                    let tag = EntityTag::parse(member)
                        .ok_or(LdpError::MalformedHeader(header_name))?;
                    matchers.push(TagMatcher::Tag(tag));
                }
            }
        }

        Ok(present.then_some(matchers))
    }

    /// Parse a date header. Invalid dates make the header
    /// inapplicable, as the rfc instructs.
    fn date(&self, name: http::header::HeaderName) -> Option<DateTime<Utc>> {
        self.headers
            .get(&name)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_imf_fixdate)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use claims::{assert_err, assert_ok_eq};
    use ldp_typed_headers::datetime::fmt_imf_fixdate;
    use rstest::rstest;

    use super::*;

    fn last_modified() -> DateTime<Utc> {
        Utc.timestamp_opt(1496277129, 0).unwrap()
    }

    fn evaluate(
        method: Method,
        header_pairs: &[(http::header::HeaderName, &str)],
    ) -> Result<ResolvedAction, LdpError> {
        let mut headers = HeaderMap::new();
        for (name, value) in header_pairs {
            headers.append(name, value.parse().unwrap());
        }
        PreconditionEvaluator {
            method: &method,
            headers: &headers,
            etag: &EntityTag::weak("abc123"),
            last_modified: last_modified(),
        }
        .evaluate()
    }

    #[test]
    fn no_conditionals_proceed() {
        assert_ok_eq!(evaluate(Method::GET, &[]), ResolvedAction::Proceed);
    }

    #[rstest]
    #[case::matching("W/\"abc123\"", ResolvedAction::Proceed)]
    #[case::wildcard("*", ResolvedAction::Proceed)]
    #[case::mismatching("W/\"other\"", ResolvedAction::Return(StatusCode::PRECONDITION_FAILED))]
    fn if_match_gates_writes(#[case] value: &str, #[case] expected: ResolvedAction) {
        assert_ok_eq!(
            evaluate(Method::PUT, &[(http::header::IF_MATCH, value)]),
            expected
        );
    }

    #[test]
    fn unquoted_if_match_is_a_protocol_error() {
        assert_err!(evaluate(Method::PUT, &[(http::header::IF_MATCH, "abc123")]));
    }

    #[rstest]
    #[case::get(Method::GET, ResolvedAction::Return(StatusCode::NOT_MODIFIED))]
    #[case::put(Method::PUT, ResolvedAction::Return(StatusCode::PRECONDITION_FAILED))]
    fn if_none_match_status_depends_on_method(
        #[case] method: Method,
        #[case] expected: ResolvedAction,
    ) {
        assert_ok_eq!(
            evaluate(method, &[(http::header::IF_NONE_MATCH, "W/\"abc123\"")]),
            expected
        );
    }

    #[test]
    fn if_modified_since_only_applies_to_reads() {
        let unchanged_since = fmt_imf_fixdate(last_modified());
        assert_ok_eq!(
            evaluate(
                Method::GET,
                &[(http::header::IF_MODIFIED_SINCE, unchanged_since.as_str())]
            ),
            ResolvedAction::Return(StatusCode::NOT_MODIFIED)
        );
        assert_ok_eq!(
            evaluate(
                Method::DELETE,
                &[(http::header::IF_MODIFIED_SINCE, unchanged_since.as_str())]
            ),
            ResolvedAction::Proceed
        );
    }

    #[test]
    fn if_unmodified_since_gates_writes() {
        let before = fmt_imf_fixdate(Utc.timestamp_opt(1496277000, 0).unwrap());
        assert_ok_eq!(
            evaluate(
                Method::PUT,
                &[(http::header::IF_UNMODIFIED_SINCE, before.as_str())]
            ),
            ResolvedAction::Return(StatusCode::PRECONDITION_FAILED)
        );
    }

    #[test]
    fn if_match_takes_precedence_over_if_unmodified_since() {
        let before = fmt_imf_fixdate(Utc.timestamp_opt(1496277000, 0).unwrap());
        assert_ok_eq!(
            evaluate(
                Method::PUT,
                &[
                    (http::header::IF_MATCH, "W/\"abc123\""),
                    (http::header::IF_UNMODIFIED_SINCE, before.as_str()),
                ]
            ),
            ResolvedAction::Proceed
        );
    }

    #[test]
    fn lenient_evaluation_swallows_malformed_conditionals() {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::IF_MATCH, "unquoted".parse().unwrap());
        let action = PreconditionEvaluator {
            method: &Method::GET,
            headers: &headers,
            etag: &EntityTag::weak("abc123"),
            last_modified: last_modified(),
        }
        .evaluate_lenient();
        assert_eq!(action, ResolvedAction::Proceed);
    }
}
