//! I define [`LdpRequest`], the parsed repository request every
//! handler consumes.
//!

use std::borrow::Cow;

use chrono::{DateTime, TimeZone, Utc};
use headers::{HeaderMap, HeaderMapExt};
use http::Method;
use ldp_typed_headers::{
    accept::Accept,
    datetime::AcceptDatetime,
    digest::{Digest, WantDigest},
    link::Link,
    prefer::Prefer,
    range::Range,
    slug::Slug,
};
use mime::Mime;
use percent_encoding::percent_decode_str;
use trellis_api::{
    identifier::TrellisIdentifier,
    model::Session,
    service::ByteStream,
};

use crate::error::LdpError;

/// The reserved `?ext` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ext {
    /// No extension surface.
    #[default]
    None,

    /// The access control surface.
    Acl,

    /// The memento time map surface.
    Timemap,

    /// The multipart upload surface.
    Upload,
}

/// A linked data fragments triple pattern, from the reserved
/// `subject`, `predicate` and `object` query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriplePattern {
    /// The subject iri to match, if constrained.
    pub subject: Option<String>,

    /// The predicate iri to match, if constrained.
    pub predicate: Option<String>,

    /// The object iri or lexical value to match, if constrained.
    pub object: Option<String>,
}

impl TriplePattern {
    /// If any component is constrained.
    pub fn is_constrained(&self) -> bool {
        self.subject.is_some() || self.predicate.is_some() || self.object.is_some()
    }
}

/// A parsed repository request, the input to every handler.
pub struct LdpRequest {
    /// The request method.
    pub method: Method,

    /// Identifier of the target resource.
    pub identifier: TrellisIdentifier,

    /// The `?ext` surface.
    pub ext: Ext,

    /// The `?version` instant, from epoch milliseconds.
    pub version: Option<DateTime<Utc>>,

    /// The linked data fragments pattern.
    pub pattern: TriplePattern,

    /// The request headers.
    pub headers: HeaderMap,

    /// The agent session.
    pub session: Session,

    /// The raw body stream, for methods that carry one.
    pub body: Option<ByteStream>,
}

impl LdpRequest {
    /// Create a request over given target, parsing the reserved
    /// query parameters.
    pub fn new(
        method: Method,
        identifier: TrellisIdentifier,
        query: &str,
        headers: HeaderMap,
        session: Session,
        body: Option<ByteStream>,
    ) -> Result<Self, LdpError> {
        let mut ext = Ext::None;
        let mut version = None;
        let mut pattern = TriplePattern::default();

        for (name, value) in parse_query(query) {
            match name.as_ref() {
                "ext" => {
                    ext = match value.as_ref() {
                        "acl" => Ext::Acl,
                        "timemap" => Ext::Timemap,
                        "upload" => Ext::Upload,
                        // Unknown surfaces are ignored.
                        _ => ext,
                    }
                }
                "version" => {
                    let millis: i64 = value
                        .parse()
                        .map_err(|_| LdpError::BadRequest("invalid version instant".into()))?;
                    version = Some(
                        Utc.timestamp_millis_opt(millis)
                            .single()
                            .ok_or_else(|| LdpError::BadRequest("invalid version instant".into()))?,
                    );
                }
                "subject" if !value.is_empty() => pattern.subject = Some(value.into_owned()),
                "predicate" if !value.is_empty() => pattern.predicate = Some(value.into_owned()),
                "object" if !value.is_empty() => pattern.object = Some(value.into_owned()),
                _ => {}
            }
        }

        Ok(Self {
            method,
            identifier,
            ext,
            version,
            pattern,
            headers,
            session,
            body,
        })
    }

    /// Take the body stream out of the request.
    pub fn take_body(&mut self) -> Result<ByteStream, LdpError> {
        self.body
            .take()
            .ok_or_else(|| LdpError::BadRequest("missing request body".into()))
    }

    /// Decode a typed header, distinguishing absent from
    /// malformed.
    fn typed<H: headers::Header>(&self, name: &'static str) -> Result<Option<H>, LdpError> {
        self.headers
            .typed_try_get::<H>()
            .map_err(|_| LdpError::MalformedHeader(name))
    }

    /// The `Accept` header.
    pub fn accept(&self) -> Result<Option<Accept>, LdpError> {
        self.typed("Accept")
    }

    /// The `Prefer` header.
    pub fn prefer(&self) -> Result<Option<Prefer>, LdpError> {
        self.typed("Prefer")
    }

    /// The `Range` header.
    pub fn range(&self) -> Result<Option<Range>, LdpError> {
        self.typed("Range")
    }

    /// The `Digest` header.
    pub fn digest(&self) -> Result<Option<Digest>, LdpError> {
        self.typed("Digest")
    }

    /// The `Want-Digest` header.
    pub fn want_digest(&self) -> Result<Option<WantDigest>, LdpError> {
        self.typed("Want-Digest")
    }

    /// The `Accept-Datetime` header.
    pub fn accept_datetime(&self) -> Result<Option<AcceptDatetime>, LdpError> {
        self.typed("Accept-Datetime")
    }

    /// The `Link` header.
    pub fn link(&self) -> Result<Option<Link>, LdpError> {
        self.typed("Link")
    }

    /// The `Slug` header.
    pub fn slug(&self) -> Result<Option<Slug>, LdpError> {
        self.typed("Slug")
    }

    /// The body `Content-Type`, if declared.
    pub fn content_type(&self) -> Option<Mime> {
        self.headers
            .typed_get::<headers::ContentType>()
            .map(Mime::from)
    }
}

/// Split a raw query string into percent decoded pairs.
fn parse_query(query: &str) -> impl Iterator<Item = (Cow<'_, str>, Cow<'_, str>)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(name), decode_component(value))
        })
}

fn decode_component(raw: &str) -> Cow<'_, str> {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(raw),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use claims::{assert_err, assert_ok};

    use super::*;

    fn request(query: &str) -> Result<LdpRequest, LdpError> {
        LdpRequest::new(
            Method::GET,
            TrellisIdentifier::new("repo1", "resource"),
            query,
            HeaderMap::new(),
            Session::anonymous(Utc::now()),
            None,
        )
    }

    #[test]
    fn reserved_query_params_are_parsed() {
        let req = assert_ok!(request("ext=timemap"));
        assert_eq!(req.ext, Ext::Timemap);

        let req = assert_ok!(request("version=1496262729000"));
        assert_eq!(
            req.version,
            Some(Utc.timestamp_millis_opt(1496262729000).single().unwrap())
        );

        let req = assert_ok!(request(
            "subject=http%3A%2F%2Fexample.org%2Fs&object=A%20title"
        ));
        assert_eq!(req.pattern.subject.as_deref(), Some("http://example.org/s"));
        assert_eq!(req.pattern.object.as_deref(), Some("A title"));
        assert!(req.pattern.is_constrained());
    }

    #[test]
    fn unknown_ext_is_ignored() {
        let req = assert_ok!(request("ext=foo"));
        assert_eq!(req.ext, Ext::None);
    }

    #[test]
    fn invalid_version_is_rejected() {
        assert_err!(request("version=yesterday"));
    }

    #[test]
    fn malformed_reserved_headers_are_reported() {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::RANGE, "bytes=9-2".parse().unwrap());
        let req = LdpRequest::new(
            Method::GET,
            TrellisIdentifier::new("repo1", "resource"),
            "",
            headers,
            Session::anonymous(Utc::now()),
            None,
        )
        .unwrap();

        assert!(matches!(
            req.range(),
            Err(LdpError::MalformedHeader("Range"))
        ));
    }
}
