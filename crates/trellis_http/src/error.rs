//! I define the error type of the protocol core and its mapping
//! to http problem responses.
//!

use http::{Response, StatusCode};
use http_api_problem::HttpApiProblem;
use ldp_typed_headers::link::LinkValue;
use tracing::error;
use trellis_api::service::{ServiceError, Violation};
use trellis_vocab::ns;

use crate::body::{self, Body};

/// Error of processing a repository request. Every variant maps to
/// one terminal http status.
#[derive(Debug, thiserror::Error)]
pub enum LdpError {
    /// A reserved request header failed to parse.
    #[error("Malformed {0} header.")]
    MalformedHeader(&'static str),

    /// The request shape is invalid.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request body media type is not supported for the
    /// method.
    #[error("Unsupported media type.")]
    UnsupportedMediaType,

    /// No acceptable representation variant exists.
    #[error("No acceptable variant.")]
    NotAcceptable,

    /// No resource exists at the target.
    #[error("Resource not found.")]
    NotFound,

    /// The target resource has been deleted.
    #[error("Resource has been deleted.")]
    Gone,

    /// The method is not allowed for the target state.
    #[error("Method not allowed.")]
    MethodNotAllowed,

    /// A request precondition failed.
    #[error("Precondition failed.")]
    PreconditionFailed,

    /// The request conflicts with the target state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The mutation violates a server constraint.
    #[error("Constraint violation: {}", .0.constraint)]
    ConstraintViolation(Violation),

    /// A collaborator failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl LdpError {
    /// The http status of this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedHeader(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Gone => StatusCode::GONE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::Conflict(_) | Self::ConstraintViolation(_) => StatusCode::CONFLICT,
            Self::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Iri of the violated constraint, if this error carries one.
    pub fn constrained_by(&self) -> Option<&str> {
        match self {
            Self::ConstraintViolation(violation) => Some(&violation.constraint),
            _ => None,
        }
    }

    /// Render the error as a problem response.
    pub fn to_response(&self) -> Response<Body> {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Internal error on request processing. Error:\n {}", self);
        }

        let mut problem = HttpApiProblem::with_title(status);
        problem.detail = Some(self.to_string());

        let mut builder = Response::builder().status(status).header(
            http::header::CONTENT_TYPE,
            "application/problem+json",
        );

        if let Some(constraint) = self.constrained_by() {
            let link = LinkValue::try_new_basic(constraint, ns::ldp::constrainedBy.to_string())
                .expect("Must be a valid link value.");
            builder = builder.header(http::header::LINK, link.to_string());
        }

        builder
            .body(body::full(
                problem.json_bytes(),
            ))
            .expect("Must be a well formed response.")
    }
}

#[cfg(test)]
mod tests {
    use claims::assert_some_eq;
    use trellis_vocab::trellis;

    use super::*;

    #[test]
    fn constraint_violations_carry_the_violation_link() {
        let err = LdpError::ConstraintViolation(Violation {
            constraint: trellis::InvalidRange.to_owned(),
            triples: vec![],
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let response = err.to_response();
        let link_value = response
            .headers()
            .get(http::header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        assert_some_eq!(
            link_value,
            format!(
                "<{}>; rel=\"http://www.w3.org/ns/ldp#constrainedBy\"",
                trellis::InvalidRange
            )
        );
    }

    #[test]
    fn statuses_match_error_kinds() {
        assert_eq!(LdpError::MalformedHeader("Range").status(), StatusCode::BAD_REQUEST);
        assert_eq!(LdpError::NotAcceptable.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(
            LdpError::Service(ServiceError::new("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
