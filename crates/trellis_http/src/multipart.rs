//! I define the controller for the multipart upload lifecycle,
//! active only when the binary store advertises support: initiate
//! on a resource's `?ext=upload` surface, then part upload,
//! listing, completion and abort on the upload session path space.
//!

use std::{collections::BTreeMap, sync::Arc};

use chrono::Utc;
use http::{Method, Response, StatusCode};
use serde::Serialize;
use tracing::info;
use trellis_api::{
    audit::{audit_quads, AuditActivity},
    model::Session,
    service::{ByteStream, Resolver},
};

use crate::{
    body::{self, Body},
    config::LdpConfig,
    error::LdpError,
    handler::mutation::{binary_dataset, carry_untouched_graphs},
    policy::apply_allow_headers,
    request::LdpRequest,
    Collaborators,
};

/// Top level path segment of the upload session space.
pub const UPLOAD_PREFIX: &str = "upload";

/// One entry of a part listing.
#[derive(Debug, Serialize)]
pub struct PartEntry {
    /// The part number.
    #[serde(rename = "partNumber")]
    pub part_number: u32,

    /// Digest of the uploaded part.
    pub digest: String,
}

/// A request into the upload session path space,
/// `upload/<partition>/<session>[/<part_number>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// The partition the session belongs to.
    pub partition: String,

    /// The session id.
    pub session: String,

    /// The part number, on part upload paths.
    pub part_number: Option<u32>,
}

impl UploadTarget {
    /// Parse an upload space path, without the `upload/` prefix.
    pub fn parse(path: &str) -> Option<Self> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let partition = segments.next()?.to_owned();
        let session = segments.next()?.to_owned();
        let part_number = match segments.next() {
            None => None,
            Some(segment) => Some(segment.parse().ok()?),
        };
        if segments.next().is_some() {
            return None;
        }
        Some(Self {
            partition,
            session,
            part_number,
        })
    }
}

/// Controller of the multipart upload lifecycle.
pub struct MultipartController {
    collaborators: Collaborators,
    config: Arc<LdpConfig>,
}

impl MultipartController {
    /// Create a new controller over given collaborators.
    pub fn new(collaborators: Collaborators, config: Arc<LdpConfig>) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    fn resolver(&self, partition: &str) -> Result<&dyn Resolver, LdpError> {
        self.collaborators
            .binaries
            .resolver_for(partition)
            .filter(|r| r.supports_multipart_upload())
            .ok_or(LdpError::MethodNotAllowed)
    }

    /// Initiate an upload session: `POST` on a resource's
    /// `?ext=upload` surface.
    #[tracing::instrument(skip_all, name = "MultipartController::initiate")]
    pub async fn initiate(&self, req: LdpRequest) -> Result<Response<Body>, LdpError> {
        let resolver = self.resolver(req.identifier.partition())?;

        let mime_type = req.content_type().unwrap_or(mime::APPLICATION_OCTET_STREAM);
        let session = resolver.initiate_upload(&req.identifier, mime_type).await?;
        info!("Initiated upload session {}", session);

        let location = format!(
            "{}{}/{}/{}",
            self.config.base_url,
            UPLOAD_PREFIX,
            req.identifier.partition(),
            session
        );

        Ok(Response::builder()
            .status(StatusCode::CREATED)
            .header(http::header::LOCATION, location)
            .body(body::empty())
            .expect("Must be a well formed response."))
    }

    /// Serve a request in the upload session path space.
    #[tracing::instrument(skip_all, name = "MultipartController::handle_session")]
    pub async fn handle_session(
        &self,
        method: Method,
        target: UploadTarget,
        agent_session: Session,
        body_stream: Option<ByteStream>,
    ) -> Result<Response<Body>, LdpError> {
        let resolver = self.resolver(&target.partition)?;

        if method == Method::OPTIONS {
            let mut response = Response::builder()
                .status(StatusCode::NO_CONTENT)
                .body(body::empty())
                .expect("Must be a well formed response.");
            apply_allow_headers(
                response.headers_mut(),
                &[
                    Method::GET,
                    Method::PUT,
                    Method::POST,
                    Method::DELETE,
                    Method::OPTIONS,
                ],
            );
            return Ok(response);
        }

        if !resolver.upload_session_exists(&target.session).await? {
            return Err(LdpError::NotFound);
        }

        if method == Method::PUT {
            let part_number = target.part_number.ok_or(LdpError::MethodNotAllowed)?;
            let stream =
                body_stream.ok_or_else(|| LdpError::BadRequest("missing part body".into()))?;
            let digest = resolver
                .upload_part(&target.session, part_number, stream)
                .await?;
            return self.json_response(StatusCode::OK, &serde_json::json!({ "digest": digest }));
        }

        if target.part_number.is_some() {
            return Err(LdpError::MethodNotAllowed);
        }

        if method == Method::GET {
            let parts: Vec<PartEntry> = resolver
                .list_parts(&target.session)
                .await?
                .into_iter()
                .map(|(part_number, digest)| PartEntry {
                    part_number,
                    digest,
                })
                .collect();
            self.json_response(StatusCode::OK, &parts)
        } else if method == Method::POST {
            self.complete(resolver, &target, agent_session, body_stream)
                .await
        } else if method == Method::DELETE {
            resolver.abort_upload(&target.session).await?;
            info!("Aborted upload session {}", target.session);
            Ok(Response::builder()
                .status(StatusCode::NO_CONTENT)
                .body(body::empty())
                .expect("Must be a well formed response."))
        } else {
            Err(LdpError::MethodNotAllowed)
        }
    }

    /// Finalize a session and persist the uploaded resource.
    async fn complete(
        &self,
        resolver: &dyn Resolver,
        target: &UploadTarget,
        agent_session: Session,
        body_stream: Option<ByteStream>,
    ) -> Result<Response<Body>, LdpError> {
        let parts = match body_stream {
            None => BTreeMap::new(),
            Some(stream) => {
                let buffer = body::collect_stream(stream)
                    .await
                    .map_err(|e| LdpError::BadRequest(format!("unreadable body: {}", e)))?;
                let raw: BTreeMap<String, String> = serde_json::from_slice(&buffer)
                    .map_err(|e| LdpError::BadRequest(format!("invalid part map: {}", e)))?;
                raw.into_iter()
                    .map(|(number, digest)| {
                        number
                            .parse::<u32>()
                            .map(|n| (n, digest))
                            .map_err(|_| LdpError::BadRequest("invalid part number".into()))
                    })
                    .collect::<Result<_, _>>()?
            }
        };

        let completed = resolver.complete_upload(&target.session, parts).await?;
        info!("Completed upload session {}", target.session);

        let mut dataset = binary_dataset(
            &completed.target,
            &completed.internal_id,
            Some(&completed.mime_type),
        );
        // Completing over an existing resource replaces its
        // content, not its other graphs.
        if let Some(existing) = self.collaborators.resources.get(&completed.target).await? {
            carry_untouched_graphs(&mut dataset, &existing, &[]);
        }
        dataset.extend(audit_quads(
            &completed.target,
            AuditActivity::Creation,
            &agent_session,
            Utc::now(),
        ));
        self.collaborators
            .resources
            .put(&completed.target, dataset)
            .await?;

        let location = completed.target.external_url(&self.config.base_url);
        Ok(Response::builder()
            .status(StatusCode::CREATED)
            .header(http::header::LOCATION, location)
            .body(body::empty())
            .expect("Must be a well formed response."))
    }

    fn json_response<T: Serialize>(
        &self,
        status: StatusCode,
        value: &T,
    ) -> Result<Response<Body>, LdpError> {
        let payload = serde_json::to_vec(value)
            .map_err(|e| trellis_api::service::ServiceError::new(e.to_string()))?;
        Ok(Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body::full(payload))
            .expect("Must be a well formed response."))
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_none, assert_some_eq};

    use super::*;

    #[test]
    fn session_paths_parse() {
        assert_some_eq!(
            UploadTarget::parse("repo1/session123"),
            UploadTarget {
                partition: "repo1".to_owned(),
                session: "session123".to_owned(),
                part_number: None,
            }
        );
        assert_some_eq!(
            UploadTarget::parse("repo1/session123/4"),
            UploadTarget {
                partition: "repo1".to_owned(),
                session: "session123".to_owned(),
                part_number: Some(4),
            }
        );
    }

    #[test]
    fn malformed_session_paths_are_rejected(){
        assert_none!(UploadTarget::parse("repo1"));
        assert_none!(UploadTarget::parse("repo1/session/notanumber"));
        assert_none!(UploadTarget::parse("repo1/session/1/extra"));
    }
}
