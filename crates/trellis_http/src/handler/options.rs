//! I define the handler for `OPTIONS` requests: allowed methods
//! for the target state, no entity, no type links, no caching.
//!

use std::sync::Arc;

use http::{Method, Response, StatusCode};
use tracing::debug;

use crate::{
    body::{self, Body},
    config::LdpConfig,
    error::LdpError,
    policy::{allowed_methods, apply_allow_headers},
    request::{Ext, LdpRequest},
    Collaborators,
};

/// Handler for `OPTIONS` requests.
pub struct OptionsHandler {
    collaborators: Collaborators,
}

impl OptionsHandler {
    /// Create a new handler over given collaborators.
    pub fn new(collaborators: Collaborators, _config: Arc<LdpConfig>) -> Self {
        Self { collaborators }
    }

    /// Apply the method.
    #[tracing::instrument(skip_all, name = "OptionsHandler::handle")]
    pub async fn handle(&self, req: LdpRequest) -> Result<Response<Body>, LdpError> {
        let mut response = Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(body::empty())
            .expect("Must be a well formed response.");

        // The upload initiate surface advertises itself even
        // before any session exists.
        if req.ext == Ext::Upload {
            let supports = self
                .collaborators
                .binaries
                .resolver_for(req.identifier.partition())
                .map(|r| r.supports_multipart_upload())
                .unwrap_or(false);
            if !supports {
                return Err(LdpError::MethodNotAllowed);
            }
            apply_allow_headers(response.headers_mut(), &[Method::OPTIONS, Method::POST]);
            return Ok(response);
        }

        let resource = self
            .collaborators
            .resources
            .get(&req.identifier)
            .await?
            .ok_or(LdpError::NotFound)?;

        if resource.is_gone() {
            return Err(LdpError::Gone);
        }

        if req.ext == Ext::Acl && !resource.has_acl {
            return Err(LdpError::NotFound);
        }

        let memento_view = req.version.is_some() || resource.is_memento;
        let allowed = allowed_methods(resource.interaction_model, memento_view, req.ext);
        debug!("Resolved allowed methods: {:?}", allowed);
        apply_allow_headers(response.headers_mut(), &allowed);

        Ok(response)
    }
}
