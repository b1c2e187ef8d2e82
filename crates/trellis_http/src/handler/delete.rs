//! I define the handler for `DELETE`: the resource is replaced by
//! a tombstone snapshot, not erased.
//!

use std::sync::Arc;

use chrono::Utc;
use http::{Response, StatusCode};
use tracing::info;
use trellis_api::{
    audit::{audit_quads, AuditActivity},
    model::{in_graph, GraphName, InteractionModel},
};
use trellis_vocab::{ns, term, trellis};

use crate::{
    body::{self, Body},
    config::LdpConfig,
    error::LdpError,
    etag::{binary_etag, rdf_etag},
    preconditions::{PreconditionEvaluator, ResolvedAction},
    request::{Ext, LdpRequest},
    Collaborators,
};

/// Handler for `DELETE` requests.
pub struct DeleteHandler {
    collaborators: Collaborators,
    config: Arc<LdpConfig>,
}

impl DeleteHandler {
    /// Create a new handler over given collaborators.
    pub fn new(collaborators: Collaborators, config: Arc<LdpConfig>) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    /// Apply the method.
    #[tracing::instrument(skip_all, name = "DeleteHandler::handle")]
    pub async fn handle(&self, req: LdpRequest) -> Result<Response<Body>, LdpError> {
        if req.version.is_some() || matches!(req.ext, Ext::Timemap | Ext::Upload | Ext::Acl) {
            return Err(LdpError::MethodNotAllowed);
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
        if resource.is_memento {
            return Err(LdpError::MethodNotAllowed);
        }

        let external_url = req.identifier.external_url(&self.config.base_url);
        let (etag, last_modified) = match &resource.binary {
            Some(binary) => (binary_etag(binary, &external_url), binary.modified),
            None => (rdf_etag(resource.modified, &external_url), resource.modified),
        };
        if let ResolvedAction::Return(_) = (PreconditionEvaluator {
            method: &req.method,
            headers: &req.headers,
            etag: &etag,
            last_modified,
        }
        .evaluate()?)
        {
            return Err(LdpError::PreconditionFailed);
        }

        // The tombstone snapshot: the model downgraded to
        // `ldp:Resource`, marked deleted. Children of a container
        // become orphan references; resolving them yields 404.
        let subject = term::iri(req.identifier.internal_iri());
        let type_term = term::iri(ns::rdf::type_.to_string());
        let mut dataset = vec![
            in_graph(
                [
                    subject.clone(),
                    type_term.clone(),
                    term::iri(InteractionModel::Resource.iri()),
                ],
                GraphName::ServerManaged,
            ),
            in_graph(
                [subject, type_term, term::iri(trellis::DeletedResource)],
                GraphName::ServerManaged,
            ),
        ];
        dataset.extend(audit_quads(
            &req.identifier,
            AuditActivity::Deletion,
            &req.session,
            Utc::now(),
        ));

        self.collaborators
            .resources
            .put(&req.identifier, dataset)
            .await?;
        info!("Deleted {}", req.identifier);

        Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(body::empty())
            .expect("Must be a well formed response."))
    }
}
