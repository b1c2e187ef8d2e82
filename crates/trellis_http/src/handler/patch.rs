//! I define the handler for `PATCH`: application of a
//! sparql-update body to the user managed graph (or the access
//! control graph) of a resource.
//!

use std::sync::Arc;

use chrono::Utc;
use headers::HeaderMapExt;
use http::{Response, StatusCode};
use ldp_typed_headers::prefer::{PreferReturn, PreferenceApplied};
use tracing::info;
use trellis_api::{
    audit::{audit_quads, AuditActivity},
    model::{GraphName, Term, Triple},
    service::APPLICATION_SPARQL_UPDATE,
};

use crate::{
    body::{self, Body},
    config::LdpConfig,
    conneg,
    error::LdpError,
    etag::{binary_etag, rdf_etag},
    handler::{
        mutation::{carry_untouched_graphs, rdf_dataset},
        require_control,
    },
    preconditions::{PreconditionEvaluator, ResolvedAction},
    request::{Ext, LdpRequest},
    Collaborators,
};

/// Handler for `PATCH` requests.
pub struct PatchHandler {
    collaborators: Collaborators,
    config: Arc<LdpConfig>,
}

impl PatchHandler {
    /// Create a new handler over given collaborators.
    pub fn new(collaborators: Collaborators, config: Arc<LdpConfig>) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    /// Apply the method.
    #[tracing::instrument(skip_all, name = "PatchHandler::handle")]
    pub async fn handle(&self, mut req: LdpRequest) -> Result<Response<Body>, LdpError> {
        if req.version.is_some() || matches!(req.ext, Ext::Timemap | Ext::Upload) {
            return Err(LdpError::MethodNotAllowed);
        }

        // The body must be a sparql-update document.
        let is_sparql_update = req
            .content_type()
            .map(|ct| {
                ct.type_() == APPLICATION_SPARQL_UPDATE.type_()
                    && ct.subtype() == APPLICATION_SPARQL_UPDATE.subtype()
            })
            .unwrap_or(false);
        if !is_sparql_update {
            return Err(LdpError::UnsupportedMediaType);
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
        if req.ext == Ext::Acl {
            if !resource.has_acl {
                return Err(LdpError::NotFound);
            }
            require_control(&self.collaborators, &req.identifier, &req.session).await?;
        }

        let external_url = req.identifier.external_url(&self.config.base_url);

        // Writes are strict about malformed conditionals.
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

        let graph_name = if req.ext == Ext::Acl {
            GraphName::AccessControl
        } else {
            GraphName::UserManaged
        };

        // Load the current graph in its external view.
        let graph: Vec<Triple> = resource
            .stream(&[graph_name])
            .map(|quad| {
                let (spo, _) = quad;
                spo.map(|t| {
                    self.collaborators.resources.to_external(
                        self.collaborators.resources.unskolemize(t),
                        &self.config.base_url,
                    )
                })
            })
            .collect();

        let sparql_bytes = body::collect_stream(req.take_body()?)
            .await
            .map_err(|e| LdpError::BadRequest(format!("unreadable body: {}", e)))?;
        let sparql = std::str::from_utf8(&sparql_bytes)
            .map_err(|_| LdpError::BadRequest("body is not valid utf-8".into()))?;

        let updated = self
            .collaborators
            .io
            .update(graph, sparql, &external_url)
            .await
            .map_err(|e| LdpError::BadRequest(format!("invalid sparql-update: {}", e)))?;

        // Nothing is persisted past a violation.
        if let Some(violation) = self
            .collaborators
            .constraints
            .constrained_by(
                resource.interaction_model,
                &self.config.base_url,
                &updated,
            )
            .await
        {
            return Err(LdpError::ConstraintViolation(violation));
        }

        let mut dataset = rdf_dataset(
            &self.collaborators,
            &req.identifier,
            resource.interaction_model,
            updated.clone(),
            &[],
            &self.config.base_url,
            graph_name,
        );
        carry_untouched_graphs(&mut dataset, &resource, &[graph_name]);
        dataset.extend(audit_quads(
            &req.identifier,
            AuditActivity::Update,
            &req.session,
            Utc::now(),
        ));

        self.collaborators
            .resources
            .put(&req.identifier, dataset)
            .await?;
        info!("Patched {} graph of {}", graph_name_label(graph_name), req.identifier);

        // `Prefer: return=representation` earns the new state back.
        let prefer = req.prefer()?;
        if prefer.as_ref().and_then(|p| p.preferred_return) == Some(PreferReturn::Representation) {
            let variant = conneg::negotiate_rdf(req.accept()?.as_ref())?;
            let quads = updated.into_iter().map(|triple| (triple, None::<Term>));
            let stream = self
                .collaborators
                .io
                .write(Box::new(quads), variant.syntax, variant.profile)
                .await?;

            let mut response = Response::builder()
                .status(StatusCode::OK)
                .body(body::from_stream(stream))
                .expect("Must be a well formed response.");
            response
                .headers_mut()
                .typed_insert(headers::ContentType::from(variant.media_type()));
            response.headers_mut().typed_insert(PreferenceApplied {
                preferred_return: PreferReturn::Representation,
            });
            return Ok(response);
        }

        Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(body::empty())
            .expect("Must be a well formed response."))
    }
}

fn graph_name_label(graph_name: GraphName) -> &'static str {
    match graph_name {
        GraphName::AccessControl => "access control",
        _ => "user managed",
    }
}
