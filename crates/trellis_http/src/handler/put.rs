//! I define the handler for `PUT`: replacement or creation of a
//! resource at the request path, with interaction model change
//! detection.
//!

use std::sync::Arc;

use chrono::Utc;
use http::{Response, StatusCode};
use tracing::info;
use trellis_api::{
    audit::{audit_quads, AuditActivity},
    model::{GraphName, InteractionModel, Resource},
};

use crate::{
    body::{self, Body},
    config::LdpConfig,
    error::LdpError,
    etag::{binary_etag, rdf_etag},
    handler::{
        insert_links, require_control,
        mutation::{
            binary_dataset, carry_untouched_graphs, effective_model, read_rdf_body,
            requested_type, rdf_dataset, write_binary_content,
        },
    },
    link,
    policy::allowed_methods,
    preconditions::{PreconditionEvaluator, ResolvedAction},
    request::{Ext, LdpRequest},
    Collaborators,
};

/// Handler for `PUT` requests.
pub struct PutHandler {
    collaborators: Collaborators,
    config: Arc<LdpConfig>,
}

impl PutHandler {
    /// Create a new handler over given collaborators.
    pub fn new(collaborators: Collaborators, config: Arc<LdpConfig>) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    /// Apply the method.
    #[tracing::instrument(skip_all, name = "PutHandler::handle")]
    pub async fn handle(&self, mut req: LdpRequest) -> Result<Response<Body>, LdpError> {
        if req.version.is_some() || matches!(req.ext, Ext::Timemap | Ext::Upload) {
            return Err(LdpError::MethodNotAllowed);
        }

        let existing = self.collaborators.resources.get(&req.identifier).await?;

        if let Some(existing) = &existing {
            if existing.is_gone() {
                return Err(LdpError::Gone);
            }
            // The acl surface accepts PUT even though reads do not
            // advertise it there.
            if !allowed_methods(existing.interaction_model, existing.is_memento, Ext::None)
                .contains(&req.method)
            {
                return Err(LdpError::MethodNotAllowed);
            }
            // Preconditions are evaluated before any write, and
            // strictly: writes surface malformed conditionals.
            self.check_preconditions(&req, existing)?;
        }

        if req.ext == Ext::Acl {
            return self.replace_acl(req, existing).await;
        }

        let requested = requested_type(req.link()?.as_ref());
        let content_type = req.content_type();
        // With no explicit assertion the model of an existing
        // resource is kept.
        let model = effective_model(
            &requested,
            content_type.as_ref(),
            existing.as_ref().map(|r| r.interaction_model),
        );

        if let Some(existing) = &existing {
            if !existing.interaction_model.accepts_replacement_by(model) {
                return Err(LdpError::Conflict(format!(
                    "cannot replace {} with {}",
                    existing.interaction_model, model
                )));
            }
        }

        let external_url = req.identifier.external_url(&self.config.base_url);
        let digest = req.digest()?;
        let stream = req.take_body()?;

        let mut dataset = if model == InteractionModel::NonRdfSource {
            let internal_id = write_binary_content(
                &self.collaborators,
                &req.identifier,
                stream,
                content_type.as_ref(),
                digest.as_ref(),
            )
            .await?;
            binary_dataset(&req.identifier, &internal_id, content_type.as_ref())
        } else {
            let triples = read_rdf_body(
                &self.collaborators,
                stream,
                &external_url,
                content_type.as_ref(),
            )
            .await?;

            if let Some(violation) = self
                .collaborators
                .constraints
                .constrained_by(model, &self.config.base_url, &triples)
                .await
            {
                return Err(LdpError::ConstraintViolation(violation));
            }

            rdf_dataset(
                &self.collaborators,
                &req.identifier,
                model,
                triples,
                &requested.user_types,
                &self.config.base_url,
                GraphName::UserManaged,
            )
        };

        if let Some(existing) = &existing {
            // A binary replacement rewrites only the server
            // managed descriptor; a content replacement rewrites
            // the user managed graph.
            let written: &[GraphName] = if model == InteractionModel::NonRdfSource {
                &[]
            } else {
                &[GraphName::UserManaged]
            };
            carry_untouched_graphs(&mut dataset, existing, written);
        }

        let activity = if existing.is_some() {
            AuditActivity::Update
        } else {
            AuditActivity::Creation
        };
        dataset.extend(audit_quads(
            &req.identifier,
            activity,
            &req.session,
            Utc::now(),
        ));

        self.collaborators
            .resources
            .put(&req.identifier, dataset)
            .await?;
        info!("Replaced {} as {}", req.identifier, model);

        let mut response = Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(body::empty())
            .expect("Must be a well formed response.");
        insert_links(
            response.headers_mut(),
            link::type_links(model, &requested.user_types),
        );
        Ok(response)
    }

    fn check_preconditions(&self, req: &LdpRequest, existing: &Resource) -> Result<(), LdpError> {
        let external_url = req.identifier.external_url(&self.config.base_url);
        let (etag, last_modified) = match &existing.binary {
            Some(binary) => (binary_etag(binary, &external_url), binary.modified),
            None => (rdf_etag(existing.modified, &external_url), existing.modified),
        };

        match (PreconditionEvaluator {
            method: &req.method,
            headers: &req.headers,
            etag: &etag,
            last_modified,
        }
        .evaluate()?)
        {
            ResolvedAction::Proceed => Ok(()),
            ResolvedAction::Return(_) => Err(LdpError::PreconditionFailed),
        }
    }

    /// Replace the access control graph of an existing resource.
    async fn replace_acl(
        &self,
        mut req: LdpRequest,
        existing: Option<Resource>,
    ) -> Result<Response<Body>, LdpError> {
        let existing = existing.ok_or(LdpError::NotFound)?;
        require_control(&self.collaborators, &req.identifier, &req.session).await?;

        let content_type = req.content_type();
        let external_url = req.identifier.external_url(&self.config.base_url);
        let stream = req.take_body()?;

        let triples = read_rdf_body(
            &self.collaborators,
            stream,
            &external_url,
            content_type.as_ref(),
        )
        .await?;

        let mut dataset = rdf_dataset(
            &self.collaborators,
            &req.identifier,
            existing.interaction_model,
            triples,
            &[],
            &self.config.base_url,
            GraphName::AccessControl,
        );
        carry_untouched_graphs(&mut dataset, &existing, &[GraphName::AccessControl]);
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
        info!("Replaced access control graph of {}", req.identifier);

        Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(body::empty())
            .expect("Must be a well formed response."))
    }
}
