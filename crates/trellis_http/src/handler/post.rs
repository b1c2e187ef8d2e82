//! I define the handler for `POST` to containers: creation of a
//! child rdf or non-rdf resource.
//!

use std::sync::Arc;

use chrono::Utc;
use http::{Response, StatusCode};
use tracing::{debug, info};
use trellis_api::{
    audit::{audit_quads, AuditActivity},
    model::InteractionModel,
};

use crate::{
    body::{self, Body},
    config::LdpConfig,
    error::LdpError,
    handler::{
        insert_links,
        mutation::{
            binary_dataset, effective_model, read_rdf_body, requested_type, rdf_dataset,
            write_binary_content,
        },
    },
    link,
    request::{Ext, LdpRequest},
    Collaborators,
};

/// Handler for `POST` requests.
pub struct PostHandler {
    collaborators: Collaborators,
    config: Arc<LdpConfig>,
}

impl PostHandler {
    /// Create a new handler over given collaborators.
    pub fn new(collaborators: Collaborators, config: Arc<LdpConfig>) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    /// Apply the method.
    #[tracing::instrument(skip_all, name = "PostHandler::handle")]
    pub async fn handle(&self, mut req: LdpRequest) -> Result<Response<Body>, LdpError> {
        if req.version.is_some() || matches!(req.ext, Ext::Acl | Ext::Timemap) {
            return Err(LdpError::MethodNotAllowed);
        }

        // Target must be a live container.
        let container = self
            .collaborators
            .resources
            .get(&req.identifier)
            .await?
            .ok_or(LdpError::NotFound)?;
        if container.is_gone() {
            return Err(LdpError::Gone);
        }
        if !container.interaction_model.is_container() {
            return Err(LdpError::MethodNotAllowed);
        }

        // Derive the child path from the slug, or mint one.
        let segment = match req.slug()? {
            Some(slug) => slug.as_str().to_owned(),
            None => self.collaborators.resources.generate_identifier(),
        };
        let child = req.identifier.child(&segment);

        if self.collaborators.resources.get(&child).await?.is_some() {
            debug!("Derived path already exists: {}", child);
            return Err(LdpError::Conflict(format!(
                "a resource already exists at {}",
                child
            )));
        }

        let requested = requested_type(req.link()?.as_ref());
        let content_type = req.content_type();
        let model = effective_model(&requested, content_type.as_ref(), None);

        let child_url = child.external_url(&self.config.base_url);
        let digest = req.digest()?;
        let stream = req.take_body()?;

        let mut dataset = if model == InteractionModel::NonRdfSource {
            let internal_id = write_binary_content(
                &self.collaborators,
                &child,
                stream,
                content_type.as_ref(),
                digest.as_ref(),
            )
            .await?;
            binary_dataset(&child, &internal_id, content_type.as_ref())
        } else {
            let triples =
                read_rdf_body(&self.collaborators, stream, &child_url, content_type.as_ref())
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
                &child,
                model,
                triples,
                &requested.user_types,
                &self.config.base_url,
                trellis_api::model::GraphName::UserManaged,
            )
        };

        dataset.extend(audit_quads(
            &child,
            AuditActivity::Creation,
            &req.session,
            Utc::now(),
        ));

        self.collaborators.resources.put(&child, dataset).await?;
        info!("Created {} as {}", child, model);

        let mut response = Response::builder()
            .status(StatusCode::CREATED)
            .header(http::header::LOCATION, &child_url)
            .body(body::empty())
            .expect("Must be a well formed response.");

        insert_links(
            response.headers_mut(),
            link::type_links(model, &requested.user_types),
        );

        Ok(response)
    }
}
