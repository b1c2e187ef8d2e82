//! I define the handler for `GET` and `HEAD` over repository
//! resources: binaries, binary descriptions, time maps, mementos,
//! access control graphs and containers.
//!

use std::sync::Arc;

use headers::{AcceptRanges, ContentLength, ContentType, HeaderMapExt};
use http::{Method, Response, StatusCode};
use if_chain::if_chain;
use ldp_typed_headers::{
    datetime::MementoDatetime,
    digest::Digest,
    prefer::{PreferReturn, PreferenceApplied},
};
use sophia_api::term::Term as _;
use tracing::debug;
use trellis_api::{
    model::{GraphName, InteractionModel, Quad, Resource},
    service::ServiceError,
};

use crate::{
    body::{self, Body},
    config::LdpConfig,
    conneg::{self, BinarySelection, RdfVariant, TimemapVariant, APPLICATION_LINK_FORMAT},
    error::LdpError,
    etag::{binary_etag, rdf_etag},
    handler::{
        insert_cache_control, insert_etag, insert_last_modified, insert_links, insert_vary,
        require_control, VARY_BINARY, VARY_RDF,
    },
    link,
    policy::{allowed_methods, apply_allow_headers},
    preconditions::{PreconditionEvaluator, ResolvedAction},
    request::{Ext, LdpRequest, TriplePattern},
    stream_util, timemap, Collaborators,
};

/// Handler for `GET` and `HEAD` requests.
pub struct GetHandler {
    collaborators: Collaborators,
    config: Arc<LdpConfig>,
}

impl GetHandler {
    /// Create a new handler over given collaborators.
    pub fn new(collaborators: Collaborators, config: Arc<LdpConfig>) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    /// Apply the method.
    #[tracing::instrument(skip_all, name = "GetHandler::handle")]
    pub async fn handle(&self, req: LdpRequest) -> Result<Response<Body>, LdpError> {
        // The upload surface only serves OPTIONS and POST.
        if req.ext == Ext::Upload {
            return Err(LdpError::MethodNotAllowed);
        }

        let head = self
            .collaborators
            .resources
            .get(&req.identifier)
            .await?
            .ok_or(LdpError::NotFound)?;

        if head.is_gone() {
            return Err(LdpError::Gone);
        }

        let (resource, memento_view) = self.select_snapshot(&req, head).await?;

        if req.ext == Ext::Acl {
            if !resource.has_acl {
                return Err(LdpError::NotFound);
            }
            require_control(&self.collaborators, &req.identifier, &req.session).await?;
        }

        if req.ext == Ext::Timemap {
            return self.timemap_response(&req, &resource).await;
        }

        let external_url = req.identifier.external_url(&self.config.base_url);

        // Select the representation.
        let accept = req.accept()?;
        let selection = if resource.interaction_model == InteractionModel::NonRdfSource
            && req.ext == Ext::None
        {
            let binary = resource
                .binary
                .as_ref()
                .ok_or_else(|| ServiceError::new("non-rdf resource without binary descriptor"))?;
            conneg::negotiate_binary(accept.as_ref(), &binary.mime_type)?
        } else {
            BinarySelection::Description(conneg::negotiate_rdf(accept.as_ref())?)
        };

        // Validators of the selected representation.
        let (etag, last_modified) = match (&selection, &resource.binary) {
            (BinarySelection::Content, Some(binary)) => {
                (binary_etag(binary, &external_url), binary.modified)
            }
            _ => (rdf_etag(resource.modified, &external_url), resource.modified),
        };

        // Reads are optimistic about malformed conditionals.
        let action = PreconditionEvaluator {
            method: &req.method,
            headers: &req.headers,
            etag: &etag,
            last_modified,
        }
        .evaluate_lenient();

        let allowed = allowed_methods(resource.interaction_model, memento_view, req.ext);

        if let ResolvedAction::Return(status) = action {
            debug!("Preconditions resolved to {}", status);
            let mut response = Response::builder()
                .status(status)
                .body(body::empty())
                .expect("Must be a well formed response.");
            apply_allow_headers(response.headers_mut(), &allowed);
            insert_etag(response.headers_mut(), &etag);
            insert_vary(
                response.headers_mut(),
                if matches!(selection, BinarySelection::Content) {
                    VARY_BINARY
                } else {
                    VARY_RDF
                },
            );
            return Ok(response);
        }

        // Build the representation response.
        let mut response = match &selection {
            BinarySelection::Content => self.binary_response(&req, &resource).await?,
            BinarySelection::Description(variant) => {
                self.rdf_response(&req, &resource, *variant).await?
            }
        };

        let status = response.status();
        let headers = response.headers_mut();
        apply_allow_headers(headers, &allowed);
        insert_etag(headers, &etag);
        insert_last_modified(headers, last_modified);
        if status == StatusCode::OK {
            insert_cache_control(headers, self.config.cache_max_age);
        }
        if memento_view {
            headers.typed_insert(MementoDatetime(resource.modified));
        }

        // Links of the selected representation.
        let mut links = link::type_links(resource.interaction_model, &resource.types);
        if req.ext == Ext::None {
            match &selection {
                BinarySelection::Content => {
                    links.extend(link::binary_content_links(&external_url))
                }
                BinarySelection::Description(_)
                    if resource.interaction_model == InteractionModel::NonRdfSource =>
                {
                    links.extend(link::binary_description_links(&external_url))
                }
                _ => {}
            }
            links.extend(link::memento_links(&resource, &external_url));
            links.extend(link::service_links(&resource));
            links.extend(link::multipart_upload_link(
                &resource,
                &external_url,
                req.ext,
                self.store_supports_multipart(req.identifier.partition()),
            ));
        }
        insert_links(response.headers_mut(), links);

        if req.method == Method::HEAD {
            let (parts, _) = response.into_parts();
            response = Response::from_parts(parts, body::empty());
        }

        Ok(response)
    }

    /// Resolve the snapshot the request targets: the head, an
    /// explicit `?version`, or the memento negotiated through
    /// `Accept-Datetime`.
    async fn select_snapshot(
        &self,
        req: &LdpRequest,
        head: Resource,
    ) -> Result<(Resource, bool), LdpError> {
        if let Some(instant) = req.version {
            let memento = self
                .collaborators
                .resources
                .get_at(&req.identifier, instant)
                .await?
                .ok_or(LdpError::NotFound)?;
            return Ok((memento, true));
        }

        if_chain! {
            if req.ext == Ext::None;
            if !head.mementos.is_empty();
            if let Some(accept_datetime) = req.accept_datetime()?;
            then {
                let memento = self
                    .collaborators
                    .resources
                    .get_at(&req.identifier, accept_datetime.0)
                    .await?
                    .ok_or(LdpError::NotFound)?;
                return Ok((memento, true));
            }
        }

        let memento_view = head.is_memento;
        Ok((head, memento_view))
    }

    fn store_supports_multipart(&self, partition: &str) -> bool {
        self.collaborators
            .binaries
            .resolver_for(partition)
            .map(|r| r.supports_multipart_upload())
            .unwrap_or(false)
    }

    /// The time map rendering: status 200, read only, no
    /// last-modified, link set mirrored into the body.
    async fn timemap_response(
        &self,
        req: &LdpRequest,
        resource: &Resource,
    ) -> Result<Response<Body>, LdpError> {
        let external_url = req.identifier.external_url(&self.config.base_url);
        let links = link::memento_links(resource, &external_url);

        let variant = conneg::negotiate_timemap(req.accept()?.as_ref())?;
        let (content_type, body) = match variant {
            TimemapVariant::LinkFormat => (
                APPLICATION_LINK_FORMAT.clone(),
                body::full(timemap::link_format_body(&links)),
            ),
            TimemapVariant::JsonLd(profile) => {
                let quads = timemap::timemap_quads(resource, &external_url);
                let stream = self
                    .collaborators
                    .io
                    .write(
                        Box::new(quads.into_iter()),
                        trellis_api::service::RdfSyntax::JsonLd,
                        Some(profile),
                    )
                    .await?;
                (
                    trellis_api::service::APPLICATION_JSON_LD.clone(),
                    body::from_stream(stream),
                )
            }
        };

        let mut response = Response::builder()
            .status(StatusCode::OK)
            .body(if req.method == Method::HEAD {
                body::empty()
            } else {
                body
            })
            .expect("Must be a well formed response.");

        let headers = response.headers_mut();
        headers.typed_insert(ContentType::from(content_type));
        apply_allow_headers(
            headers,
            &allowed_methods(resource.interaction_model, false, Ext::Timemap),
        );
        insert_vary(headers, VARY_RDF);
        insert_cache_control(headers, self.config.cache_max_age);
        insert_links(headers, links);

        Ok(response)
    }

    /// The blob content rendering, with range and instance digest
    /// handling.
    async fn binary_response(
        &self,
        req: &LdpRequest,
        resource: &Resource,
    ) -> Result<Response<Body>, LdpError> {
        let binary = resource
            .binary
            .as_ref()
            .ok_or_else(|| ServiceError::new("non-rdf resource without binary descriptor"))?;
        let partition = req.identifier.partition();

        let mut response = Response::builder()
            .status(StatusCode::OK)
            .body(body::empty())
            .expect("Must be a well formed response.");
        let headers = response.headers_mut();

        headers.typed_insert(ContentType::from(binary.mime_type.clone()));
        headers.typed_insert(AcceptRanges::bytes());

        // An instance digest is computed from a freshly acquired
        // stream, never from the response body stream.
        if let Some(want_digest) = req.want_digest()? {
            if let Some(algorithm) =
                want_digest.preferred(self.collaborators.binaries.supported_algorithms())
            {
                let fresh = self
                    .collaborators
                    .binaries
                    .get_content(partition, &binary.internal_id)
                    .await?
                    .ok_or(LdpError::NotFound)?;
                let digest = self.collaborators.binaries.digest(algorithm, fresh).await?;
                headers.typed_insert(Digest::new(algorithm, digest));
            }
        }

        let stream = self
            .collaborators
            .binaries
            .get_content(partition, &binary.internal_id)
            .await?
            .ok_or(LdpError::NotFound)?;

        let (content, length) = match req.range()? {
            // A range starting past the content yields an empty
            // body with 200.
            Some(range) if range.first >= binary.size => (body::empty(), 0),
            Some(range) => {
                // The upper bound is exclusive here: a client
                // asking bytes=2-6 of nine bytes gets four back.
                let length = (range.last - range.first).min(binary.size - range.first);
                let sliced = stream_util::sliced(stream, range.first, length)
                    .await
                    .map_err(|e| LdpError::BadRequest(format!("range skip failed: {}", e)))?;
                (body::from_stream(sliced), length)
            }
            None => (body::from_stream(stream), binary.size),
        };

        headers.typed_insert(ContentLength(length));
        insert_vary(headers, VARY_BINARY);

        let (parts, _) = response.into_parts();
        Ok(Response::from_parts(parts, content))
    }

    /// The rdf rendering: graph selection by `Prefer`, the linked
    /// data fragments filter, and serialization through the io
    /// collaborator.
    async fn rdf_response(
        &self,
        req: &LdpRequest,
        resource: &Resource,
        variant: RdfVariant,
    ) -> Result<Response<Body>, LdpError> {
        let prefer = req.prefer()?;

        let graphs: Vec<GraphName> = if req.ext == Ext::Acl {
            vec![GraphName::AccessControl]
        } else if resource.interaction_model == InteractionModel::NonRdfSource {
            vec![GraphName::UserManaged]
        } else {
            let mut graphs: Vec<GraphName> = GraphName::DEFAULT_REPRESENTATION.to_vec();
            if let Some(prefer) = &prefer {
                for iri in &prefer.include {
                    if let Some(graph) = GraphName::from_iri(iri) {
                        if !graphs.contains(&graph) {
                            graphs.push(graph);
                        }
                    }
                }
                for iri in &prefer.omit {
                    if let Some(graph) = GraphName::from_iri(iri) {
                        graphs.retain(|g| *g != graph);
                    }
                }
            }
            graphs
        };

        let preferred_return = prefer.as_ref().and_then(|p| p.preferred_return);

        let mut response = if preferred_return == Some(PreferReturn::Minimal) {
            Response::builder()
                .status(StatusCode::NO_CONTENT)
                .body(body::empty())
                .expect("Must be a well formed response.")
        } else {
            // Stored terms are internal and skolemized; serve the
            // external view.
            let resources = self.collaborators.resources.clone();
            let base_url = self.config.base_url.clone();
            let quads = resource.stream(&graphs).map(move |(spo, g)| {
                (
                    spo.map(|t| resources.to_external(resources.unskolemize(t), &base_url)),
                    g,
                )
            });
            let quads: Box<dyn Iterator<Item = Quad> + Send> = if req.pattern.is_constrained() {
                let pattern = req.pattern.clone();
                Box::new(quads.filter(move |q| pattern_matches(&pattern, q)))
            } else {
                Box::new(quads)
            };

            let stream = self
                .collaborators
                .io
                .write(quads, variant.syntax, variant.profile)
                .await?;

            let mut response = Response::builder()
                .status(StatusCode::OK)
                .body(body::from_stream(stream))
                .expect("Must be a well formed response.");
            response
                .headers_mut()
                .typed_insert(ContentType::from(variant.media_type()));
            response
        };

        let headers = response.headers_mut();
        if let Some(preferred_return) = preferred_return {
            headers.typed_insert(PreferenceApplied { preferred_return });
        }
        insert_vary(headers, VARY_RDF);

        Ok(response)
    }
}

/// Match one quad against a linked data fragments pattern.
fn pattern_matches(pattern: &TriplePattern, quad: &Quad) -> bool {
    let ([s, p, o], _) = quad;

    let term_is = |term: &trellis_api::model::Term, needle: &str| -> bool {
        term.iri().map(|i| i.as_str() == needle).unwrap_or(false)
            || term
                .lexical_form()
                .map(|l| l.as_ref() == needle)
                .unwrap_or(false)
    };

    pattern.subject.as_deref().map(|v| term_is(s, v)).unwrap_or(true)
        && pattern.predicate.as_deref().map(|v| term_is(p, v)).unwrap_or(true)
        && pattern.object.as_deref().map(|v| term_is(o, v)).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use trellis_vocab::term;

    use super::*;

    fn quad(s: &str, p: &str, o_literal: &str) -> Quad {
        (
            [term::iri(s.to_owned()), term::iri(p.to_owned()), term::literal_str(o_literal)],
            None,
        )
    }

    #[test]
    fn unconstrained_pattern_matches_everything() {
        let pattern = TriplePattern::default();
        assert!(pattern_matches(
            &pattern,
            &quad("http://example.org/s", "http://purl.org/dc/terms/title", "A title")
        ));
    }

    #[test]
    fn constrained_components_must_all_match() {
        let pattern = TriplePattern {
            subject: Some("http://example.org/s".to_owned()),
            predicate: None,
            object: Some("A title".to_owned()),
        };
        assert!(pattern_matches(
            &pattern,
            &quad("http://example.org/s", "http://purl.org/dc/terms/title", "A title")
        ));
        assert!(!pattern_matches(
            &pattern,
            &quad("http://example.org/other", "http://purl.org/dc/terms/title", "A title")
        ));
        assert!(!pattern_matches(
            &pattern,
            &quad("http://example.org/s", "http://purl.org/dc/terms/title", "Another")
        ));
    }
}
