//! I define ingestion snippets shared by the mutating handlers:
//! interaction model resolution from `Link: rel="type"`, body
//! ingestion for rdf and binary content, digest verification, and
//! dataset assembly.
//!

use ldp_typed_headers::{digest::Digest, link::Link};
use mime::Mime;
use sophia_api::quad::Quad as _;
use trellis_api::{
    identifier::TrellisIdentifier,
    model::{in_graph, Dataset, GraphName, InteractionModel, Resource, Triple},
    service::{BinaryMetadata, ByteStream, RdfSyntax},
};
use trellis_vocab::{ns, term};

use crate::{error::LdpError, Collaborators};

/// The interaction model a request asks for, with any non-ldp
/// type iris it asserted.
#[derive(Debug, Clone, Default)]
pub(crate) struct RequestedType {
    /// The ldp interaction model, when one was asserted.
    pub model: Option<InteractionModel>,

    /// Non-ldp `rel="type"` iris, stored as user types.
    pub user_types: Vec<String>,
}

/// Resolve the type assertions of a `Link` header. Unknown type
/// iris are accepted and kept as user types.
pub(crate) fn requested_type(link: Option<&Link>) -> RequestedType {
    let mut requested = RequestedType::default();
    let Some(link) = link else {
        return requested;
    };

    for target in link.targets_with_rel("type") {
        match InteractionModel::from_iri(target.as_str()) {
            Some(model) => requested.model = Some(model),
            None => requested.user_types.push(target.as_str().to_owned()),
        }
    }
    requested
}

/// Resolve the effective interaction model of incoming content:
/// an explicit assertion wins; otherwise a non-rdf content type
/// makes a non-rdf source; rdf source is the default.
pub(crate) fn effective_model(
    requested: &RequestedType,
    content_type: Option<&Mime>,
    fallback: Option<InteractionModel>,
) -> InteractionModel {
    if let Some(model) = requested.model {
        return model;
    }
    if let Some(fallback) = fallback {
        return fallback;
    }
    match content_type.and_then(RdfSyntax::from_media_type) {
        Some(_) => InteractionModel::RdfSource,
        None if content_type.is_some() => InteractionModel::NonRdfSource,
        None => InteractionModel::RdfSource,
    }
}

/// Parse an rdf body against the resource's external url. A
/// malformed body is a client error, not a collaborator failure.
pub(crate) async fn read_rdf_body(
    collaborators: &Collaborators,
    stream: ByteStream,
    external_url: &str,
    content_type: Option<&Mime>,
) -> Result<Vec<Triple>, LdpError> {
    let syntax = match content_type {
        None => RdfSyntax::Turtle,
        Some(mime) => match RdfSyntax::from_media_type(mime) {
            Some(syntax) if syntax.is_readable() => syntax,
            _ => return Err(LdpError::UnsupportedMediaType),
        },
    };

    collaborators
        .io
        .read(stream, external_url, syntax)
        .await
        .map_err(|e| LdpError::BadRequest(format!("unparseable rdf body: {}", e)))
}

/// Stream binary content into the store under a freshly minted id,
/// verifying the request `Digest` against the stored bytes.
pub(crate) async fn write_binary_content(
    collaborators: &Collaborators,
    identifier: &TrellisIdentifier,
    stream: ByteStream,
    content_type: Option<&Mime>,
    digest: Option<&Digest>,
) -> Result<String, LdpError> {
    let partition = identifier.partition();

    if let Some(digest) = digest {
        if !collaborators
            .binaries
            .supported_algorithms()
            .contains(&digest.algorithm)
        {
            return Err(LdpError::BadRequest(format!(
                "unsupported digest algorithm: {}",
                digest.algorithm
            )));
        }
    }

    let internal_id = collaborators.binaries.generate_identifier(partition);
    collaborators
        .binaries
        .set_content(
            partition,
            &internal_id,
            stream,
            BinaryMetadata {
                mime_type: content_type.cloned(),
            },
        )
        .await?;

    // Verify against the bytes as stored, with the same algorithm.
    if let Some(digest) = digest {
        let stored = collaborators
            .binaries
            .get_content(partition, &internal_id)
            .await?
            .ok_or_else(|| LdpError::BadRequest("stored content unavailable".into()))?;
        let computed = collaborators
            .binaries
            .digest(digest.algorithm, stored)
            .await?;
        if computed != digest.value {
            return Err(LdpError::BadRequest("digest mismatch".into()));
        }
    }

    Ok(internal_id)
}

/// Carry the graphs of an existing snapshot that given write does
/// not touch into the replacement dataset. Persistence replaces
/// the whole head snapshot, so a writer that drops this loses
/// every graph it did not rewrite. The server managed graph is
/// rebuilt by the dataset assemblers and the audit graph belongs
/// to the version history, so neither is carried here.
pub(crate) fn carry_untouched_graphs(
    dataset: &mut Dataset,
    existing: &Resource,
    written: &[GraphName],
) {
    for untouched in GraphName::ALL {
        if !written.contains(untouched)
            && !matches!(*untouched, GraphName::ServerManaged | GraphName::Audit)
        {
            dataset.extend(
                existing
                    .stream(&[*untouched])
                    .filter(|q| q.g().is_some()),
            );
        }
    }
}

/// The dataset of an rdf resource: the user managed graph, any
/// user type assertions, and the server managed model assertion.
pub(crate) fn rdf_dataset(
    collaborators: &Collaborators,
    identifier: &TrellisIdentifier,
    model: InteractionModel,
    triples: Vec<Triple>,
    user_types: &[String],
    base_url: &str,
    graph: GraphName,
) -> Dataset {
    let subject = term::iri(identifier.internal_iri());
    let type_term = term::iri(ns::rdf::type_.to_string());

    let mut dataset: Dataset = triples
        .into_iter()
        .map(|triple| {
            let internal = triple
                .map(|t| collaborators.resources.to_internal(t, base_url))
                .map(|t| collaborators.resources.skolemize(t));
            in_graph(internal, graph)
        })
        .collect();

    for user_type in user_types {
        dataset.push(in_graph(
            [subject.clone(), type_term.clone(), term::iri(user_type.clone())],
            GraphName::UserManaged,
        ));
    }

    dataset.push(in_graph(
        [subject, type_term, term::iri(model.iri())],
        GraphName::ServerManaged,
    ));

    dataset
}

/// The dataset of a non-rdf resource: the server managed
/// descriptor of its content.
pub(crate) fn binary_dataset(
    identifier: &TrellisIdentifier,
    internal_id: &str,
    content_type: Option<&Mime>,
) -> Dataset {
    let subject = term::iri(identifier.internal_iri());
    let content = term::iri(internal_id.to_owned());
    let mime_text = content_type
        .cloned()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
        .to_string();

    vec![
        in_graph(
            [
                subject.clone(),
                term::iri(ns::rdf::type_.to_string()),
                term::iri(InteractionModel::NonRdfSource.iri()),
            ],
            GraphName::ServerManaged,
        ),
        in_graph(
            [
                subject,
                term::iri(ns::dcterms::hasPart.to_string()),
                content.clone(),
            ],
            GraphName::ServerManaged,
        ),
        in_graph(
            [
                content,
                term::iri(ns::dcterms::format.to_string()),
                term::literal_str(mime_text),
            ],
            GraphName::ServerManaged,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use claims::assert_some_eq;
    use headers::Header;
    use rstest::rstest;

    use super::*;

    fn link(value_str: &str) -> Link {
        let header_value = http::HeaderValue::from_str(value_str).unwrap();
        Link::decode(&mut std::iter::once(&header_value)).unwrap()
    }

    #[test]
    fn ldp_type_links_set_the_model() {
        let requested = requested_type(Some(&link(
            "<http://www.w3.org/ns/ldp#BasicContainer>; rel=\"type\"",
        )));
        assert_some_eq!(requested.model, InteractionModel::BasicContainer);
        assert!(requested.user_types.is_empty());
    }

    #[test]
    fn unknown_type_links_become_user_types() {
        let requested = requested_type(Some(&link(
            "<http://example.org/CustomType>; rel=\"type\"",
        )));
        assert_eq!(requested.model, None);
        assert_eq!(requested.user_types, vec!["http://example.org/CustomType"]);
    }

    #[rstest]
    #[case(None, InteractionModel::RdfSource)]
    #[case(Some(mime::TEXT_PLAIN), InteractionModel::NonRdfSource)]
    fn content_type_infers_the_model(
        #[case] content_type: Option<Mime>,
        #[case] expected: InteractionModel,
    ) {
        assert_eq!(
            effective_model(&RequestedType::default(), content_type.as_ref(), None),
            expected
        );
    }

    #[test]
    fn turtle_content_stays_an_rdf_source() {
        let turtle: Mime = "text/turtle".parse().unwrap();
        assert_eq!(
            effective_model(&RequestedType::default(), Some(&turtle), None),
            InteractionModel::RdfSource
        );
    }
}
