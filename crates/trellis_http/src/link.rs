//! I define the link assembler: the ldp type links, memento
//! navigation links, binary description links and service links a
//! response carries.
//!

use ldp_typed_headers::{datetime::fmt_imf_fixdate, link::LinkValue};
use trellis_api::model::{InteractionModel, Resource};
use trellis_vocab::{oa, trellis};

use crate::{conneg::APPLICATION_LINK_FORMAT, request::Ext, timemap};

/// One type link per interaction model ancestor, plus one per
/// additional type assertion. Only responses carrying an entity
/// representation emit these.
pub fn type_links(interaction_model: InteractionModel, extra_types: &[String]) -> Vec<LinkValue> {
    interaction_model
        .ancestors()
        .iter()
        .map(|model| {
            LinkValue::try_new_basic(model.iri(), "type").expect("Must be a valid link value.")
        })
        .chain(extra_types.iter().filter_map(|iri| {
            if InteractionModel::from_iri(iri).is_some() {
                None
            } else {
                LinkValue::try_new_basic(iri, "type").ok()
            }
        }))
        .collect()
}

/// Links of a binary's content representation: its description,
/// and the bare url as canonical.
pub fn binary_content_links(external_url: &str) -> Vec<LinkValue> {
    vec![
        LinkValue::try_new_basic(format!("{}#description", external_url), "describedby")
            .expect("Must be a valid link value."),
        LinkValue::try_new_basic(external_url, "canonical").expect("Must be a valid link value."),
    ]
}

/// Links of a binary's description representation: the described
/// content, and the description fragment as canonical.
pub fn binary_description_links(external_url: &str) -> Vec<LinkValue> {
    vec![
        LinkValue::try_new_basic(external_url, "describes").expect("Must be a valid link value."),
        LinkValue::try_new_basic(format!("{}#description", external_url), "canonical")
            .expect("Must be a valid link value."),
    ]
}

/// The memento navigation link set of a versioned resource: one
/// `original` and one `timegate` on the bare url, one `timemap`
/// with its covered interval, and one `memento` per version range
/// with its `datetime` param.
pub fn memento_links(resource: &Resource, external_url: &str) -> Vec<LinkValue> {
    if resource.mementos.is_empty() {
        return Vec::new();
    }

    let mut links = vec![
        LinkValue::try_new_basic(external_url, "original").expect("Must be a valid link value."),
        LinkValue::try_new_basic(external_url, "timegate").expect("Must be a valid link value."),
    ];

    let first = &resource.mementos[0];
    let last = &resource.mementos[resource.mementos.len() - 1];
    links.push(
        LinkValue::try_new_basic(timemap::timemap_url(external_url), "timemap")
            .expect("Must be a valid link value.")
            .with_param("from", fmt_imf_fixdate(first.from))
            .with_param("until", fmt_imf_fixdate(last.until))
            .with_param("type", APPLICATION_LINK_FORMAT.to_string()),
    );

    for range in &resource.mementos {
        links.push(
            LinkValue::try_new_basic(timemap::version_url(external_url, range.from), "memento")
                .expect("Must be a valid link value.")
                .with_param("datetime", fmt_imf_fixdate(range.until)),
        );
    }

    links
}

/// The service links of a resource: notification inbox and
/// annotation service.
pub fn service_links(resource: &Resource) -> Vec<LinkValue> {
    let mut links = Vec::new();
    if let Some(inbox) = &resource.inbox {
        if let Ok(link) = LinkValue::try_new_basic(inbox, "inbox") {
            links.push(link);
        }
    }
    if let Some(annotation_service) = &resource.annotation_service {
        if let Ok(link) = LinkValue::try_new_basic(annotation_service, oa::annotationService) {
            links.push(link);
        }
    }
    links
}

/// The multipart upload service link, advertised only on
/// containers and non-rdf sources, on their bare surface.
pub fn multipart_upload_link(
    resource: &Resource,
    external_url: &str,
    ext: Ext,
    store_supports_multipart: bool,
) -> Option<LinkValue> {
    if !store_supports_multipart || ext != Ext::None {
        return None;
    }
    let advertised = resource.interaction_model.is_container()
        || resource.interaction_model == InteractionModel::NonRdfSource;
    if !advertised {
        return None;
    }
    Some(
        LinkValue::try_new_basic(
            format!("{}?ext=upload", external_url),
            trellis::multipartUploadService,
        )
        .expect("Must be a valid link value."),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use trellis_api::{
        identifier::TrellisIdentifier,
        model::{GraphName, Quad, QuadStreamer, VersionRange},
    };

    use super::*;

    struct NoQuads;

    impl QuadStreamer for NoQuads {
        fn stream(&self, _graphs: &[GraphName]) -> Box<dyn Iterator<Item = Quad> + Send> {
            Box::new(std::iter::empty())
        }
    }

    const URL: &str = "http://example.org/repo1/resource";

    fn versioned_resource(ranges: Vec<VersionRange>) -> Resource {
        Resource {
            identifier: TrellisIdentifier::new("repo1", "resource"),
            interaction_model: InteractionModel::RdfSource,
            modified: Utc.timestamp_opt(1496277129, 0).unwrap(),
            binary: None,
            is_memento: false,
            mementos: ranges,
            inbox: None,
            annotation_service: None,
            types: vec![],
            has_acl: false,
            quads: Arc::new(NoQuads),
        }
    }

    fn rels<'l>(links: &'l [LinkValue], rel: &'l str) -> Vec<&'l LinkValue> {
        links.iter().filter(|l| l.has_rel(rel)).collect()
    }

    #[test]
    fn type_chain_always_contains_ldp_resource() {
        for model in InteractionModel::ALL {
            let links = type_links(*model, &[]);
            assert!(links
                .iter()
                .any(|l| l.target.as_str() == "http://www.w3.org/ns/ldp#Resource"));
        }
    }

    #[test]
    fn extra_types_skip_ldp_models() {
        let links = type_links(
            InteractionModel::RdfSource,
            &[
                "http://example.org/Custom".to_owned(),
                "http://www.w3.org/ns/ldp#Container".to_owned(),
            ],
        );
        assert_eq!(links.len(), 3);
        assert!(links
            .iter()
            .any(|l| l.target.as_str() == "http://example.org/Custom"));
    }

    #[test]
    fn memento_link_set_is_complete() {
        let ranges = vec![
            VersionRange {
                from: Utc.timestamp_opt(1496261729, 0).unwrap(),
                until: Utc.timestamp_opt(1496262729, 0).unwrap(),
            },
            VersionRange {
                from: Utc.timestamp_opt(1496262729, 0).unwrap(),
                until: Utc.timestamp_opt(1496277129, 0).unwrap(),
            },
        ];
        let links = memento_links(&versioned_resource(ranges), URL);

        assert_eq!(rels(&links, "original").len(), 1);
        assert_eq!(rels(&links, "timegate").len(), 1);

        let timemaps = rels(&links, "timemap");
        assert_eq!(timemaps.len(), 1);
        assert_eq!(timemaps[0].param("type"), Some("application/link-format"));
        assert_eq!(
            timemaps[0].target.as_str(),
            "http://example.org/repo1/resource?ext=timemap"
        );

        let mementos = rels(&links, "memento");
        assert_eq!(mementos.len(), 2);
        assert_eq!(
            mementos[0].target.as_str(),
            "http://example.org/repo1/resource?version=1496261729000"
        );
        assert_eq!(
            mementos[0].param("datetime"),
            Some("Wed, 31 May 2017 20:32:09 GMT")
        );
    }

    #[test]
    fn non_versioned_resources_have_no_memento_links() {
        assert!(memento_links(&versioned_resource(vec![]), URL).is_empty());
    }

    #[test]
    fn upload_link_is_gated_by_model_and_store() {
        let mut resource = versioned_resource(vec![]);
        assert!(multipart_upload_link(&resource, URL, Ext::None, true).is_none());

        resource.interaction_model = InteractionModel::BasicContainer;
        assert!(multipart_upload_link(&resource, URL, Ext::None, false).is_none());
        assert!(multipart_upload_link(&resource, URL, Ext::Acl, true).is_none());

        let link = multipart_upload_link(&resource, URL, Ext::None, true).unwrap();
        assert_eq!(
            link.target.as_str(),
            "http://example.org/repo1/resource?ext=upload"
        );
    }
}
