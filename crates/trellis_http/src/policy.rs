//! I define the method policy: which methods a target state
//! allows, and the `Allow`, `Accept-Post`, `Accept-Patch` headers
//! derived from it.
//!

use headers::{Allow, HeaderMap, HeaderMapExt};
use http::Method;
use ldp_typed_headers::accept_method::{AcceptPatch, AcceptPost};
use trellis_api::{
    model::InteractionModel,
    service::{RdfSyntax, APPLICATION_SPARQL_UPDATE},
};

use crate::request::Ext;

/// Resolve the methods allowed for a resource state.
///
/// The base table depends on the interaction model; a memento view
/// and the extension surfaces override it.
pub fn allowed_methods(
    interaction_model: InteractionModel,
    is_memento_view: bool,
    ext: Ext,
) -> Vec<Method> {
    if is_memento_view || ext == Ext::Timemap {
        return vec![Method::GET, Method::HEAD, Method::OPTIONS];
    }

    if ext == Ext::Acl {
        return vec![Method::GET, Method::HEAD, Method::OPTIONS, Method::PATCH];
    }

    let mut methods = vec![
        Method::GET,
        Method::HEAD,
        Method::OPTIONS,
        Method::PUT,
        Method::DELETE,
    ];
    if interaction_model.is_rdf_source() || interaction_model == InteractionModel::Resource {
        methods.push(Method::PATCH);
    }
    if interaction_model.is_container() {
        methods.push(Method::POST);
    }
    methods
}

/// Media types accepted on POST, advertised in `Accept-Post`.
pub fn accept_post_types() -> AcceptPost {
    AcceptPost::new(
        RdfSyntax::ALL
            .iter()
            .filter(|s| s.is_readable())
            .map(|s| s.media_type())
            .collect(),
    )
}

/// Set `Allow` and the `Accept-<Method>` headers for given
/// allowed method set.
pub fn apply_allow_headers(headers: &mut HeaderMap, methods: &[Method]) {
    if methods.contains(&Method::POST) {
        headers.typed_insert(accept_post_types());
    }

    if methods.contains(&Method::PATCH) {
        headers.typed_insert(AcceptPatch::new(vec![APPLICATION_SPARQL_UPDATE.clone()]));
    }

    headers.typed_insert(Allow::from_iter(methods.iter().cloned()));
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(InteractionModel::RdfSource, &[Method::GET, Method::HEAD, Method::OPTIONS, Method::PUT, Method::DELETE, Method::PATCH])]
    #[case(InteractionModel::BasicContainer, &[Method::GET, Method::HEAD, Method::OPTIONS, Method::PUT, Method::DELETE, Method::PATCH, Method::POST])]
    #[case(InteractionModel::NonRdfSource, &[Method::GET, Method::HEAD, Method::OPTIONS, Method::PUT, Method::DELETE])]
    fn base_table_follows_interaction_model(
        #[case] interaction_model: InteractionModel,
        #[case] expected: &[Method],
    ) {
        assert_eq!(allowed_methods(interaction_model, false, Ext::None), expected);
    }

    #[test]
    fn memento_views_are_read_only() {
        assert_eq!(
            allowed_methods(InteractionModel::Container, true, Ext::None),
            &[Method::GET, Method::HEAD, Method::OPTIONS]
        );
        assert_eq!(
            allowed_methods(InteractionModel::RdfSource, false, Ext::Timemap),
            &[Method::GET, Method::HEAD, Method::OPTIONS]
        );
    }

    #[test]
    fn acl_surface_drops_mutating_methods_except_patch() {
        assert_eq!(
            allowed_methods(InteractionModel::BasicContainer, false, Ext::Acl),
            &[Method::GET, Method::HEAD, Method::OPTIONS, Method::PATCH]
        );
    }

    #[test]
    fn allow_header_is_derived_from_the_method_set() {
        let mut headers = HeaderMap::new();
        apply_allow_headers(
            &mut headers,
            &allowed_methods(InteractionModel::BasicContainer, false, Ext::None),
        );

        let allow = headers.get(http::header::ALLOW).unwrap().to_str().unwrap().to_owned();
        assert!(allow.contains("POST"));
        assert!(allow.contains("PATCH"));

        assert!(headers.contains_key("accept-post"));
        assert_eq!(
            headers.get("accept-patch").unwrap(),
            "application/sparql-update"
        );

        let mut headers = HeaderMap::new();
        apply_allow_headers(
            &mut headers,
            &allowed_methods(InteractionModel::NonRdfSource, false, Ext::None),
        );
        assert!(!headers.contains_key("accept-post"));
        assert!(!headers.contains_key("accept-patch"));
    }
}
