//! I define the [`IOService`] interface, the rdf parser and
//! serializer collaborator, along with the concrete syntaxes the
//! protocol core can name.
//!

use async_trait::async_trait;
use mime::Mime;
use once_cell::sync::Lazy;

use super::{ByteStream, ServiceError};
use crate::model::{Quad, Triple};

/// application/ld+json
pub static APPLICATION_JSON_LD: Lazy<Mime> = Lazy::new(|| "application/ld+json".parse().unwrap());

/// application/n-triples
pub static APPLICATION_N_TRIPLES: Lazy<Mime> =
    Lazy::new(|| "application/n-triples".parse().unwrap());

/// application/sparql-update
pub static APPLICATION_SPARQL_UPDATE: Lazy<Mime> =
    Lazy::new(|| "application/sparql-update".parse().unwrap());

/// text/turtle
pub static TEXT_TURTLE: Lazy<Mime> = Lazy::new(|| "text/turtle".parse().unwrap());

/// A concrete rdf syntax the server can produce or accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RdfSyntax {
    /// RDF 1.1 Turtle, the default.
    Turtle,

    /// RDF 1.1 N-Triples.
    NTriples,

    /// JSON-LD 1.1.
    JsonLd,

    /// Html rendering. Produced only, never accepted.
    Html,
}

impl RdfSyntax {
    /// All syntaxes, in server preference order.
    pub const ALL: &'static [Self] = &[Self::Turtle, Self::NTriples, Self::JsonLd, Self::Html];

    /// Media type of the syntax.
    pub fn media_type(&self) -> Mime {
        match self {
            Self::Turtle => TEXT_TURTLE.clone(),
            Self::NTriples => APPLICATION_N_TRIPLES.clone(),
            Self::JsonLd => APPLICATION_JSON_LD.clone(),
            Self::Html => mime::TEXT_HTML,
        }
    }

    /// Resolve a syntax from a media type, ignoring parameters.
    pub fn from_media_type(media_type: &Mime) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| {
            let essence = s.media_type();
            essence.type_() == media_type.type_() && essence.subtype() == media_type.subtype()
                && essence.suffix() == media_type.suffix()
        })
    }

    /// If request bodies in this syntax can be parsed.
    pub fn is_readable(&self) -> bool {
        !matches!(self, Self::Html)
    }
}

/// A json-ld serialization profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonLdProfile {
    /// The compacted document form.
    Compacted,

    /// The expanded document form.
    Expanded,
}

impl JsonLdProfile {
    /// Iri of the profile.
    pub fn iri(&self) -> &'static str {
        match self {
            Self::Compacted => "http://www.w3.org/ns/json-ld#compacted",
            Self::Expanded => "http://www.w3.org/ns/json-ld#expanded",
        }
    }

    /// Resolve a profile from its iri.
    pub fn from_iri(iri: &str) -> Option<Self> {
        [Self::Compacted, Self::Expanded]
            .into_iter()
            .find(|p| p.iri() == iri)
    }
}

/// The rdf parser and serializer collaborator.
#[async_trait]
pub trait IOService: Send + Sync {
    /// Parse a body stream into triples, resolving relative iris
    /// against given base url.
    async fn read(
        &self,
        stream: ByteStream,
        base_url: &str,
        syntax: RdfSyntax,
    ) -> Result<Vec<Triple>, ServiceError>;

    /// Serialize a quad stream into given syntax, as a byte
    /// stream.
    async fn write(
        &self,
        quads: Box<dyn Iterator<Item = Quad> + Send>,
        syntax: RdfSyntax,
        profile: Option<JsonLdProfile>,
    ) -> Result<ByteStream, ServiceError>;

    /// Apply a sparql-update operation to given graph and return
    /// the resulting graph.
    async fn update(
        &self,
        graph: Vec<Triple>,
        sparql: &str,
        base_url: &str,
    ) -> Result<Vec<Triple>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use claims::{assert_none, assert_some_eq};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("text/turtle", Some(RdfSyntax::Turtle))]
    #[case("text/turtle; charset=utf-8", Some(RdfSyntax::Turtle))]
    #[case("application/ld+json", Some(RdfSyntax::JsonLd))]
    #[case("application/octet-stream", None)]
    fn syntaxes_resolve_from_media_types(
        #[case] media_type_str: &str,
        #[case] expected: Option<RdfSyntax>,
    ) {
        let media_type: Mime = media_type_str.parse().unwrap();
        assert_eq!(RdfSyntax::from_media_type(&media_type), expected);
    }

    #[test]
    fn profiles_resolve_from_iris() {
        assert_some_eq!(
            JsonLdProfile::from_iri("http://www.w3.org/ns/json-ld#compacted"),
            JsonLdProfile::Compacted
        );
        assert_none!(JsonLdProfile::from_iri("http://www.w3.org/ns/json-ld#flattened"));
    }
}
