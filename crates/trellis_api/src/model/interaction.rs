//! I define [`InteractionModel`] of ldp resources.
//!

use std::fmt::{Debug, Display};

use sophia_api::ns::NsTerm;
use trellis_vocab::ns;

/// The ldp interaction model of a resource. It determines which
/// http methods and body shapes are valid for the resource.
///
/// Containers are sub kinds of rdf sources, which are sub kinds of
/// resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionModel {
    /// `ldp:Resource`.
    Resource,

    /// `ldp:RDFSource`.
    RdfSource,

    /// `ldp:NonRDFSource`.
    NonRdfSource,

    /// `ldp:Container`.
    Container,

    /// `ldp:BasicContainer`.
    BasicContainer,

    /// `ldp:DirectContainer`.
    DirectContainer,

    /// `ldp:IndirectContainer`.
    IndirectContainer,
}

impl InteractionModel {
    /// All interaction models.
    pub const ALL: &'static [Self] = &[
        Self::Resource,
        Self::RdfSource,
        Self::NonRdfSource,
        Self::Container,
        Self::BasicContainer,
        Self::DirectContainer,
        Self::IndirectContainer,
    ];

    /// The ldp term asserting this model.
    pub fn term(&self) -> NsTerm<'static> {
        match self {
            Self::Resource => ns::ldp::Resource,
            Self::RdfSource => ns::ldp::RDFSource,
            Self::NonRdfSource => ns::ldp::NonRDFSource,
            Self::Container => ns::ldp::Container,
            Self::BasicContainer => ns::ldp::BasicContainer,
            Self::DirectContainer => ns::ldp::DirectContainer,
            Self::IndirectContainer => ns::ldp::IndirectContainer,
        }
    }

    /// Iri of the ldp term asserting this model.
    pub fn iri(&self) -> String {
        self.term().to_string()
    }

    /// Resolve a model from an ldp type iri.
    pub fn from_iri(iri: &str) -> Option<Self> {
        Self::ALL.iter().find(|m| m.iri() == iri).copied()
    }

    /// If this model is a container kind.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Container | Self::BasicContainer | Self::DirectContainer | Self::IndirectContainer
        )
    }

    /// If this model is an rdf source kind.
    #[inline]
    pub fn is_rdf_source(&self) -> bool {
        matches!(self, Self::RdfSource) || self.is_container()
    }

    /// The model's ancestor chain, starting at `ldp:Resource` and
    /// ending at the model itself.
    pub fn ancestors(&self) -> Vec<Self> {
        match self {
            Self::Resource => vec![Self::Resource],
            Self::RdfSource => vec![Self::Resource, Self::RdfSource],
            Self::NonRdfSource => vec![Self::Resource, Self::NonRdfSource],
            Self::Container => vec![Self::Resource, Self::RdfSource, Self::Container],
            Self::BasicContainer | Self::DirectContainer | Self::IndirectContainer => vec![
                Self::Resource,
                Self::RdfSource,
                Self::Container,
                *self,
            ],
        }
    }

    /// If a resource carrying this model may be replaced by one
    /// carrying `requested`. Replacements may not cross the
    /// container / non-container or rdf / non-rdf boundaries; the
    /// bare `ldp:Resource` model (a tombstone) accepts any
    /// replacement.
    pub fn accepts_replacement_by(&self, requested: Self) -> bool {
        if matches!(self, Self::Resource) {
            return true;
        }
        self.is_container() == requested.is_container()
            && self.is_rdf_source() == requested.is_rdf_source()
    }
}

impl Display for InteractionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}
