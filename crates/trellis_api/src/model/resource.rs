//! I define the immutable [`Resource`] snapshot observed by the
//! protocol core.
//!

use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, Utc};
use mime::Mime;
use trellis_vocab::trellis;

use super::{GraphName, InteractionModel, Quad};
use crate::identifier::TrellisIdentifier;

/// Descriptor of the opaque content of a non-rdf resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    /// Internal iri addressing the blob in the binary store.
    pub internal_id: String,

    /// Instant of the last content write.
    pub modified: DateTime<Utc>,

    /// Media type of the content.
    pub mime_type: Mime,

    /// Size of the content, in bytes.
    pub size: u64,
}

/// The time range a memento covers, from its creation until it was
/// superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    /// Instant the version was created, inclusive.
    pub from: DateTime<Utc>,

    /// Instant the version was superseded, exclusive.
    pub until: DateTime<Utc>,
}

impl VersionRange {
    /// If this range covers given instant.
    #[inline]
    pub fn covers(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant < self.until
    }
}

/// A lazily evaluated, restartable source of the quads a resource
/// is composed of.
pub trait QuadStreamer: Send + Sync {
    /// Stream the quads of the selected named graphs. Every call
    /// yields a fresh iterator over the same snapshot.
    fn stream(&self, graphs: &[GraphName]) -> Box<dyn Iterator<Item = Quad> + Send>;
}

/// An immutable snapshot of a repository resource.
#[derive(Clone)]
pub struct Resource {
    /// Identifier of the resource.
    pub identifier: TrellisIdentifier,

    /// The ldp interaction model.
    pub interaction_model: InteractionModel,

    /// Instant of the last write, at second precision.
    pub modified: DateTime<Utc>,

    /// Content descriptor. Present exactly when the interaction
    /// model is `ldp:NonRDFSource`.
    pub binary: Option<Binary>,

    /// If this snapshot is an immutable memento.
    pub is_memento: bool,

    /// Time ranges of the historical versions, in order. Empty for
    /// non versioned resources.
    pub mementos: Vec<VersionRange>,

    /// Iri of a linked data notifications inbox, if any.
    pub inbox: Option<String>,

    /// Iri of a web annotation service, if any.
    pub annotation_service: Option<String>,

    /// Additional rdf type iris asserted on the resource.
    pub types: Vec<String>,

    /// If an access control graph is present on the resource.
    pub has_acl: bool,

    /// Source of the resource's quads.
    pub quads: Arc<dyn QuadStreamer>,
}

impl Resource {
    /// Stream the quads of the selected named graphs.
    #[inline]
    pub fn stream(&self, graphs: &[GraphName]) -> Box<dyn Iterator<Item = Quad> + Send> {
        self.quads.stream(graphs)
    }

    /// If the resource is a server produced tombstone. The deleted
    /// marker only takes effect on the bare `ldp:Resource` model;
    /// on any other model it is live user data.
    pub fn is_gone(&self) -> bool {
        self.interaction_model == InteractionModel::Resource
            && self.types.iter().any(|t| t == trellis::DeletedResource)
    }

    /// The memento range covering given instant.
    pub fn memento_at(&self, instant: DateTime<Utc>) -> Option<&VersionRange> {
        self.mementos.iter().find(|r| r.covers(instant))
    }
}

impl Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("identifier", &self.identifier)
            .field("interaction_model", &self.interaction_model)
            .field("modified", &self.modified)
            .field("binary", &self.binary)
            .field("is_memento", &self.is_memento)
            .field("mementos", &self.mementos)
            .field("types", &self.types)
            .field("has_acl", &self.has_acl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    struct NoQuads;

    impl QuadStreamer for NoQuads {
        fn stream(&self, _graphs: &[GraphName]) -> Box<dyn Iterator<Item = Quad> + Send> {
            Box::new(std::iter::empty())
        }
    }

    fn instant(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn resource(interaction_model: InteractionModel, types: Vec<String>) -> Resource {
        Resource {
            identifier: TrellisIdentifier::new("repo1", "resource"),
            interaction_model,
            modified: instant(1496277129),
            binary: None,
            is_memento: false,
            mementos: vec![],
            inbox: None,
            annotation_service: None,
            types,
            has_acl: false,
            quads: Arc::new(NoQuads),
        }
    }

    #[test]
    fn deleted_marker_takes_effect_only_on_bare_resources() {
        let marker = trellis::DeletedResource.to_owned();
        assert!(resource(InteractionModel::Resource, vec![marker.clone()]).is_gone());
        assert!(!resource(InteractionModel::Container, vec![marker]).is_gone());
        assert!(!resource(InteractionModel::Resource, vec![]).is_gone());
    }

    #[test]
    fn memento_ranges_cover_from_inclusive_until_exclusive() {
        let range = VersionRange {
            from: instant(100),
            until: instant(200),
        };
        assert!(range.covers(instant(100)));
        assert!(range.covers(instant(199)));
        assert!(!range.covers(instant(200)));
    }
}
