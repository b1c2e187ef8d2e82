//! I define the [`ConstraintService`] interface, the shape and
//! cardinality checker collaborator.
//!

use async_trait::async_trait;

use crate::model::{InteractionModel, Triple};

/// A constraint violation found in a graph.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Iri of the violated constraint, linkable with
    /// `ldp:constrainedBy`.
    pub constraint: String,

    /// The offending triples.
    pub triples: Vec<Triple>,
}

/// The shape and cardinality checker. A graph about to be
/// persisted passes through this check; a violation aborts the
/// mutation.
#[async_trait]
pub trait ConstraintService: Send + Sync {
    /// Check given user managed graph against the constraints of
    /// given interaction model.
    async fn constrained_by(
        &self,
        interaction_model: InteractionModel,
        base_url: &str,
        graph: &[Triple],
    ) -> Option<Violation>;
}
