//! I define the [`ResourceService`] interface, the exclusive owner
//! of persisted resource state.
//!

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::ServiceError;
use crate::{
    identifier::TrellisIdentifier,
    model::{Dataset, Resource, Term},
};

/// The resource metadata store. Snapshots it returns are immutable;
/// writes replace the head snapshot and append to the version
/// history.
#[async_trait]
pub trait ResourceService: Send + Sync {
    /// Get the head snapshot of the resource with given identifier.
    async fn get(&self, identifier: &TrellisIdentifier) -> Result<Option<Resource>, ServiceError>;

    /// Get the memento snapshot of the resource covering given
    /// instant.
    async fn get_at(
        &self,
        identifier: &TrellisIdentifier,
        instant: DateTime<Utc>,
    ) -> Result<Option<Resource>, ServiceError>;

    /// Persist a new head snapshot composed of given dataset.
    async fn put(
        &self,
        identifier: &TrellisIdentifier,
        dataset: Dataset,
    ) -> Result<(), ServiceError>;

    /// Generate a fresh resource path segment.
    fn generate_identifier(&self) -> String;

    /// Replace blank nodes with fresh skolem iris so they survive
    /// round tripping through storage.
    fn skolemize(&self, term: Term) -> Term;

    /// Map skolem iris back to blank nodes.
    fn unskolemize(&self, term: Term) -> Term;

    /// Map an in scope external url term to its internal iri term.
    /// Out of scope terms pass through unchanged.
    fn to_internal(&self, term: Term, base_url: &str) -> Term;

    /// Map an internal iri term to its external url term. Out of
    /// scope terms pass through unchanged.
    fn to_external(&self, term: Term, base_url: &str) -> Term;
}
