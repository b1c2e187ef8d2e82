//! I define the [`AccessControlService`] and [`AgentService`]
//! interfaces.
//!

use std::collections::HashSet;

use async_trait::async_trait;

use super::ServiceError;
use crate::{identifier::TrellisIdentifier, model::Session};

/// A web access control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// `acl:Read`.
    Read,

    /// `acl:Write`.
    Write,

    /// `acl:Append`.
    Append,

    /// `acl:Control`.
    Control,
}

/// The authorization decision collaborator.
#[async_trait]
pub trait AccessControlService: Send + Sync {
    /// Resolve the access modes given session holds on given
    /// resource.
    async fn access_modes(
        &self,
        identifier: &TrellisIdentifier,
        session: &Session,
    ) -> Result<HashSet<AccessMode>, ServiceError>;
}

/// The agent mapping collaborator.
pub trait AgentService: Send + Sync {
    /// Map an authenticated user id to an agent iri.
    fn as_agent(&self, user_id: &str) -> String;
}
