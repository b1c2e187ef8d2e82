//! I define the agent [`Session`] a request is processed under.
//!

use chrono::{DateTime, Utc};
use trellis_vocab::trellis;

/// An authenticated agent session. Produced by the authenticator
/// collaborator and consumed by audit records and access control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Iri of the agent.
    pub agent: String,

    /// Iri of the agent this session's agent is delegated by, if
    /// any.
    pub delegated_by: Option<String>,

    /// Instant the session was created.
    pub created: DateTime<Utc>,
}

impl Session {
    /// Create a session for given agent.
    pub fn new(agent: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            agent: agent.into(),
            delegated_by: None,
            created,
        }
    }

    /// Create an anonymous session.
    pub fn anonymous(created: DateTime<Utc>) -> Self {
        Self::new(trellis::AnonymousAgent, created)
    }
}
