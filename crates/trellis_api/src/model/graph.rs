//! I define [`GraphName`], the named graphs a resource is
//! composed of.
//!

use once_cell::sync::Lazy;
use trellis_vocab::{ns, term, trellis};

use super::Term;

static PREFER_CONTAINMENT: Lazy<String> = Lazy::new(|| ns::ldp::PreferContainment.to_string());
static PREFER_MEMBERSHIP: Lazy<String> = Lazy::new(|| ns::ldp::PreferMembership.to_string());

/// Name of a graph in a resource's dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphName {
    /// The user managed graph.
    UserManaged,

    /// The server managed graph.
    ServerManaged,

    /// The access control graph.
    AccessControl,

    /// The audit graph.
    Audit,

    /// The ldp containment graph.
    Containment,

    /// The ldp membership graph.
    Membership,
}

impl GraphName {
    /// All graph names.
    pub const ALL: &'static [Self] = &[
        Self::UserManaged,
        Self::ServerManaged,
        Self::AccessControl,
        Self::Audit,
        Self::Containment,
        Self::Membership,
    ];

    /// The graph names selected for a representation when no
    /// preference is expressed.
    pub const DEFAULT_REPRESENTATION: &'static [Self] =
        &[Self::UserManaged, Self::Containment, Self::Membership];

    /// Iri naming the graph, also used in `Prefer` include/omit
    /// lists.
    pub fn iri(&self) -> &'static str {
        match self {
            Self::UserManaged => trellis::PreferUserManaged,
            Self::ServerManaged => trellis::PreferServerManaged,
            Self::AccessControl => trellis::PreferAccessControl,
            Self::Audit => trellis::PreferAudit,
            Self::Containment => PREFER_CONTAINMENT.as_str(),
            Self::Membership => PREFER_MEMBERSHIP.as_str(),
        }
    }

    /// Resolve a graph name from its iri.
    pub fn from_iri(iri: &str) -> Option<Self> {
        Self::ALL.iter().find(|g| g.iri() == iri).copied()
    }

    /// The graph name as an rdf term.
    #[inline]
    pub fn term(&self) -> Term {
        term::iri(self.iri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iris_resolve_back_to_names() {
        for name in GraphName::ALL {
            assert_eq!(GraphName::from_iri(name.iri()), Some(*name));
        }
        assert_eq!(GraphName::from_iri("http://example.org/other"), None);
    }

    #[test]
    fn containment_iri_is_in_ldp_namespace() {
        assert_eq!(
            GraphName::Containment.iri(),
            "http://www.w3.org/ns/ldp#PreferContainment"
        );
    }
}
