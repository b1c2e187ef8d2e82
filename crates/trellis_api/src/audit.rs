//! I define the audit record builder. Every mutation appends the
//! record this module produces; going through one builder keeps
//! the quad count invariant across handlers.
//!

use chrono::{DateTime, SecondsFormat, Utc};
use trellis_vocab::{activitystreams, ns, prov, term};

use crate::{
    identifier::TrellisIdentifier,
    model::{in_graph, GraphName, Quad, Session},
};

/// The kind of activity an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditActivity {
    /// A resource was created.
    Creation,

    /// A resource was updated.
    Update,

    /// A resource was deleted.
    Deletion,
}

impl AuditActivity {
    /// Iri of the activity type.
    pub fn iri(&self) -> &'static str {
        match self {
            Self::Creation => activitystreams::Create,
            Self::Update => activitystreams::Update,
            Self::Deletion => activitystreams::Delete,
        }
    }
}

/// Count of quads every audit record carries.
pub const AUDIT_QUAD_COUNT: usize = 5;

/// Build the audit record for one mutation: exactly five quads in
/// the audit graph, describing the activity type, the agent, the
/// delegating agent when present (the agent itself otherwise), the
/// instant, and the target.
pub fn audit_quads(
    target: &TrellisIdentifier,
    activity: AuditActivity,
    session: &Session,
    instant: DateTime<Utc>,
) -> Vec<Quad> {
    let event = term::bnode(format!("audit-{}", instant.timestamp_millis()));
    let target_term = term::iri(target.internal_iri());
    let type_term = term::iri(ns::rdf::type_.to_string());

    let on_behalf_of = session.delegated_by.as_deref().unwrap_or(&session.agent);

    vec![
        in_graph(
            [
                target_term,
                term::iri(prov::wasGeneratedBy),
                event.clone(),
            ],
            GraphName::Audit,
        ),
        in_graph(
            [event.clone(), type_term, term::iri(activity.iri())],
            GraphName::Audit,
        ),
        in_graph(
            [
                event.clone(),
                term::iri(prov::wasAssociatedWith),
                term::iri(session.agent.clone()),
            ],
            GraphName::Audit,
        ),
        in_graph(
            [
                event.clone(),
                term::iri(prov::actedOnBehalfOf),
                term::iri(on_behalf_of.to_owned()),
            ],
            GraphName::Audit,
        ),
        in_graph(
            [
                event,
                term::iri(prov::atTime),
                term::literal_dt(
                    instant.to_rfc3339_opts(SecondsFormat::Secs, true),
                    &ns::xsd::dateTime.to_string(),
                ),
            ],
            GraphName::Audit,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sophia_api::quad::Quad as _;

    use super::*;

    #[test]
    fn record_always_has_five_quads_in_the_audit_graph() {
        let target = TrellisIdentifier::new("repo1", "resource");
        let instant = Utc.timestamp_opt(1496277129, 0).unwrap();

        let session = Session::new("https://example.org/agent#me", instant);
        let quads = audit_quads(&target, AuditActivity::Creation, &session, instant);
        assert_eq!(quads.len(), AUDIT_QUAD_COUNT);

        let delegated = Session {
            delegated_by: Some("https://example.org/boss#me".to_owned()),
            ..session
        };
        let quads = audit_quads(&target, AuditActivity::Deletion, &delegated, instant);
        assert_eq!(quads.len(), AUDIT_QUAD_COUNT);

        for quad in &quads {
            assert!(term::is_iri(
                quad.g().expect("audit quads are always named"),
                GraphName::Audit.iri()
            ));
        }
    }
}
