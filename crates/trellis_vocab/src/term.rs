//! I define helpers for constructing owned [`SimpleTerm`] values.
//!

use sophia_api::{
    term::{BnodeId, IriRef, SimpleTerm, Term},
    MownStr,
};

/// Create an owned iri term.
///
/// Panics if `iri` is not a valid iri reference; only call with
/// statically known or already validated iris.
pub fn iri(iri: impl Into<String>) -> SimpleTerm<'static> {
    SimpleTerm::Iri(
        IriRef::new(MownStr::from(iri.into())).expect("Must be a valid iri reference."),
    )
}

/// Create an owned blank node term.
pub fn bnode(id: impl Into<String>) -> SimpleTerm<'static> {
    SimpleTerm::BlankNode(
        BnodeId::new(MownStr::from(id.into())).expect("Must be a valid bnode id."),
    )
}

/// Create an owned xsd:string literal term.
pub fn literal_str(value: impl Into<String>) -> SimpleTerm<'static> {
    SimpleTerm::LiteralDatatype(
        MownStr::from(value.into()),
        IriRef::new(MownStr::from("http://www.w3.org/2001/XMLSchema#string"))
            .expect("Must be a valid iri reference."),
    )
}

/// Create an owned literal term with given datatype iri.
pub fn literal_dt(value: impl Into<String>, datatype: &str) -> SimpleTerm<'static> {
    SimpleTerm::LiteralDatatype(
        MownStr::from(value.into()),
        IriRef::new(MownStr::from(datatype.to_owned()))
            .expect("Must be a valid iri reference."),
    )
}

/// Check if given term is an iri term with given iri.
pub fn is_iri<T: Term>(term: T, iri_str: &str) -> bool {
    term.iri().map(|i| i.as_str() == iri_str).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iri_term_matches_its_iri() {
        let term = iri(crate::trellis::DeletedResource);
        assert!(is_iri(&term, crate::trellis::DeletedResource));
        assert!(!is_iri(&term, crate::trellis::PreferAudit));
    }

    #[test]
    fn literal_term_is_not_an_iri() {
        let term = literal_str("A title");
        assert!(!is_iri(&term, "A title"));
    }
}
