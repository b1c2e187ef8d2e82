//! I define the resource data model observed by the protocol
//! core.
//!

use sophia_api::{quad::Spog, term::SimpleTerm};

mod graph;
mod interaction;
mod resource;
mod session;

pub use graph::*;
pub use interaction::*;
pub use resource::*;
pub use session::*;

/// An owned rdf term.
pub type Term = SimpleTerm<'static>;

/// An owned rdf triple.
pub type Triple = [Term; 3];

/// An owned rdf quad, with an optional named graph component.
pub type Quad = Spog<Term>;

/// An owned rdf dataset, as passed to persistence.
pub type Dataset = Vec<Quad>;

/// Put given triple in given named graph.
pub fn in_graph(triple: Triple, graph: GraphName) -> Quad {
    (triple, Some(graph.term()))
}
