//! This crate provides vocabulary terms used by the trellis
//! repository server, along with term construction helpers.
//!
//! Terms of the ldp, rdf, dcterms and xsd vocabularies are
//! re-exported from [`rdf_vocabularies`] under [`ns`].
//!
#![warn(missing_docs)]
#![deny(unused_qualifications)]

pub use rdf_vocabularies::ns;

pub mod term;

/// Terms of the trellis vocabulary.
#[allow(non_upper_case_globals)]
pub mod trellis {
    /// Namespace iri of the trellis vocabulary.
    pub const NS: &str = "http://www.trellisldp.org/ns/trellis#";

    /// Marker type of a resource that has been deleted.
    pub const DeletedResource: &str = "http://www.trellisldp.org/ns/trellis#DeletedResource";

    /// Graph preference iri for the user managed graph.
    pub const PreferUserManaged: &str = "http://www.trellisldp.org/ns/trellis#PreferUserManaged";

    /// Graph preference iri for the server managed graph.
    pub const PreferServerManaged: &str =
        "http://www.trellisldp.org/ns/trellis#PreferServerManaged";

    /// Graph preference iri for the access control graph.
    pub const PreferAccessControl: &str =
        "http://www.trellisldp.org/ns/trellis#PreferAccessControl";

    /// Graph preference iri for the audit graph.
    pub const PreferAudit: &str = "http://www.trellisldp.org/ns/trellis#PreferAudit";

    /// Constraint iri for a malformed range of a property.
    pub const InvalidRange: &str = "http://www.trellisldp.org/ns/trellis#InvalidRange";

    /// Constraint iri for an invalid cardinality of a property.
    pub const InvalidCardinality: &str =
        "http://www.trellisldp.org/ns/trellis#InvalidCardinality";

    /// Constraint iri for an invalid rdf type assertion.
    pub const InvalidType: &str = "http://www.trellisldp.org/ns/trellis#InvalidType";

    /// Constraint iri for a property a resource must not carry.
    pub const InvalidProperty: &str = "http://www.trellisldp.org/ns/trellis#InvalidProperty";

    /// Link relation of the multipart upload service.
    pub const multipartUploadService: &str =
        "http://www.trellisldp.org/ns/trellis#multipartUploadService";

    /// Agent iri of the repository administrator.
    pub const AdministratorAgent: &str =
        "http://www.trellisldp.org/ns/trellis#AdministratorAgent";

    /// Agent iri of unauthenticated sessions.
    pub const AnonymousAgent: &str = "http://www.trellisldp.org/ns/trellis#AnonymousAgent";
}

/// Terms of the w3c prov-o vocabulary used in audit records.
#[allow(non_upper_case_globals)]
pub mod prov {
    /// Namespace iri of the prov vocabulary.
    pub const NS: &str = "http://www.w3.org/ns/prov#";

    /// Class of activities.
    pub const Activity: &str = "http://www.w3.org/ns/prov#Activity";

    /// Relates an activity to its responsible agent.
    pub const wasAssociatedWith: &str = "http://www.w3.org/ns/prov#wasAssociatedWith";

    /// Relates an agent to the agent it acted on behalf of.
    pub const actedOnBehalfOf: &str = "http://www.w3.org/ns/prov#actedOnBehalfOf";

    /// Relates an activity to its instant.
    pub const atTime: &str = "http://www.w3.org/ns/prov#atTime";

    /// Relates an entity to the activity that produced it.
    pub const wasGeneratedBy: &str = "http://www.w3.org/ns/prov#wasGeneratedBy";
}

/// Terms of the activity streams vocabulary used in audit records.
#[allow(non_upper_case_globals)]
pub mod activitystreams {
    /// Namespace iri of the activity streams vocabulary.
    pub const NS: &str = "https://www.w3.org/ns/activitystreams#";

    /// A create activity.
    pub const Create: &str = "https://www.w3.org/ns/activitystreams#Create";

    /// An update activity.
    pub const Update: &str = "https://www.w3.org/ns/activitystreams#Update";

    /// A delete activity.
    pub const Delete: &str = "https://www.w3.org/ns/activitystreams#Delete";
}

/// Terms of the memento vocabulary.
#[allow(non_upper_case_globals)]
pub mod memento {
    /// Namespace iri of the memento vocabulary.
    pub const NS: &str = "http://mementoweb.org/ns#";

    /// Class of time maps.
    pub const TimeMap: &str = "http://mementoweb.org/ns#TimeMap";

    /// Class of mementos.
    pub const Memento: &str = "http://mementoweb.org/ns#Memento";

    /// Relates a memento to the instant it captures.
    pub const mementoDatetime: &str = "http://mementoweb.org/ns#mementoDatetime";

    /// Relates a memento to its original resource.
    pub const original: &str = "http://mementoweb.org/ns#original";
}

/// Terms of the w3c web annotation vocabulary.
#[allow(non_upper_case_globals)]
pub mod oa {
    /// Namespace iri of the web annotation vocabulary.
    pub const NS: &str = "http://www.w3.org/ns/oa#";

    /// Link relation of an annotation service.
    pub const annotationService: &str = "http://www.w3.org/ns/oa#annotationService";
}
