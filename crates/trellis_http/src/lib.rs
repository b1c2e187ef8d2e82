//! This crate provides the ldp/memento http protocol core of the
//! trellis repository server: method handlers that turn a parsed
//! repository request into a fully populated response, along with
//! content negotiation, conditional request evaluation, link
//! assembly, the multipart upload controller and the cors
//! middleware.
//!
//! The outer router and the storage collaborators are out of
//! scope; see [`trellis_api`] for the interfaces the core
//! consumes.
//!
#![warn(missing_docs)]
#![deny(unused_qualifications)]

use std::sync::Arc;

use trellis_api::service::{
    AccessControlService, AgentService, BinaryService, ConstraintService, IOService,
    ResourceService,
};

pub mod body;
pub mod config;
pub mod conneg;
pub mod cors;
pub mod error;
pub mod etag;
pub mod handler;
pub mod link;
pub mod multipart;
pub mod policy;
pub mod preconditions;
pub mod request;
pub mod service;
pub mod stream_util;
pub mod timemap;

/// The collaborator services the protocol core consults. Shared
/// read-only references, injected at startup.
#[derive(Clone)]
pub struct Collaborators {
    /// The resource metadata store.
    pub resources: Arc<dyn ResourceService>,

    /// The opaque byte store.
    pub binaries: Arc<dyn BinaryService>,

    /// The rdf parser and serializer.
    pub io: Arc<dyn IOService>,

    /// The shape and cardinality checker.
    pub constraints: Arc<dyn ConstraintService>,

    /// The authorization decision service.
    pub access: Arc<dyn AccessControlService>,

    /// The agent mapping service.
    pub agents: Arc<dyn AgentService>,
}
