//! This crate provides the resource data model and the
//! collaborator service interfaces of the trellis repository
//! server. The http protocol core consumes these interfaces; their
//! implementations own all persisted state.
//!
#![warn(missing_docs)]
#![deny(unused_qualifications)]

pub mod audit;
pub mod identifier;
pub mod model;
pub mod service;

#[cfg(feature = "test-utils")]
pub mod test_utils;
