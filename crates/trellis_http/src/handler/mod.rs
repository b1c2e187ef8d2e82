//! I define the method handlers of the protocol core, along with
//! the response assembly snippets they share.
//!

use std::time::{Duration, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use headers::{HeaderMap, HeaderMapExt, LastModified};
use http::HeaderValue;
use ldp_typed_headers::link::{Link, LinkValue};
use trellis_api::{
    identifier::TrellisIdentifier,
    model::Session,
    service::AccessMode,
};

use crate::{error::LdpError, etag::EntityTag, Collaborators};

mod delete;
mod get;
pub(crate) mod mutation;
mod options;
mod patch;
mod post;
mod put;

pub use delete::*;
pub use get::*;
pub use options::*;
pub use patch::*;
pub use post::*;
pub use put::*;

/// The `Vary` value of rdf representations.
pub(crate) const VARY_RDF: &str = "Accept-Datetime, Prefer";

/// The `Vary` value of binary representations.
pub(crate) const VARY_BINARY: &str = "Accept-Datetime, Prefer, Range, Want-Digest";

pub(crate) fn insert_vary(headers: &mut HeaderMap, value: &'static str) {
    headers.insert(http::header::VARY, HeaderValue::from_static(value));
}

pub(crate) fn insert_cache_control(headers: &mut HeaderMap, max_age: u32) {
    headers.typed_insert(
        headers::CacheControl::new().with_max_age(Duration::from_secs(max_age.into())),
    );
}

pub(crate) fn insert_etag(headers: &mut HeaderMap, etag: &EntityTag) {
    headers.insert(
        http::header::ETAG,
        etag.to_string()
            .parse()
            .expect("entity tag is always a valid HeaderValue"),
    );
}

pub(crate) fn insert_last_modified(headers: &mut HeaderMap, instant: DateTime<Utc>) {
    headers.typed_insert(LastModified::from(
        UNIX_EPOCH + Duration::from_secs(instant.timestamp().max(0) as u64),
    ));
}

pub(crate) fn insert_links(headers: &mut HeaderMap, values: Vec<LinkValue>) {
    if !values.is_empty() {
        headers.typed_insert(Link { values });
    }
}

/// The access control surface is visible only to sessions holding
/// the `Control` mode on the resource.
pub(crate) async fn require_control(
    collaborators: &Collaborators,
    identifier: &TrellisIdentifier,
    session: &Session,
) -> Result<(), LdpError> {
    let modes = collaborators.access.access_modes(identifier, session).await?;
    if modes.contains(&AccessMode::Control) {
        Ok(())
    } else {
        Err(LdpError::NotFound)
    }
}
