//! This crate provides typed http headers for the LDP and
//! Memento protocol surface, in the [`headers::Header`] idiom.
//!
#![warn(missing_docs)]
#![cfg_attr(doc_cfg, feature(doc_cfg))]
#![deny(unused_qualifications)]

pub mod common;

#[cfg(feature = "accept")]
pub mod accept;

#[cfg(feature = "accept-method")]
pub mod accept_method;

#[cfg(feature = "datetime")]
pub mod datetime;

#[cfg(feature = "digest")]
pub mod digest;

#[cfg(feature = "link")]
pub mod link;

#[cfg(feature = "prefer")]
pub mod prefer;

#[cfg(feature = "range")]
pub mod range;

#[cfg(feature = "slug")]
pub mod slug;
