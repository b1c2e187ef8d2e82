//! I define common field rules shared by the typed headers.
//!

pub(crate) mod field;

#[cfg(feature = "qvalue")]
pub mod qvalue;
