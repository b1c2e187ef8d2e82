//! I define the collaborator service interfaces consumed by the
//! protocol core. Implementations exclusively own the state they
//! serve; the core holds only transient references during a single
//! request.
//!

mod access;
mod binary;
mod constraint;
mod io;
mod resource;

pub use access::*;
pub use binary::*;
pub use constraint::*;
pub use io::*;
pub use resource::*;

/// Error raised by a collaborator service. The protocol core maps
/// these to `500 Internal Server Error` unless a handler states
/// otherwise.
#[derive(Debug, thiserror::Error)]
#[error("Collaborator operation failed: {message}")]
pub struct ServiceError {
    /// Description of the failure.
    pub message: String,
}

impl ServiceError {
    /// Create a new error with given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}
