//! Error types for remote transport operations.
//!
//! Only preconditions and local failures are errors. A remote command that
//! exits non-zero is not an error here; see [`crate::runner`].

use thiserror::Error;

/// Errors that can occur before or while dispatching remote work.
#[derive(Debug, Error)]
pub enum Error {
    /// The endpoint did not answer the availability check
    #[error("ssh is not available for {host}; perhaps you need to authorize it?")]
    TransportUnavailable {
        /// Host that was checked
        host: String,
    },

    /// A required option was missing or malformed
    #[error("invalid options: {0}")]
    Validation(String),

    /// The local subprocess could not be started
    #[error("failed to execute: {command}")]
    Spawn {
        /// Command line that failed to start
        command: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The endpoint's host name could not be determined
    #[error("could not resolve host: {0}")]
    Resolve(String),
}

impl Error {
    /// Whether the error is an availability precondition failure.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::TransportUnavailable { .. })
    }

    /// Whether the error is a missing/invalid option.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, Error>;
