//! Error types for provisioning.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while provisioning a node.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport precondition or local execution failure
    #[error(transparent)]
    Transport(#[from] remotekit::Error),

    /// Hook registration or execution failure
    #[error(transparent)]
    Rules(#[from] bootrules::Error),

    /// Local staging directory could not be recreated
    #[error("failed to stage {path}")]
    Staging {
        /// Directory being staged
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Whether the node could not be reached before work was dispatched.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_unavailable())
    }
}

/// Result type for provisioning operations.
pub type Result<T> = std::result::Result<T, Error>;
