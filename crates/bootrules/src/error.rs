//! Error types for rule registration and execution.
//!
//! Registration problems are reported eagerly as configuration errors.
//! Failures raised by a rule's action are wrapped with the phase and rule
//! name so the caller can tell which hook aborted the phase.

use crate::phase::Phase;
use thiserror::Error;

/// Categories of rule errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid phase, priority or missing action at registration
    Configuration,
    /// A registered action failed while its phase was running
    Action,
}

/// Errors that can occur while registering or running rules.
#[derive(Debug, Error)]
pub enum Error {
    /// Phase is not one of the recognized lifecycle phases
    #[error("invalid phase {phase:?}: must be one of :compile, :bootstrap, :configure")]
    InvalidPhase {
        /// The phase string that was rejected
        phase: String,
    },

    /// Priority is outside `0..=100`
    #[error("priority {priority} for rule {name:?} must be in range 0..=100")]
    PriorityOutOfRange {
        /// Name of the rule being registered
        name: String,
        /// The rejected priority
        priority: i64,
    },

    /// Rule was registered without an action
    #[error("rule {name:?} has no action; provide a block to run")]
    MissingAction {
        /// Name of the rule being registered
        name: String,
    },

    /// A rule's action returned an error
    #[error("rule {name:?} failed during :{phase}")]
    RuleFailed {
        /// Phase that was running
        phase: Phase,
        /// Name of the failing rule
        name: String,
        /// Error returned by the action
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidPhase { .. }
            | Error::PriorityOutOfRange { .. }
            | Error::MissingAction { .. } => ErrorCategory::Configuration,
            Error::RuleFailed { .. } => ErrorCategory::Action,
        }
    }

    /// Whether this is a registration-time configuration error.
    pub fn is_configuration(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }
}

/// Result type for rule operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_category() {
        let err = Error::InvalidPhase {
            phase: ":deploy".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.is_configuration());

        let err = Error::MissingAction { name: "x".into() };
        assert!(err.is_configuration());
    }

    #[test]
    fn test_rule_failed_keeps_source() {
        let err = Error::RuleFailed {
            phase: Phase::Bootstrap,
            name: "install".into(),
            source: anyhow::anyhow!("disk full"),
        };
        assert_eq!(err.category(), ErrorCategory::Action);
        assert_eq!(err.to_string(), "rule \"install\" failed during :bootstrap");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk full"));
    }
}
