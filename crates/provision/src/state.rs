//! Node lifecycle states

use std::fmt;

/// Where a node is in the provisioning lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeState {
    /// Nothing has been checked yet
    #[default]
    Unknown,
    /// The agent was stopped
    Stopped,
    /// The probe found every required binary, package, gem and directory
    Bootstrapped,
    /// The probe found something missing
    NotBootstrapped,
    /// Configuration was delivered
    Configured,
}

impl NodeState {
    /// Interpret the output of the bootstrap probe.
    ///
    /// Only a final line of exactly `OK` counts as bootstrapped. Trailing
    /// blank lines are skipped.
    pub fn from_probe_output(output: &str) -> Self {
        match output.lines().map(str::trim).rfind(|line| !line.is_empty()) {
            Some("OK") => Self::Bootstrapped,
            _ => Self::NotBootstrapped,
        }
    }

    pub fn is_bootstrapped(&self) -> bool {
        matches!(self, Self::Bootstrapped | Self::Configured)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Stopped => "stopped",
            Self::Bootstrapped => "bootstrapped",
            Self::NotBootstrapped => "not bootstrapped",
            Self::Configured => "configured",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_output_parsing() {
        assert_eq!(NodeState::from_probe_output("OK\n"), NodeState::Bootstrapped);
        assert_eq!(NodeState::from_probe_output("OK\n\n"), NodeState::Bootstrapped);
        assert_eq!(NodeState::from_probe_output("OK\r\n  \n"), NodeState::Bootstrapped);
        assert_eq!(
            NodeState::from_probe_output("noise\nmore noise\nOK"),
            NodeState::Bootstrapped
        );
        assert_eq!(NodeState::from_probe_output("MISSING\n"), NodeState::NotBootstrapped);
        assert_eq!(NodeState::from_probe_output("OK\nMISSING\n"), NodeState::NotBootstrapped);
        assert_eq!(NodeState::from_probe_output(""), NodeState::NotBootstrapped);
    }

    #[test]
    fn test_is_bootstrapped() {
        assert!(NodeState::Bootstrapped.is_bootstrapped());
        assert!(NodeState::Configured.is_bootstrapped());
        assert!(!NodeState::NotBootstrapped.is_bootstrapped());
        assert!(!NodeState::Unknown.is_bootstrapped());
    }
}
