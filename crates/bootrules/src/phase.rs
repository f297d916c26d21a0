//! Lifecycle phases a rule can be bound to

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named stage in a node's provisioning lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Local staging before any remote work
    Compile,
    /// Package and agent installation on the node
    Bootstrap,
    /// Configuration artifact delivery
    Configure,
}

impl Phase {
    /// All phases in lifecycle order.
    pub const ALL: [Phase; 3] = [Phase::Compile, Phase::Bootstrap, Phase::Configure];

    /// Lowercase name of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Bootstrap => "bootstrap",
            Self::Configure => "configure",
        }
    }

    /// Parse a phase name, accepting both `bootstrap` and `:bootstrap`.
    pub fn parse(s: &str) -> Result<Self> {
        let name = s.trim();
        match name.strip_prefix(':').unwrap_or(name) {
            "compile" => Ok(Self::Compile),
            "bootstrap" => Ok(Self::Bootstrap),
            "configure" => Ok(Self::Configure),
            _ => Err(Error::InvalidPhase {
                phase: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_phases() {
        assert_eq!(Phase::parse("compile").unwrap(), Phase::Compile);
        assert_eq!(Phase::parse(":bootstrap").unwrap(), Phase::Bootstrap);
        assert_eq!("configure".parse::<Phase>().unwrap(), Phase::Configure);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = Phase::parse(":deploy").unwrap_err();
        assert!(matches!(err, Error::InvalidPhase { ref phase } if phase == ":deploy"));
        assert!(Phase::parse("").is_err());
        assert!(Phase::parse("Compile").is_err());
    }

    #[test]
    fn test_display_roundtrips() {
        for phase in Phase::ALL {
            assert_eq!(Phase::parse(&phase.to_string()).unwrap(), phase);
        }
    }
}
