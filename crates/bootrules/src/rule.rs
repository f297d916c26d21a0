//! Bootstrap rules and their registration specs
//!
//! A [`Rule`] is immutable once built. [`RuleSpec`] collects the pieces and
//! validates all of them in [`RuleSpec::build`], so an invalid rule can never
//! reach a registry.

use crate::error::{Error, Result};
use crate::phase::Phase;
use std::cmp::Ordering;
use std::fmt;

/// Priority used when a spec does not set one.
pub const DEFAULT_PRIORITY: u8 = 50;

/// Highest accepted priority. Lower priorities run first.
pub const MAX_PRIORITY: u8 = 100;

/// Deferred action run against a node when the rule's phase runs.
pub type Action<N> = Box<dyn Fn(&mut N) -> anyhow::Result<()> + Send + Sync>;

/// The framework component that created a rule.
///
/// Rules without an owner are user-defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owner(String);

impl Owner {
    /// Create an owner label, e.g. the name of the provisioner that registers it.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Owner label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builder for a rule registration.
pub struct RuleSpec<N: ?Sized> {
    phase: String,
    priority: Option<i64>,
    name: String,
    owner: Option<Owner>,
    action: Option<Action<N>>,
}

impl<N: ?Sized> RuleSpec<N> {
    /// Start a spec for `name` in `phase` (`"bootstrap"` or `":bootstrap"`).
    pub fn new(phase: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            priority: None,
            name: name.into(),
            owner: None,
            action: None,
        }
    }

    /// Start a spec from an already-typed phase.
    pub fn for_phase(phase: Phase, name: impl Into<String>) -> Self {
        Self::new(phase.as_str(), name)
    }

    /// Set the priority; defaults to [`DEFAULT_PRIORITY`].
    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Attribute the rule to a framework component.
    pub fn owner(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Set the action run for each node.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut N) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    /// Set an already boxed action.
    pub fn boxed_action(mut self, action: Action<N>) -> Self {
        self.action = Some(action);
        self
    }

    /// Validate every field and produce an immutable rule.
    pub fn build(self) -> Result<Rule<N>> {
        let action = self.action.ok_or_else(|| Error::MissingAction {
            name: self.name.clone(),
        })?;
        let phase = Phase::parse(&self.phase)?;
        let priority = check_priority(&self.name, self.priority)?;

        Ok(Rule {
            phase,
            priority,
            name: self.name,
            owner: self.owner,
            action,
        })
    }
}

fn check_priority(name: &str, priority: Option<i64>) -> Result<u8> {
    let Some(priority) = priority else {
        return Ok(DEFAULT_PRIORITY);
    };
    u8::try_from(priority)
        .ok()
        .filter(|p| *p <= MAX_PRIORITY)
        .ok_or_else(|| Error::PriorityOutOfRange {
            name: name.to_string(),
            priority,
        })
}

/// A registered, ordered action bound to a phase.
pub struct Rule<N: ?Sized> {
    phase: Phase,
    priority: u8,
    name: String,
    owner: Option<Owner>,
    action: Action<N>,
}

impl<N: ?Sized> Rule<N> {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    /// Rules without an owner are user-defined.
    pub fn is_user_defined(&self) -> bool {
        self.owner.is_none()
    }

    /// Run the action against a node.
    pub fn run(&self, node: &mut N) -> anyhow::Result<()> {
        (self.action)(node)
    }

    /// Total order within a phase.
    pub fn order(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }

    fn sort_key(&self) -> (u8, u8, &str) {
        (self.priority, u8::from(self.is_user_defined()), &self.name)
    }
}

impl<N: ?Sized> fmt::Debug for Rule<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("phase", &self.phase)
            .field("priority", &self.priority)
            .field("name", &self.name)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
