//! Rule registry - growth-only storage with ordering computed on read

use crate::error::{Error, Result};
use crate::observer::{NoObserver, RunObserver};
use crate::phase::Phase;
use crate::rule::{Action, Owner, Rule, RuleSpec};
use std::collections::BTreeMap;

/// Rules keyed by phase.
///
/// Rules are stored in registration order and sorted every time they are
/// read. Nothing is ever removed.
pub struct RuleRegistry<N: ?Sized> {
    rules: BTreeMap<Phase, Vec<Rule<N>>>,
}

impl<N: ?Sized> RuleRegistry<N> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Validate and store a rule.
    ///
    /// Returns a reference to the stored rule.
    pub fn register(&mut self, spec: RuleSpec<N>) -> Result<&Rule<N>> {
        let rule = spec.build()?;
        let bucket = self.rules.entry(rule.phase()).or_default();
        bucket.push(rule);
        let stored = bucket.len() - 1;
        Ok(&bucket[stored])
    }

    /// Register a rule owned by a framework component.
    pub fn register_owned(
        &mut self,
        phase: &str,
        priority: Option<i64>,
        name: &str,
        owner: Owner,
        action: Option<Action<N>>,
    ) -> Result<&Rule<N>> {
        let mut spec = RuleSpec::new(phase, name).owner(owner);
        if let Some(priority) = priority {
            spec = spec.priority(priority);
        }
        if let Some(action) = action {
            spec = spec.boxed_action(action);
        }
        self.register(spec)
    }

    /// Register a user-defined rule (no owner).
    pub fn register_user<F>(
        &mut self,
        phase: &str,
        priority: Option<i64>,
        name: &str,
        action: F,
    ) -> Result<&Rule<N>>
    where
        F: Fn(&mut N) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut spec = RuleSpec::new(phase, name).action(action);
        if let Some(priority) = priority {
            spec = spec.priority(priority);
        }
        self.register(spec)
    }

    /// Rules for a phase in execution order.
    pub fn rules_for(&self, phase: Phase) -> Vec<&Rule<N>> {
        let mut ordered: Vec<&Rule<N>> = self
            .rules
            .get(&phase)
            .map(|rules| rules.iter().collect())
            .unwrap_or_default();
        ordered.sort_by(|a, b| a.order(b));
        ordered
    }

    /// Number of rules registered for a phase
    pub fn len(&self, phase: Phase) -> usize {
        self.rules.get(&phase).map_or(0, Vec::len)
    }

    /// Check if no rules are registered in any phase
    pub fn is_empty(&self) -> bool {
        self.rules.values().all(Vec::is_empty)
    }

    /// Run every rule of a phase against a node, in order.
    ///
    /// The first failing action aborts the phase.
    pub fn run(&self, phase: Phase, node: &mut N) -> Result<()> {
        self.run_observed(phase, "node", node, &mut NoObserver)
    }

    /// Like [`run`](Self::run) but accepts the phase by name.
    pub fn run_named(&self, phase: &str, node: &mut N) -> Result<()> {
        self.run(Phase::parse(phase)?, node)
    }

    /// Run a phase while reporting progress to an observer.
    pub fn run_observed<O: RunObserver + ?Sized>(
        &self,
        phase: Phase,
        node_id: &str,
        node: &mut N,
        observer: &mut O,
    ) -> Result<()> {
        let rules = self.rules_for(phase);
        observer.on_phase_start(phase, node_id, rules.len());

        for rule in rules {
            observer.on_rule_start(phase, rule.name(), rule.priority());
            rule.run(node).map_err(|source| Error::RuleFailed {
                phase,
                name: rule.name().to_string(),
                source,
            })?;
            observer.on_rule_complete(phase, rule.name());
        }

        observer.on_phase_complete(phase, node_id);
        Ok(())
    }
}

impl<N: ?Sized> Default for RuleRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}
