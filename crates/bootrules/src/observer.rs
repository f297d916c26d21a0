//! Run observer traits
//!
//! These let the registry report progress without depending on a
//! particular UI or logging setup.

use crate::phase::Phase;

/// Progress callback for phase execution.
pub trait RunObserver {
    /// Called before the first rule of a phase runs.
    fn on_phase_start(&mut self, phase: Phase, node_id: &str, rule_count: usize);

    /// Called before a single rule runs.
    fn on_rule_start(&mut self, phase: Phase, name: &str, priority: u8);

    /// Called after a rule's action returned successfully.
    fn on_rule_complete(&mut self, phase: Phase, name: &str);

    /// Called after every rule of the phase has run.
    fn on_phase_complete(&mut self, phase: Phase, node_id: &str);
}

/// No-op observer
pub struct NoObserver;

impl RunObserver for NoObserver {
    fn on_phase_start(&mut self, _phase: Phase, _node_id: &str, _rule_count: usize) {}
    fn on_rule_start(&mut self, _phase: Phase, _name: &str, _priority: u8) {}
    fn on_rule_complete(&mut self, _phase: Phase, _name: &str) {}
    fn on_phase_complete(&mut self, _phase: Phase, _node_id: &str) {}
}

/// Observer that reports through the `log` facade.
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn on_phase_start(&mut self, phase: Phase, node_id: &str, rule_count: usize) {
        log::info!("----> Bootstraps (:{phase}) for node: {node_id} ({rule_count} rules)");
    }

    fn on_rule_start(&mut self, phase: Phase, name: &str, priority: u8) {
        log::debug!(":{phase} rule {name} (priority {priority})");
    }

    fn on_rule_complete(&mut self, phase: Phase, name: &str) {
        log::debug!(":{phase} rule {name} done");
    }

    fn on_phase_complete(&mut self, phase: Phase, node_id: &str) {
        log::debug!(":{phase} complete for node: {node_id}");
    }
}
