//! # bootrules
//!
//! Phase-scoped bootstrap rules with a deterministic execution order.
//!
//! Rules are registered once while a deployment is being assembled and are
//! never removed. Each rule belongs to one [`Phase`], carries a priority in
//! `0..=100` and is either owned by a framework component or user-defined.
//!
//! ## Ordering
//!
//! Within a phase, rules run by:
//! 1. priority, ascending
//! 2. owner-attributed rules before user-defined rules
//! 3. name, ascending
//!
//! ## Example
//!
//! ```
//! use bootrules::{Phase, RuleRegistry, RuleSpec};
//!
//! #[derive(Default)]
//! struct Node {
//!     log: Vec<String>,
//! }
//!
//! let mut registry: RuleRegistry<Node> = RuleRegistry::new();
//! registry
//!     .register(RuleSpec::new("bootstrap", "late").priority(80).action(|n: &mut Node| {
//!         n.log.push("late".into());
//!         Ok(())
//!     }))
//!     .unwrap();
//! registry
//!     .register(RuleSpec::new("bootstrap", "early").priority(20).action(|n: &mut Node| {
//!         n.log.push("early".into());
//!         Ok(())
//!     }))
//!     .unwrap();
//!
//! let mut node = Node::default();
//! registry.run(Phase::Bootstrap, &mut node).unwrap();
//! assert_eq!(node.log, ["early", "late"]);
//! ```
//!
//! ## Observer Traits
//!
//! [`RunObserver`] receives progress while a phase runs, so callers can log
//! or render without this crate depending on a UI.

pub mod error;
pub mod observer;
pub mod phase;
pub mod registry;
pub mod rule;

pub use error::{Error, ErrorCategory, Result};
pub use observer::{LogObserver, NoObserver, RunObserver};
pub use phase::Phase;
pub use registry::RuleRegistry;
pub use rule::{Action, DEFAULT_PRIORITY, MAX_PRIORITY, Owner, Rule, RuleSpec};
