//! # provision
//!
//! Bootstrap, configure and run a configuration-management agent (chef) on
//! a node, using a [`remotekit::RemoteTransport`] for remote work and a
//! [`bootrules::RuleRegistry`] for phase hooks.
//!
//! ## Lifecycle
//!
//! ```text
//! Unknown -> Stopped -> { Bootstrapped | NotBootstrapped } -> Configured
//! ```
//!
//! Every transition is an explicit call on [`Provisioner`]:
//!
//! - [`Provisioner::compile`] stages local artifacts, then runs `:compile` hooks
//! - [`Provisioner::bootstrap`] probes with one compound command and only
//!   installs when something is missing (or when forced), then runs
//!   `:bootstrap` hooks
//! - [`Provisioner::configure`] sends configuration commands, then runs
//!   `:configure` hooks
//! - [`Provisioner::run`] stops the agent, configures, and starts it again
//!
//! ## Capability Traits
//!
//! - [`Node`]: transport plus provider-specific extra gems
//! - [`CloudContext`]: temp path and provider name of the owning cloud
//! - [`ArtifactSource`]: commands that deliver generated configuration

pub mod commands;
pub mod error;
pub mod node;
pub mod profile;
pub mod provisioner;
pub mod state;

pub use error::{Error, Result};
pub use node::{ArtifactSource, CloudContext, NoArtifacts, Node};
pub use profile::{AgentMode, AgentSettings, BootstrapProfile, GemSpec};
pub use provisioner::{BootstrapOutcome, Provisioner};
pub use state::NodeState;
