//! Capability traits the provisioner is composed from
//!
//! The provisioner never inspects a provider directly. It talks to a node
//! through [`Node`], to the owning cloud through [`CloudContext`], and to the
//! configuration generator through [`ArtifactSource`].

use crate::profile::GemSpec;
use remotekit::RemoteTransport;
use std::path::Path;

/// A machine being provisioned.
pub trait Node {
    /// Identifier used in logs and hook reporting
    fn id(&self) -> &str;

    /// Remote command capability for this node
    fn transport(&mut self) -> &mut dyn RemoteTransport;

    /// Provider-specific gems installed on top of the profile's gems
    fn extra_gems(&self) -> Vec<GemSpec> {
        Vec::new()
    }
}

/// The members of the owning cloud that provisioning actually uses.
pub trait CloudContext {
    /// Local directory for compile staging
    fn tmp_path(&self) -> &Path;

    /// Provider name, for logging
    fn provider(&self) -> &str;
}

/// Produces the commands that deliver generated configuration to a node.
pub trait ArtifactSource {
    /// Commands run on `node_id` during configure, in order.
    fn configure_commands(&self, node_id: &str) -> Vec<String>;
}

/// Source that delivers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArtifacts;

impl ArtifactSource for NoArtifacts {
    fn configure_commands(&self, _node_id: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Any `Vec` of commands is a fixed source for every node.
impl ArtifactSource for Vec<String> {
    fn configure_commands(&self, _node_id: &str) -> Vec<String> {
        self.clone()
    }
}
