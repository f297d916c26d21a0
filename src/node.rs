//! Concrete ssh-backed node and local cloud context.

use crate::config::{ConnectionConfig, FleetConfig};
use provision::{CloudContext, GemSpec, Node};
use remotekit::{RemoteEndpoint, RemoteTransport, SshTransport, StaticHost};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// A host reached with the local `ssh` client.
pub struct SshNode {
    id: String,
    transport: SshTransport,
    extra_gems: Vec<GemSpec>,
}

impl SshNode {
    /// Node for `host` using the configured user, key and probe.
    pub fn connect(host: &str, connection: &ConnectionConfig) -> Self {
        let endpoint = RemoteEndpoint::new(
            StaticHost::new(host),
            connection.user.clone(),
            connection.key_path(),
        );
        let transport = SshTransport::new(endpoint).with_reachability(connection.probe.clone());
        Self {
            id: short_name(host).to_string(),
            transport,
            extra_gems: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_extra_gems(mut self, gems: Vec<GemSpec>) -> Self {
        self.extra_gems = gems;
        self
    }

    /// The underlying transport, for host maintenance.
    pub fn ssh(&mut self) -> &mut SshTransport {
        &mut self.transport
    }
}

impl Node for SshNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn transport(&mut self) -> &mut dyn RemoteTransport {
        &mut self.transport
    }

    fn extra_gems(&self) -> Vec<GemSpec> {
        self.extra_gems.clone()
    }
}

/// Host name up to the first dot; addresses are kept whole.
fn short_name(host: &str) -> &str {
    if host.parse::<IpAddr>().is_ok() {
        return host;
    }
    host.split('.').next().unwrap_or(host)
}

/// Cloud context for hosts addressed directly, with no provider API.
pub struct StaticCloud {
    tmp_path: PathBuf,
}

impl StaticCloud {
    pub fn from_config(config: &FleetConfig) -> Self {
        Self {
            tmp_path: config.tmp_path(),
        }
    }
}

impl CloudContext for StaticCloud {
    fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    fn provider(&self) -> &str {
        "ssh"
    }
}
