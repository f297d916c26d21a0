//! Remote endpoint: who to connect as, where, and with which key
//!
//! The host name and the rendered option string are cached per endpoint.
//! Renaming the host drops both caches together.

use crate::error::{Error, Result};
use crate::options::SshOptions;
use std::path::{Path, PathBuf};

/// Source of the names a node is known by.
///
/// Cloud providers implement this to expose the node's DNS name and, where
/// available, its public address.
pub trait HostIdentity: Send {
    /// Fully qualified name used to reach the node
    fn dns_name(&self) -> Result<String>;

    /// Public address, if the provider exposes one
    fn public_ip(&self) -> Option<String> {
        None
    }
}

/// Identity with a fixed, already known host name.
#[derive(Debug, Clone)]
pub struct StaticHost {
    name: String,
    public_ip: Option<String>,
}

impl StaticHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_ip: None,
        }
    }

    pub fn with_public_ip(mut self, ip: impl Into<String>) -> Self {
        self.public_ip = Some(ip.into());
        self
    }
}

impl HostIdentity for StaticHost {
    fn dns_name(&self) -> Result<String> {
        if self.name.trim().is_empty() {
            return Err(Error::Resolve("empty host name".to_string()));
        }
        Ok(self.name.clone())
    }

    fn public_ip(&self) -> Option<String> {
        self.public_ip.clone()
    }
}

/// Connection target for one node.
pub struct RemoteEndpoint {
    identity: Box<dyn HostIdentity>,
    user: String,
    key_path: PathBuf,
    host: Option<String>,
    options: Option<String>,
}

impl RemoteEndpoint {
    pub fn new(
        identity: impl HostIdentity + 'static,
        user: impl Into<String>,
        key_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identity: Box::new(identity),
            user: user.into(),
            key_path: key_path.into(),
            host: None,
            options: None,
        }
    }

    /// Connecting user
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Identity key passed with `-i`
    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Host to connect to; resolved once and then reused.
    pub fn resolve_host(&mut self) -> Result<String> {
        if let Some(host) = &self.host {
            return Ok(host.clone());
        }
        let host = self.identity.dns_name()?;
        log::debug!("resolved host {host}");
        self.host = Some(host.clone());
        Ok(host)
    }

    /// Resolved host without its domain part.
    pub fn short_hostname(&mut self) -> Result<String> {
        let host = self.resolve_host()?;
        Ok(host.split('.').next().unwrap_or(&host).to_string())
    }

    /// Public address from the identity source
    pub fn public_ip(&self) -> Option<String> {
        self.identity.public_ip()
    }

    /// Point the endpoint at a different host name.
    pub fn set_host(&mut self, host: impl Into<String>) {
        self.options = None;
        self.host = Some(host.into());
    }

    /// Forget the resolved host and the cached option string.
    pub fn invalidate(&mut self) {
        self.host = None;
        self.options = None;
    }

    /// Rendered `ssh` options: defaults with `overrides` merged over them.
    ///
    /// Only the override-free rendering is cached.
    pub fn options(&mut self, overrides: &SshOptions) -> String {
        if overrides.is_empty()
            && let Some(cached) = &self.options
        {
            return cached.clone();
        }

        let mut options = SshOptions::defaults(&self.key_path);
        options.merge(overrides);
        let rendered = options.render();
        if overrides.is_empty() {
            self.options = Some(rendered.clone());
        }
        rendered
    }

    /// Whether a resolved host is currently cached.
    pub fn has_cached_host(&self) -> bool {
        self.host.is_some()
    }

    /// Whether an option string is currently cached.
    pub fn has_cached_options(&self) -> bool {
        self.options.is_some()
    }
}
