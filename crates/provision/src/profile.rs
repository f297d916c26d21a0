//! Immutable bootstrap profile
//!
//! Everything the provisioner installs and checks for comes from here. A
//! profile is built once (usually from the config file) and handed to the
//! provisioner by value.

use serde::{Deserialize, Serialize};

/// A gem to install, optionally pinned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemSpec {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl GemSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    pub fn pinned(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
        }
    }
}

/// Which agent binary drives configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// `chef-solo`, no server
    #[default]
    Solo,
    /// `chef-client` against a server
    Client,
}

impl AgentMode {
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Solo => "chef-solo",
            Self::Client => "chef-client",
        }
    }
}

/// Runtime parameters for starting the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub mode: AgentMode,
    /// Node attributes file (`-j`)
    pub json_attribs: String,
    /// Agent config file (`-c`)
    pub config_file: String,
    /// Seconds between runs (`-i`)
    pub interval_secs: u32,
    /// Random splay in seconds (`-s`)
    pub splay_secs: u32,
    /// Process environment variable that switches on `-l debug`
    pub debug_env: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            mode: AgentMode::default(),
            json_attribs: "/etc/chef/dna.json".to_string(),
            config_file: "/etc/chef/client.rb".to_string(),
            interval_secs: 1800,
            splay_secs: 20,
            debug_env: "CHEF_DEBUG".to_string(),
        }
    }
}

/// Packages, gems, binaries and directories that make up a bootstrapped node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapProfile {
    /// OS packages always installed
    pub packages: Vec<String>,
    /// Packages providing rubygems when `rubygems_package` is set
    pub rubygems_packages: Vec<String>,
    /// Use the distro rubygems package instead of installing from source
    pub rubygems_package: bool,
    /// One-time rubygems install sequence, used when `rubygems_package` is off
    pub rubygems_bootstrap: Vec<String>,
    /// Gems installed on every node
    pub gems: Vec<GemSpec>,
    /// Gem source registered before installing gems
    pub gem_source: String,
    /// Binaries the probe expects on `PATH`
    pub bins: Vec<String>,
    /// Directories created at install and checked by the probe
    pub dirs: Vec<String>,
    /// Silence probe output and command echo
    pub quiet: bool,
    pub agent: AgentSettings,
}

impl Default for BootstrapProfile {
    fn default() -> Self {
        Self {
            packages: strings(&[
                "ruby",
                "ruby1.8-dev",
                "libopenssl-ruby1.8",
                "rdoc",
                "ri",
                "irb",
                "build-essential",
                "wget",
                "ssl-cert",
                "libxml-ruby",
                "zlib1g-dev",
                "libxml2-dev",
            ]),
            rubygems_packages: strings(&["rubygems"]),
            rubygems_package: true,
            rubygems_bootstrap: strings(&[
                "cd /tmp",
                "if [ -f rubygems-1.3.6.tgz ]; then rm -rf rubygems-1.3.6*; fi",
                "wget http://production.cf.rubygems.org/rubygems/rubygems-1.3.6.tgz",
                "tar xzvf rubygems-1.3.6.tgz",
                "cd rubygems-1.3.6",
                "ruby setup.rb",
                "cd /usr/bin",
                "ln -s gem1.8 gem",
            ]),
            gems: vec![GemSpec::new("chef")],
            gem_source: "http://gems.opscode.com".to_string(),
            bins: strings(&["gem", "chef-solo", "chef-client"]),
            dirs: strings(&["/var/log/chef", "/var/cache/chef", "/var/run/chef"]),
            quiet: true,
            agent: AgentSettings::default(),
        }
    }
}

impl BootstrapProfile {
    /// Packages to install and check: base packages, plus the rubygems
    /// package when it is used.
    pub fn bootstrap_packages(&self) -> Vec<String> {
        let mut packages = self.packages.clone();
        if self.rubygems_package {
            packages.extend(self.rubygems_packages.iter().cloned());
        }
        packages
    }

    /// The rubygems source install as one `&&`-joined command, when needed.
    pub fn rubygems_bootstrap_command(&self) -> Option<String> {
        if self.rubygems_package || self.rubygems_bootstrap.is_empty() {
            return None;
        }
        Some(self.rubygems_bootstrap.join("&&"))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}
