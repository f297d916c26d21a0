//! `~/.config/fleetboot/config.toml`
//!
//! ```toml
//! tmp_path = "~/.cache/fleetboot"
//! configure = ["cp /tmp/dna.json /etc/chef/dna.json"]
//!
//! [connection]
//! user = "ubuntu"
//! key_path = "~/.ssh/fleet.pem"
//!
//! [connection.probe]
//! max_attempts = 60
//! interval = 2
//!
//! [bootstrap]
//! packages = ["ruby", "build-essential"]
//! gems = [{ name = "chef", version = "0.8.16" }]
//!
//! [[hooks]]
//! phase = "bootstrap"
//! priority = 20
//! name = "motd"
//! command = "echo managed > /etc/motd"
//! ```

use anyhow::{Context, Result};
use provision::BootstrapProfile;
use remotekit::ProbeConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file name inside [`config_dir`]
pub const CONFIG_FILE: &str = "config.toml";

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("fleetboot"))
}

/// Expand `~` and environment variables in a configured path
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Local staging root for compile
    pub tmp_path: Option<String>,
    pub connection: ConnectionConfig,
    pub bootstrap: BootstrapProfile,
    /// Commands sent to every node during configure
    pub configure: Vec<String>,
    pub hooks: Vec<HookConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub user: String,
    pub key_path: String,
    pub probe: ProbeConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            user: "root".to_string(),
            key_path: "~/.ssh/id_rsa".to_string(),
            probe: ProbeConfig::default(),
        }
    }
}

impl ConnectionConfig {
    pub fn key_path(&self) -> PathBuf {
        expand_path(&self.key_path)
    }
}

/// A remote command run as a phase hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    pub phase: String,
    #[serde(default)]
    pub priority: Option<i64>,
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub sudo: Option<bool>,
}

impl FleetConfig {
    /// Load from `path`, or from the default location.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = config_dir()?.join(CONFIG_FILE);
                if !path.exists() {
                    log::debug!("No config at {}, using defaults", path.display());
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Staging root, defaulting to `<system tmp>/fleetboot`.
    pub fn tmp_path(&self) -> PathBuf {
        self.tmp_path
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(|| std::env::temp_dir().join("fleetboot"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provision::AgentMode;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = FleetConfig::parse("").unwrap();
        assert_eq!(config.connection.user, "root");
        assert_eq!(config.bootstrap, BootstrapProfile::default());
        assert!(config.hooks.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = FleetConfig::parse(
            r#"
tmp_path = "/var/tmp/fleet"

configure = ["touch /etc/chef/dna.json"]

[connection]
user = "ubuntu"
key_path = "/keys/fleet.pem"

[connection.probe]
max_attempts = 5
interval = 1

[bootstrap]
rubygems_package = false
gems = [{ name = "chef", version = "0.8.16" }]
quiet = false

[bootstrap.agent]
mode = "client"
interval_secs = 600

[[hooks]]
phase = ":bootstrap"
priority = 20
name = "motd"
command = "echo managed > /etc/motd"
"#,
        )
        .unwrap();

        assert_eq!(config.tmp_path(), PathBuf::from("/var/tmp/fleet"));
        assert_eq!(config.configure, ["touch /etc/chef/dna.json"]);
        assert_eq!(config.connection.user, "ubuntu");
        assert_eq!(config.connection.key_path(), PathBuf::from("/keys/fleet.pem"));
        assert_eq!(config.connection.probe.max_attempts, 5);
        assert_eq!(config.connection.probe.interval, Duration::from_secs(1));
        assert!(!config.bootstrap.rubygems_package);
        assert_eq!(config.bootstrap.gems[0].version.as_deref(), Some("0.8.16"));
        assert_eq!(config.bootstrap.agent.mode, AgentMode::Client);
        assert_eq!(config.bootstrap.agent.interval_secs, 600);
        assert_eq!(config.bootstrap.agent.splay_secs, 20);
        assert_eq!(config.hooks[0].name, "motd");
        assert_eq!(config.hooks[0].priority, Some(20));
        assert_eq!(config.hooks[0].sudo, None);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fleet.toml");
        fs::write(&path, "[connection]\nuser = \"admin\"\n").unwrap();

        let config = FleetConfig::load(Some(&path)).unwrap();
        assert_eq!(config.connection.user, "admin");
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(FleetConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(FleetConfig::parse("[connection\nuser=").is_err());
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_path("~/keys");
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
