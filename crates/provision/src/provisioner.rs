//! Agent lifecycle state machine
//!
//! A [`Provisioner`] is built once per cloud from an immutable
//! [`BootstrapProfile`], a [`CloudContext`] and a [`RuleRegistry`] of phase
//! hooks, then driven node by node through explicit calls. It holds no
//! per-node state, so one provisioner can serve any number of nodes.

use crate::commands;
use crate::error::{Error, Result};
use crate::node::{ArtifactSource, CloudContext, NoArtifacts, Node};
use crate::profile::BootstrapProfile;
use crate::state::NodeState;
use bootrules::{LogObserver, Phase, RuleRegistry};
use remotekit::{EchoMode, ExecOptions};
use std::io::ErrorKind;
use std::path::PathBuf;

/// What [`Provisioner::bootstrap`] found and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapOutcome {
    /// State reported by the probe
    pub probed: NodeState,
    /// Whether the install batch was sent
    pub installed: bool,
}

impl BootstrapOutcome {
    /// The probe passed and nothing was installed.
    pub fn was_skipped(&self) -> bool {
        !self.installed
    }
}

/// Bootstrap/configure/run protocol for one cloud.
pub struct Provisioner<C, N: ?Sized> {
    profile: BootstrapProfile,
    cloud: C,
    artifacts: Box<dyn ArtifactSource>,
    rules: RuleRegistry<N>,
}

impl<C: CloudContext, N: Node + ?Sized> Provisioner<C, N> {
    /// Create a provisioner with no artifacts and no hooks.
    pub fn new(profile: BootstrapProfile, cloud: C) -> Self {
        Self {
            profile,
            cloud,
            artifacts: Box::new(NoArtifacts),
            rules: RuleRegistry::new(),
        }
    }

    /// Use `artifacts` to produce configure commands.
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: impl ArtifactSource + 'static) -> Self {
        self.artifacts = Box::new(artifacts);
        self
    }

    /// Replace the hook registry.
    #[must_use]
    pub fn with_rules(mut self, rules: RuleRegistry<N>) -> Self {
        self.rules = rules;
        self
    }

    pub fn profile(&self) -> &BootstrapProfile {
        &self.profile
    }

    pub fn cloud(&self) -> &C {
        &self.cloud
    }

    pub fn rules(&self) -> &RuleRegistry<N> {
        &self.rules
    }

    /// Registry for adding hooks after construction.
    pub fn rules_mut(&mut self) -> &mut RuleRegistry<N> {
        &mut self.rules
    }

    /// Local staging directory, `<tmp_path>/etc/chef`.
    pub fn staging_dir(&self) -> PathBuf {
        self.cloud.tmp_path().join("etc").join("chef")
    }

    /// Recreate the staging directory, then run `:compile` hooks.
    pub fn compile(&self, node: &mut N) -> Result<PathBuf> {
        let dir = self.staging_dir();
        log::debug!("Staging {} for {}", dir.display(), self.cloud.provider());

        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(Error::Staging { path: dir, source }),
        }
        std::fs::create_dir_all(&dir).map_err(|source| Error::Staging {
            path: dir.clone(),
            source,
        })?;

        self.run_phase(Phase::Compile, node)?;
        Ok(dir)
    }

    /// Run the compound presence check on a node.
    pub fn probe(&self, node: &mut N) -> Result<NodeState> {
        let gems = commands::all_gems(&self.profile, &node.extra_gems());
        let cmd = commands::probe_command(&self.profile, &gems);
        let opts = ExecOptions::new().sudo(false).echo(self.echo());

        let output = node.transport().run(&cmd, &opts)?;
        let state = NodeState::from_probe_output(&output);
        log::info!("{} is {state}", node.id());
        Ok(state)
    }

    /// Install the agent unless the probe says it is already there.
    ///
    /// `force` sends the install batch regardless of the probe. `:bootstrap`
    /// hooks run afterwards either way.
    pub fn bootstrap(&self, node: &mut N, force: bool) -> Result<BootstrapOutcome> {
        let probed = self.probe(node)?;
        let skip = probed.is_bootstrapped() && !force;

        if skip {
            log::info!("{} already bootstrapped, skipping install", node.id());
        } else {
            self.install(node)?;
        }

        self.run_phase(Phase::Bootstrap, node)?;
        Ok(BootstrapOutcome {
            probed,
            installed: !skip,
        })
    }

    fn install(&self, node: &mut N) -> Result<()> {
        log::info!("Installing agent on {}", node.id());
        let gems = commands::all_gems(&self.profile, &node.extra_gems());
        let batch = commands::install_commands(&self.profile, &gems);
        let opts = ExecOptions::new().sudo(true).echo(self.echo());
        node.transport().execute(&batch, &opts)?;

        if self.profile.rubygems_package {
            let opts = self.gem_bin_opts().sudo(true);
            node.transport().run(commands::LINK_GEM_BIN, &opts)?;
        }
        Ok(())
    }

    /// Stop the agent, best effort.
    pub fn stop(&self, node: &mut N) -> Result<NodeState> {
        node.transport().run(commands::STOP_AGENT, &ExecOptions::new())?;
        Ok(NodeState::Stopped)
    }

    /// Deliver configuration, then run `:configure` hooks.
    ///
    /// With no configure commands this only runs the hooks. Otherwise the
    /// transport must be available before anything is sent.
    pub fn configure(&self, node: &mut N) -> Result<NodeState> {
        let cmds = self.artifacts.configure_commands(node.id());

        if !cmds.is_empty() {
            let transport = node.transport();
            if !transport.is_available() {
                let host = transport.host().unwrap_or_else(|_| transport.user().to_string());
                return Err(remotekit::Error::TransportUnavailable { host }.into());
            }
            let opts = self.gem_bin_opts().echo(self.echo());
            transport.execute(&cmds, &opts)?;
        }

        self.run_phase(Phase::Configure, node)?;
        Ok(NodeState::Configured)
    }

    /// Stop, configure, and start the agent again.
    ///
    /// Agent debug logging follows the profile's debug environment variable.
    pub fn run(&self, node: &mut N) -> Result<NodeState> {
        let debug = std::env::var_os(&self.profile.agent.debug_env).is_some();
        self.run_with_debug(node, debug)
    }

    /// [`run`](Self::run) with an explicit debug choice.
    pub fn run_with_debug(&self, node: &mut N, debug: bool) -> Result<NodeState> {
        self.stop(node)?;
        let state = self.configure(node)?;

        let cmd = commands::agent_command(&self.profile, debug);
        node.transport().run(&cmd, &self.gem_bin_opts())?;
        Ok(state)
    }

    fn run_phase(&self, phase: Phase, node: &mut N) -> Result<()> {
        let id = node.id().to_string();
        self.rules
            .run_observed(phase, &id, node, &mut LogObserver)
            .map_err(Error::from)
    }

    fn echo(&self) -> EchoMode {
        EchoMode::from_flag(!self.profile.quiet)
    }

    fn gem_bin_opts(&self) -> ExecOptions {
        let (key, value) = commands::gem_bin_env();
        ExecOptions::new().env(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{AgentSettings, GemSpec};
    use remotekit::{CopyOptions, RemoteTransport, SyncOptions};
    use std::collections::VecDeque;
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeTransport {
        available: bool,
        replies: VecDeque<String>,
        batches: Vec<(Vec<String>, ExecOptions)>,
    }

    impl RemoteTransport for FakeTransport {
        fn user(&self) -> &str {
            "ubuntu"
        }

        fn host(&mut self) -> remotekit::Result<String> {
            Ok("web1.example.com".to_string())
        }

        fn is_available(&mut self) -> bool {
            self.available
        }

        fn execute(
            &mut self,
            commands: &[String],
            opts: &ExecOptions,
        ) -> remotekit::Result<String> {
            if !self.available {
                return Err(remotekit::Error::TransportUnavailable {
                    host: "web1.example.com".to_string(),
                });
            }
            self.batches.push((commands.to_vec(), opts.clone()));
            Ok(self.replies.pop_front().unwrap_or_default())
        }

        fn sync_push(&mut self, _opts: &SyncOptions) -> remotekit::Result<String> {
            Ok(String::new())
        }

        fn copy_single(&mut self, _opts: &CopyOptions) -> remotekit::Result<String> {
            Ok(String::new())
        }
    }

    struct FakeNode {
        transport: FakeTransport,
        extra: Vec<GemSpec>,
        hooks: Vec<String>,
    }

    impl FakeNode {
        fn replying(replies: &[&str]) -> Self {
            Self {
                transport: FakeTransport {
                    available: true,
                    replies: replies.iter().map(ToString::to_string).collect(),
                    batches: Vec::new(),
                },
                extra: Vec::new(),
                hooks: Vec::new(),
            }
        }

        fn sent(&self) -> Vec<&str> {
            self.transport
                .batches
                .iter()
                .flat_map(|(cmds, _)| cmds.iter().map(String::as_str))
                .collect()
        }
    }

    impl Node for FakeNode {
        fn id(&self) -> &str {
            "web1"
        }

        fn transport(&mut self) -> &mut dyn RemoteTransport {
            &mut self.transport
        }

        fn extra_gems(&self) -> Vec<GemSpec> {
            self.extra.clone()
        }
    }

    struct TestCloud {
        dir: TempDir,
    }

    impl CloudContext for TestCloud {
        fn tmp_path(&self) -> &Path {
            self.dir.path()
        }

        fn provider(&self) -> &str {
            "test"
        }
    }

    fn provisioner() -> Provisioner<TestCloud, FakeNode> {
        let cloud = TestCloud {
            dir: TempDir::new().unwrap(),
        };
        Provisioner::new(BootstrapProfile::default(), cloud)
    }

    fn hook(name: &'static str) -> impl Fn(&mut FakeNode) -> anyhow::Result<()> + Send + Sync {
        move |node: &mut FakeNode| {
            node.hooks.push(name.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_bootstrapped_node_skips_install() {
        let p = provisioner();
        let mut node = FakeNode::replying(&["OK\n"]);

        let outcome = p.bootstrap(&mut node, false).unwrap();
        assert_eq!(outcome.probed, NodeState::Bootstrapped);
        assert!(outcome.was_skipped());
        assert_eq!(node.transport.batches.len(), 1);
        assert!(!node.sent().iter().any(|c| c.starts_with("apt-get")));
    }

    #[test]
    fn test_force_installs_even_when_bootstrapped() {
        let p = provisioner();
        let mut node = FakeNode::replying(&["OK\n"]);

        let outcome = p.bootstrap(&mut node, true).unwrap();
        assert!(outcome.installed);
        assert!(node.sent().contains(&"apt-get update"));
    }

    #[test]
    fn test_missing_probe_triggers_install() {
        let p = provisioner();
        let mut node = FakeNode::replying(&["some noise\nMISSING\n"]);

        let outcome = p.bootstrap(&mut node, false).unwrap();
        assert_eq!(outcome.probed, NodeState::NotBootstrapped);
        assert!(outcome.installed);

        // probe, install batch, gem bin link
        let batches = &node.transport.batches;
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].1.sudo, Some(false));
        assert_eq!(batches[1].1.sudo, Some(true));
        assert_eq!(batches[1].0.first().map(String::as_str), Some("apt-get update"));
        assert_eq!(batches[2].0, [commands::LINK_GEM_BIN]);
        assert_eq!(batches[2].1.env[0].0, "GEM_BIN");
    }

    #[test]
    fn test_source_rubygems_skips_gem_bin_link() {
        let cloud = TestCloud {
            dir: TempDir::new().unwrap(),
        };
        let profile = BootstrapProfile {
            rubygems_package: false,
            ..Default::default()
        };
        let p: Provisioner<_, FakeNode> = Provisioner::new(profile, cloud);
        let mut node = FakeNode::replying(&["MISSING"]);

        p.bootstrap(&mut node, false).unwrap();
        assert_eq!(node.transport.batches.len(), 2);
    }

    #[test]
    fn test_extra_gems_are_probed_and_installed() {
        let p = provisioner();
        let mut node = FakeNode::replying(&["MISSING"]);
        node.extra.push(GemSpec::new("right_aws"));

        p.bootstrap(&mut node, false).unwrap();
        let sent = node.sent();
        assert!(sent[0].contains("gem search '^right_aws$'"));
        assert!(sent.contains(&"gem install right_aws --no-rdoc --no-ri"));
    }

    #[test]
    fn test_bootstrap_runs_only_bootstrap_hooks() {
        let mut p = provisioner();
        p.rules_mut().register_user("bootstrap", Some(10), "a", hook("a")).unwrap();
        p.rules_mut().register_user("compile", Some(50), "b", hook("b")).unwrap();
        let mut node = FakeNode::replying(&["OK"]);

        p.bootstrap(&mut node, false).unwrap();
        assert_eq!(node.hooks, ["a"]);
    }

    #[test]
    fn test_compile_recreates_staging_dir() {
        let mut p = provisioner();
        p.rules_mut().register_user(":compile", None, "c", hook("c")).unwrap();
        let stale = p.staging_dir().join("stale.json");
        std::fs::create_dir_all(p.staging_dir()).unwrap();
        std::fs::write(&stale, "{}").unwrap();

        let mut node = FakeNode::replying(&[]);
        let dir = p.compile(&mut node).unwrap();
        assert!(dir.is_dir());
        assert!(!stale.exists());
        assert_eq!(node.hooks, ["c"]);
        assert!(node.transport.batches.is_empty());
    }

    #[test]
    fn test_configure_without_commands_only_runs_hooks() {
        let mut p = provisioner();
        p.rules_mut().register_user("configure", None, "cfg", hook("cfg")).unwrap();
        let mut node = FakeNode::replying(&[]);
        node.transport.available = false;

        assert_eq!(p.configure(&mut node).unwrap(), NodeState::Configured);
        assert_eq!(node.hooks, ["cfg"]);
    }

    #[test]
    fn test_configure_requires_availability() {
        let p = provisioner().with_artifacts(vec!["cat /etc/chef/dna.json".to_string()]);
        let mut node = FakeNode::replying(&[]);
        node.transport.available = false;

        let err = p.configure(&mut node).unwrap_err();
        assert!(err.is_unavailable());
        assert!(node.transport.batches.is_empty());
    }

    #[test]
    fn test_run_stops_configures_and_starts() {
        let p = provisioner().with_artifacts(vec!["echo configured".to_string()]);
        let mut node = FakeNode::replying(&[]);

        assert_eq!(p.run_with_debug(&mut node, true).unwrap(), NodeState::Configured);
        let sent = node.sent();
        assert_eq!(sent[0], commands::STOP_AGENT);
        assert_eq!(sent[1], "echo configured");
        assert!(sent[2].contains("chef-solo"));
        assert!(sent[2].ends_with("-l debug"));
        assert_eq!(node.transport.batches[2].1.env[0].0, "GEM_BIN");
    }

    fn agent_line_with_debug_env(debug_env: &str) -> String {
        let profile = BootstrapProfile {
            agent: AgentSettings {
                debug_env: debug_env.to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let cloud = TestCloud {
            dir: TempDir::new().unwrap(),
        };
        let p = Provisioner::new(profile, cloud);
        let mut node = FakeNode::replying(&[]);

        assert_eq!(p.run(&mut node).unwrap(), NodeState::Configured);
        node.sent().last().unwrap().to_string()
    }

    #[test]
    fn test_run_follows_debug_env() {
        // PATH is always present in the test environment
        assert!(agent_line_with_debug_env("PATH").ends_with("-l debug"));

        let quiet = agent_line_with_debug_env("FLEETBOOT_TEST_DEBUG_TOGGLE_NEVER_SET");
        assert!(quiet.contains("chef-solo"));
        assert!(!quiet.contains("-l debug"));
    }

    #[test]
    fn test_failing_hook_surfaces_rule_error() {
        let mut p = provisioner();
        p.rules_mut()
            .register_user("bootstrap", None, "boom", |_: &mut FakeNode| {
                anyhow::bail!("hook failed")
            })
            .unwrap();
        let mut node = FakeNode::replying(&["OK"]);

        let err = p.bootstrap(&mut node, false).unwrap_err();
        assert!(matches!(err, Error::Rules(bootrules::Error::RuleFailed { .. })));
    }
}
