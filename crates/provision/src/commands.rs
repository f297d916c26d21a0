//! Remote command construction for the agent lifecycle
//!
//! Pure functions from a [`BootstrapProfile`] to command strings. Nothing
//! here touches a transport, so every shape can be checked in isolation.

use crate::profile::{BootstrapProfile, GemSpec};

/// Stops the agent service when installed and kills stray agent processes.
///
/// Absence of either is not an error.
pub const STOP_AGENT: &str =
    "[ -f /etc/init.d/chef-client ] && invoke-rc.d chef-client stop; killall -q chef-client chef-solo";

/// Links gem executables into `/usr/local/bin` for distro rubygems.
pub const LINK_GEM_BIN: &str = "[ -d \"$GEM_BIN\" ] && ln -sf $GEM_BIN/* /usr/local/bin";

/// Name of the variable holding the gem executable directory.
pub const GEM_BIN_VAR: &str = "GEM_BIN";

/// Shell expression that evaluates to the gem executable directory.
pub const GEM_BIN_EXPR: &str = r#"$(gem env | grep "EXECUTABLE DIRECTORY" | awk "{print \$4}")"#;

/// `GEM_BIN` assignment for [`remotekit::ExecOptions::env`].
pub fn gem_bin_env() -> (String, String) {
    (GEM_BIN_VAR.to_string(), GEM_BIN_EXPR.to_string())
}

/// Profile gems followed by node-specific extras.
pub fn all_gems(profile: &BootstrapProfile, extra: &[GemSpec]) -> Vec<GemSpec> {
    profile.gems.iter().chain(extra).cloned().collect()
}

/// One compound command that prints `OK` only when every binary, package,
/// gem and directory is present, and `MISSING` otherwise.
///
/// Presence checks go through `which` rather than calling the binaries, so
/// "command not found" helpers on the remote cannot confuse detection.
pub fn probe_command(profile: &BootstrapProfile, gems: &[GemSpec]) -> String {
    let mut checks = Vec::new();
    checks.push(format!("which {}", profile.bins.join(" ")));
    checks.push(format!("dpkg -l {} ", profile.bootstrap_packages().join(" ")));
    checks.extend(
        gems.iter()
            .map(|gem| format!("gem search '^{}$' | grep -v GEMS | wc -l | grep -q 1", gem.name)),
    );
    checks.extend(profile.dirs.iter().map(|dir| format!("[ -d {dir} ] ")));

    if profile.quiet {
        for check in &mut checks {
            check.push_str(" >/dev/null");
        }
    }

    format!("{} && echo OK || echo MISSING", checks.join("&&"))
}

/// The ordered install batch.
///
/// The base package install runs twice; the second pass picks up anything
/// the gem installs pulled out from under it.
pub fn install_commands(profile: &BootstrapProfile, gems: &[GemSpec]) -> Vec<String> {
    let packages = profile.bootstrap_packages().join(" ");
    let source = &profile.gem_source;

    let mut cmds = vec![
        "apt-get update".to_string(),
        "apt-get autoremove -y".to_string(),
        format!("apt-get install -y {packages}"),
    ];
    cmds.extend(profile.rubygems_bootstrap_command());
    cmds.push(format!(
        "gem source -l | grep -q {source} || gem source -a {source}"
    ));
    cmds.extend(gems.iter().map(gem_install));
    cmds.push(format!("apt-get install -y {packages}"));
    cmds.push(format!("mkdir -p {}", profile.dirs.join(" ")));
    cmds
}

fn gem_install(gem: &GemSpec) -> String {
    match &gem.version {
        Some(version) => format!("gem install -v {version} {} --no-rdoc --no-ri", gem.name),
        None => format!("gem install {} --no-rdoc --no-ri", gem.name),
    }
}

/// Command that starts the agent daemon.
pub fn agent_command(profile: &BootstrapProfile, debug: bool) -> String {
    let agent = &profile.agent;
    let cmd = format!(
        "PATH=\"$PATH:$GEM_BIN\" {} -j {} -c {} -d -i {} -s {} {}",
        agent.mode.binary(),
        agent.json_attribs,
        agent.config_file,
        agent.interval_secs,
        agent.splay_secs,
        if debug { "-l debug" } else { "" },
    );
    squeeze(cmd.trim())
}

fn squeeze(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_space = false;
    for c in s.chars() {
        if c == ' ' {
            if !last_space {
                out.push(c);
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out
}
