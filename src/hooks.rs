//! Phase hooks: config-declared commands plus the built-in rules.

use crate::config::HookConfig;
use crate::node::SshNode;
use anyhow::Context;
use bootrules::{Owner, Phase, RuleRegistry, RuleSpec};
use provision::Node;
use remotekit::{ExecOptions, RunOptions, shell_escape, system_run};
use std::path::Path;

/// Owner recorded on rules the binary registers itself
pub const OWNER: &str = "fleetboot";

/// Registry with the built-in rules and every configured hook.
///
/// `staging` is where `:compile` hooks run.
pub fn registry(
    hooks: &[HookConfig],
    staging: &Path,
) -> bootrules::Result<RuleRegistry<SshNode>> {
    let mut rules = RuleRegistry::new();
    rules.register(
        RuleSpec::for_phase(Phase::Compile, "known-hosts")
            .priority(10)
            .owner(Owner::new(OWNER))
            .action(|node: &mut SshNode| {
                node.ssh()
                    .cleanup_known_hosts(&[])
                    .context("failed to clean known_hosts")
            }),
    )?;
    register_hooks(&mut rules, hooks, staging)?;
    Ok(rules)
}

/// Turn each configured hook into a user-defined rule running its command.
///
/// `:compile` hooks run on this machine inside `staging`; every other phase
/// sends the command to the node.
pub fn register_hooks<N: Node + ?Sized + 'static>(
    rules: &mut RuleRegistry<N>,
    hooks: &[HookConfig],
    staging: &Path,
) -> bootrules::Result<()> {
    for hook in hooks {
        let name = hook.name.clone();
        let command = hook.command.clone();

        if matches!(Phase::parse(&hook.phase), Ok(Phase::Compile)) {
            let staging = staging.to_path_buf();
            rules.register_user(&hook.phase, hook.priority, &hook.name, move |_: &mut N| {
                run_local(&command, &staging).with_context(|| format!("hook {name} failed"))
            })?;
            continue;
        }

        let sudo = hook.sudo;
        rules.register_user(&hook.phase, hook.priority, &hook.name, move |node: &mut N| {
            let mut opts = ExecOptions::new();
            if let Some(sudo) = sudo {
                opts = opts.sudo(sudo);
            }
            node.transport()
                .run(&command, &opts)
                .with_context(|| format!("hook {name} failed on {}", node.id()))?;
            Ok(())
        })?;
    }
    Ok(())
}

fn run_local(command: &str, staging: &Path) -> anyhow::Result<()> {
    let dir = shell_escape(&staging.display().to_string());
    log::debug!("Running compile hook in {}: {command}", staging.display());
    system_run(&format!("cd \"{dir}\" && {command}"), &RunOptions::default())?;
    Ok(())
}
