//! bootstrap, configure and run

use anyhow::{Context as _, Result, bail};
use provision::{Node, Provisioner};

use crate::Context;
use crate::hooks;
use crate::node::{SshNode, StaticCloud};
use crate::progress;
use crate::ui;

type NodeProvisioner = Provisioner<StaticCloud, SshNode>;

/// Provisioner for the configured cloud, with hooks compiled in.
pub(crate) fn provisioner(ctx: &Context) -> Result<NodeProvisioner> {
    let p = Provisioner::new(
        ctx.config.bootstrap.clone(),
        StaticCloud::from_config(&ctx.config),
    )
    .with_artifacts(ctx.config.configure.clone());
    let rules = hooks::registry(&ctx.config.hooks, &p.staging_dir())
        .context("Invalid hook configuration")?;
    Ok(p.with_rules(rules))
}

/// Block until the node answers, with a spinner.
fn wait_for(ctx: &Context, node: &mut SshNode) -> Result<()> {
    let host = node.transport().host()?;
    let pb = progress::spinner(&format!("Waiting for ssh on {host}..."), ctx.quiet);
    if node.transport().is_available() {
        progress::finish_success(&pb, &format!("{host} is reachable"));
        Ok(())
    } else {
        progress::finish_error(&pb, &format!("{host} is not reachable"));
        bail!("ssh is not available for {host}")
    }
}

pub fn bootstrap(ctx: &Context, host: &str, force: bool) -> Result<()> {
    let p = provisioner(ctx)?;
    let mut node = ctx.node(host);

    ui::header(&format!("Bootstrapping {}", node.id()));

    ui::step(1, 3, "Compiling");
    let staged = p.compile(&mut node)?;
    if ctx.verbose > 0 {
        ui::kv("staging", &staged.display().to_string());
    }

    ui::step(2, 3, "Connecting");
    wait_for(ctx, &mut node)?;

    ui::step(3, 3, "Checking agent installation");
    let outcome = p.bootstrap(&mut node, force)?;
    if outcome.was_skipped() {
        ui::success(&format!("{host} is already bootstrapped"));
    } else {
        ui::kv("probe", &outcome.probed.to_string());
        ui::success(&format!("Installed agent on {host}"));
    }
    Ok(())
}

pub fn configure(ctx: &Context, host: &str) -> Result<()> {
    let p = provisioner(ctx)?;
    let mut node = ctx.node(host);

    ui::header(&format!("Configuring {}", node.id()));
    p.compile(&mut node)?;
    let state = p.configure(&mut node)?;
    ui::success(&format!("{host} is {state}"));
    Ok(())
}

pub fn run(ctx: &Context, host: &str, debug: bool) -> Result<()> {
    let p = provisioner(ctx)?;
    let mut node = ctx.node(host);

    ui::header(&format!("Running agent on {}", node.id()));
    p.compile(&mut node)?;
    let state = if debug {
        p.run_with_debug(&mut node, true)?
    } else {
        p.run(&mut node)?
    };
    ui::success(&format!("{host} is {state}, agent started"));
    Ok(())
}
