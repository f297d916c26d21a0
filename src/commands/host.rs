//! probe, forget and rename

use anyhow::{Result, bail};
use remotekit::{ProbeConfig, probe_port};
use std::time::Duration;

use crate::Context;
use crate::progress;
use crate::ui;

pub fn probe(
    ctx: &Context,
    host: &str,
    port: u16,
    attempts: Option<u32>,
    interval: Option<u64>,
) -> Result<()> {
    let mut config: ProbeConfig = ctx.config.connection.probe.clone();
    if let Some(attempts) = attempts {
        config.max_attempts = attempts;
    }
    if let Some(interval) = interval {
        config.interval = Duration::from_secs(interval);
    }

    let pb = progress::spinner(
        &format!("Probing {host}:{port} (up to {} attempts)", config.max_attempts),
        ctx.quiet,
    );
    if probe_port(host, port, &config) {
        progress::finish_success(&pb, &format!("{host}:{port} accepts connections"));
        Ok(())
    } else {
        progress::finish_error(&pb, &format!("{host}:{port} never answered"));
        bail!("{host}:{port} is not reachable")
    }
}

pub fn forget(ctx: &Context, host: &str, names: &[String]) -> Result<()> {
    let mut node = ctx.node(host);
    let transport = node.ssh();
    let names = if names.is_empty() {
        transport.known_host_names()?
    } else {
        names.to_vec()
    };
    transport.cleanup_known_hosts(&names)?;

    if !ctx.quiet {
        ui::success("Removed from known_hosts:");
        for name in &names {
            ui::dim(name);
        }
    }
    Ok(())
}

pub fn rename(ctx: &Context, host: &str, fqdn: &str, ip: &str) -> Result<()> {
    let mut node = ctx.node(host);
    let transport = node.ssh();

    let before = transport.remote_hostname()?;
    transport.change_hostname(fqdn, Some(ip))?;
    transport.endpoint_mut().set_host(host);
    let after = transport.remote_hostname()?;

    if !ctx.quiet {
        ui::kv("before", &before);
        ui::kv("after", &after);
    }
    if after != fqdn {
        ui::warn(&format!("{host} reports {after}, expected {fqdn}"));
    }
    Ok(())
}
