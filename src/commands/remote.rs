//! exec, push and copy

use anyhow::Result;
use remotekit::{CopyOptions, ExecOptions, RemoteTransport, SyncOptions};

use crate::Context;
use crate::cli::ExecArgs;
use crate::ui;

pub fn exec(ctx: &Context, args: ExecArgs) -> Result<()> {
    let mut node = ctx.node(&args.host);
    let transport = node.ssh();

    let mut opts = ExecOptions::new().echo(args.echo.into());
    if args.no_sudo {
        opts = opts.sudo(false);
    }
    for (key, value) in args.env {
        opts = opts.env(key, value);
    }

    if args.commands.is_empty() && !ctx.quiet {
        ui::info(&format!("Opening a shell on {}", args.host));
    }
    let output = transport.execute(&args.commands, &opts)?;
    log::debug!("{} bytes of output from the last command", output.len());
    Ok(())
}

pub fn push(
    ctx: &Context,
    host: &str,
    source: String,
    destination: Option<String>,
    exclude: Vec<String>,
    rsync_opts: Option<String>,
) -> Result<()> {
    let mut node = ctx.node(host);
    let opts = SyncOptions {
        source: Some(source),
        destination,
        exclude,
        extra_opts: rsync_opts,
    };
    node.ssh().sync_push(&opts)?;
    if !ctx.quiet {
        ui::success(&format!("Pushed to {host}"));
    }
    Ok(())
}

pub fn copy(ctx: &Context, host: &str, source: String, destination: Option<String>) -> Result<()> {
    let mut node = ctx.node(host);
    let mut opts = CopyOptions::new(source);
    opts.destination = destination;
    node.ssh().copy_single(&opts)?;
    if !ctx.quiet {
        ui::success(&format!("Copied to {host}"));
    }
    Ok(())
}
