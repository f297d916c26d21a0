mod cli;
mod commands;
mod config;
mod hooks;
mod node;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::FleetConfig;
use node::SshNode;
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: FleetConfig,
}

impl Context {
    /// Node for `host` using the configured connection settings.
    pub fn node(&self, host: &str) -> SshNode {
        SshNode::connect(host, &self.config.connection)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "fleetboot", &mut io::stdout());
        return Ok(());
    }

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: FleetConfig::load(cli.config.as_deref())?,
    };

    match cli.command {
        Command::Bootstrap { host, force } => commands::lifecycle::bootstrap(&ctx, &host, force),
        Command::Configure { host } => commands::lifecycle::configure(&ctx, &host),
        Command::Run { host, debug } => commands::lifecycle::run(&ctx, &host, debug),
        Command::Exec(args) => commands::remote::exec(&ctx, args),
        Command::Push {
            host,
            source,
            destination,
            exclude,
            rsync_opts,
        } => commands::remote::push(&ctx, &host, source, destination, exclude, rsync_opts),
        Command::Copy {
            host,
            source,
            destination,
        } => commands::remote::copy(&ctx, &host, source, destination),
        Command::Probe {
            host,
            port,
            attempts,
            interval,
        } => commands::host::probe(&ctx, &host, port, attempts, interval),
        Command::Forget { host, names } => commands::host::forget(&ctx, &host, &names),
        Command::Rename { host, fqdn, ip } => commands::host::rename(&ctx, &host, &fqdn, &ip),
        Command::Hooks { phase } => commands::hooks::list(&ctx, phase),
        Command::Completions { .. } => Ok(()),
    }
}
