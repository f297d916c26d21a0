use bootrules::Phase;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use remotekit::EchoMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fleetboot")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Bootstrap and configure fleet nodes over ssh", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/fleetboot/config.toml)
    #[arg(short, long, global = true, env = "FLEETBOOT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install the agent unless the node already has it
    Bootstrap {
        /// Node host name or address
        host: String,

        /// Install even when the probe reports everything present
        #[arg(short, long)]
        force: bool,
    },

    /// Send configure commands and run configure hooks
    Configure {
        /// Node host name or address
        host: String,
    },

    /// Stop the agent, configure, and start it again
    Run {
        /// Node host name or address
        host: String,

        /// Start the agent with debug logging (also enabled by the
        /// profile's debug environment variable)
        #[arg(long)]
        debug: bool,
    },

    /// Run commands on a node (no commands opens a shell)
    Exec(ExecArgs),

    /// Push a directory tree with rsync
    Push {
        /// Node host name or address
        host: String,

        /// Local path
        source: String,

        /// Remote path (defaults to source)
        destination: Option<String>,

        /// Extra exclude patterns
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Extra rsync flags
        #[arg(long, allow_hyphen_values = true)]
        rsync_opts: Option<String>,
    },

    /// Copy a single file with scp
    Copy {
        /// Node host name or address
        host: String,

        /// Local file
        source: String,

        /// Remote path (defaults to source)
        destination: Option<String>,
    },

    /// Wait until a node accepts connections
    Probe {
        /// Node host name or address
        host: String,

        /// Port to probe
        #[arg(short, long, default_value_t = remotekit::ssh::SSH_PORT)]
        port: u16,

        /// Maximum attempts (defaults to the configured value)
        #[arg(short, long)]
        attempts: Option<u32>,

        /// Seconds between attempts (defaults to the configured value)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Remove a node from ~/.ssh/known_hosts
    Forget {
        /// Node host name or address
        host: String,

        /// Names to remove (defaults to host, short name and public address)
        names: Vec<String>,
    },

    /// Change a node's host name
    Rename {
        /// Node host name or address
        host: String,

        /// New fully qualified name
        fqdn: String,

        /// Address mapped to the name in /etc/hosts
        #[arg(long, default_value = remotekit::manipulate::DEFAULT_HOSTNAME_IP)]
        ip: String,
    },

    /// List phase hooks in execution order
    Hooks {
        /// Only this phase (compile, bootstrap, configure)
        #[arg(short, long)]
        phase: Option<Phase>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ExecArgs {
    /// Node host name or address
    pub host: String,

    /// Commands, run in order; only the last one's output is kept
    pub commands: Vec<String>,

    /// Do not wrap commands in sudo
    #[arg(long)]
    pub no_sudo: bool,

    /// Environment assignment (KEY=VALUE), repeatable
    #[arg(short, long, value_parser = parse_env)]
    pub env: Vec<(String, String)>,

    /// Command echo
    #[arg(long, value_enum, default_value_t = EchoArg::Off)]
    pub echo: EchoArg,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EchoArg {
    Off,
    On,
    Debug,
}

impl From<EchoArg> for EchoMode {
    fn from(arg: EchoArg) -> Self {
        match arg {
            EchoArg::Off => Self::Off,
            EchoArg::On => Self::On,
            EchoArg::Debug => Self::Debug,
        }
    }
}

fn parse_env(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
