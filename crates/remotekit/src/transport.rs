//! Transport abstraction for remote execution.
//!
//! The [`RemoteTransport`] trait is what provisioning code talks to, so
//! providers can supply their own transport and tests can record calls.

use crate::error::Result;
use crate::options::SshOptions;

/// Account that never needs privilege escalation.
pub const PRIVILEGED_USER: &str = "root";

/// How much of each dispatched command to print.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EchoMode {
    /// Print nothing
    #[default]
    Off,
    /// Print the escaped remote command
    On,
    /// Also print the full local `ssh` command line
    Debug,
}

impl EchoMode {
    /// `On` when `echo` is set, `Off` otherwise
    pub fn from_flag(echo: bool) -> Self {
        if echo { Self::On } else { Self::Off }
    }
}

/// Options for [`RemoteTransport::execute`].
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Variables assigned before each command, in order
    pub env: Vec<(String, String)>,
    /// Explicit sudo choice; `None` means sudo for non-root users
    pub sudo: Option<bool>,
    /// Command echo
    pub echo: EchoMode,
    /// Per-call `ssh` option overrides
    pub ssh: SshOptions,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn sudo(mut self, sudo: bool) -> Self {
        self.sudo = Some(sudo);
        self
    }

    pub fn echo(mut self, echo: EchoMode) -> Self {
        self.echo = echo;
        self
    }

    pub fn ssh_option(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.ssh.set(flag, value);
        self
    }
}

/// Options for [`RemoteTransport::sync_push`].
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Local path to push (required)
    pub source: Option<String>,
    /// Remote path; defaults to `source`
    pub destination: Option<String>,
    /// Extra `--exclude` patterns on top of VCS directories
    pub exclude: Vec<String>,
    /// Extra `rsync` flags appended after the base flags
    pub extra_opts: Option<String>,
}

impl SyncOptions {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Default::default()
        }
    }

    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }
}

/// Options for [`RemoteTransport::copy_single`].
#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    /// Local file (required)
    pub source: Option<String>,
    /// Remote path; defaults to `source`
    pub destination: Option<String>,
    /// Per-call option overrides for `scp`
    pub ssh: SshOptions,
}

impl CopyOptions {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Default::default()
        }
    }

    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

/// Remote command and file transfer capability of a node.
pub trait RemoteTransport: Send {
    /// Connecting user
    fn user(&self) -> &str;

    /// Host the transport talks to
    fn host(&mut self) -> Result<String>;

    /// Availability precondition checked before dispatching work.
    fn is_available(&mut self) -> bool;

    /// Run `commands` in order and return the output of the last one.
    ///
    /// An empty list attaches an interactive session instead.
    fn execute(&mut self, commands: &[String], opts: &ExecOptions) -> Result<String>;

    /// Push a file tree with `rsync`.
    fn sync_push(&mut self, opts: &SyncOptions) -> Result<String>;

    /// Copy one file with `scp`.
    fn copy_single(&mut self, opts: &CopyOptions) -> Result<String>;

    /// Run a single command.
    fn run(&mut self, command: &str, opts: &ExecOptions) -> Result<String> {
        self.execute(&[command.to_string()], opts)
    }
}

/// Whether a command for `user` gets wrapped in `sudo`.
///
/// Defaults to yes, and is always no for [`PRIVILEGED_USER`].
pub fn wants_sudo(user: &str, requested: Option<bool>) -> bool {
    user != PRIVILEGED_USER && requested.unwrap_or(true)
}

/// `K=V && K2=V2 && ` prefix, or empty when there are no variables.
pub fn env_prefix(env: &[(String, String)]) -> String {
    if env.is_empty() {
        return String::new();
    }
    let assignments: Vec<String> = env.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{} && ", assignments.join(" && "))
}

/// Prefix the environment and wrap in `sudo sh -c` when asked.
///
/// The result is the remote command before the outer escaping for `ssh`.
pub fn compose_command(command: &str, env_prefix: &str, sudo: bool) -> String {
    let cmd = format!("{env_prefix}{command}");
    if sudo {
        format!("sudo sh -c \"{}\"", crate::escape::shell_escape(&cmd))
    } else {
        cmd
    }
}
