//! `ssh`-backed transport.
//!
//! Command lines take the shape
//! `ssh <user>@<host> <options> "<escaped-command>"`; file pushes go through
//! `rsync -e 'ssh <options>'` and single files through `scp`.

use crate::endpoint::RemoteEndpoint;
use crate::error::{Error, Result};
use crate::escape::shell_escape;
use crate::options::SshOptions;
use crate::probe::{ProbeConfig, Reachability};
use crate::runner::{CommandRunner, RunOptions, ShellRunner};
use crate::transport::{
    CopyOptions, EchoMode, ExecOptions, PRIVILEGED_USER, RemoteTransport, SyncOptions,
    compose_command, env_prefix, wants_sudo,
};

/// Port checked by the availability probe.
pub const SSH_PORT: u16 = 22;

/// Directories never pushed by [`RemoteTransport::sync_push`].
pub const VCS_EXCLUDES: [&str; 3] = [".svn", ".git", ".cvs"];

/// Base `rsync` flags. `--no-o --no-g` keep a non-root local user from
/// chowning system directories like `/etc` on the remote side.
pub const BASE_RSYNC_OPTS: &str = "-va --no-o --no-g";

/// Transport that runs everything through the local `ssh` client.
pub struct SshTransport<R = ShellRunner> {
    endpoint: RemoteEndpoint,
    runner: R,
    reachability: Box<dyn Reachability>,
    pub(crate) remote_hostname: Option<String>,
}

impl SshTransport<ShellRunner> {
    /// Transport using the real shell runner and the default probe.
    pub fn new(endpoint: RemoteEndpoint) -> Self {
        Self::with_runner(endpoint, ShellRunner)
    }
}

impl<R: CommandRunner> SshTransport<R> {
    /// Transport using a custom runner.
    pub fn with_runner(endpoint: RemoteEndpoint, runner: R) -> Self {
        Self {
            endpoint,
            runner,
            reachability: Box::new(ProbeConfig::default()),
            remote_hostname: None,
        }
    }

    /// Replace the availability check.
    pub fn with_reachability(mut self, reachability: impl Reachability + 'static) -> Self {
        self.reachability = Box::new(reachability);
        self
    }

    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    pub fn endpoint_mut(&mut self) -> &mut RemoteEndpoint {
        &mut self.endpoint
    }

    /// `ssh <user>@<host> <options>`
    fn ssh_command(&mut self, overrides: &SshOptions) -> Result<String> {
        let host = self.endpoint.resolve_host()?;
        let options = self.endpoint.options(overrides);
        Ok(format!("ssh {}@{host} {options}", self.endpoint.user()))
    }

    fn require_available(&mut self) -> Result<()> {
        if self.is_available() {
            return Ok(());
        }
        Err(Error::TransportUnavailable {
            host: self.endpoint.resolve_host()?,
        })
    }

    /// Names this node may appear under in `~/.ssh/known_hosts`:
    /// resolved host, short host name and public address.
    pub fn known_host_names(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.endpoint.resolve_host()?, self.endpoint.short_hostname()?];
        names.extend(self.endpoint.public_ip());
        Ok(names)
    }

    /// Remove `names` from the local known hosts file.
    ///
    /// Tolerates host name reuse and address reassignment. When `names`
    /// is empty, [`known_host_names`](Self::known_host_names) is used.
    pub fn cleanup_known_hosts(&mut self, names: &[String]) -> Result<()> {
        let names = if names.is_empty() {
            self.known_host_names()?
        } else {
            names.to_vec()
        };

        let mut seen: Vec<&str> = Vec::new();
        for name in &names {
            let name = name.trim();
            if name.is_empty() || seen.contains(&name) {
                continue;
            }
            seen.push(name);
            log::debug!("removing {name} from known_hosts");
            self.runner
                .run(&format!("ssh-keygen -R {name} 2>/dev/null"), &RunOptions::quiet())?;
        }
        Ok(())
    }
}

impl<R: CommandRunner> RemoteTransport for SshTransport<R> {
    fn user(&self) -> &str {
        self.endpoint.user()
    }

    fn host(&mut self) -> Result<String> {
        self.endpoint.resolve_host()
    }

    fn is_available(&mut self) -> bool {
        match self.endpoint.resolve_host() {
            Ok(host) => self.reachability.reachable(&host, SSH_PORT),
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    fn execute(&mut self, commands: &[String], opts: &ExecOptions) -> Result<String> {
        self.require_available()?;

        let env = env_prefix(&opts.env);
        let sudo = wants_sudo(self.endpoint.user(), opts.sudo);
        let ssh = self.ssh_command(&opts.ssh)?;

        if commands.is_empty() {
            if !self.runner.run_interactive(&ssh)? {
                log::warn!("interactive session ended with an error");
            }
            return Ok(String::new());
        }

        let mut last = String::new();
        for command in commands {
            let escaped = shell_escape(&compose_command(command, &env, sudo));
            let full = format!("{ssh} \"{escaped}\"");

            match opts.echo {
                EchoMode::Off => log::debug!("ssh command: {escaped}"),
                EchoMode::On => println!("ssh command: {escaped}"),
                EchoMode::Debug => {
                    println!("ssh command: {escaped}");
                    println!("ssh_full: {full}");
                }
            }

            last = self.runner.run(&full, &RunOptions::default())?;
        }
        Ok(last)
    }

    fn sync_push(&mut self, opts: &SyncOptions) -> Result<String> {
        let source = opts
            .source
            .as_deref()
            .ok_or_else(|| Error::Validation("you must pass a source to sync".to_string()))?;
        self.require_available()?;

        let destination = opts.destination.as_deref().unwrap_or(source);
        let host = self.endpoint.resolve_host()?;
        let options = self.endpoint.options(&SshOptions::new());

        let mut rsync_opts = BASE_RSYNC_OPTS.to_string();
        if let Some(extra) = opts.extra_opts.as_deref().filter(|e| !e.trim().is_empty()) {
            rsync_opts.push(' ');
            rsync_opts.push_str(extra.trim());
        }
        if self.endpoint.user() != PRIVILEGED_USER {
            rsync_opts.push_str(" --rsync-path=\"sudo rsync\"");
        }
        for dir in VCS_EXCLUDES {
            rsync_opts.push_str(&format!(" --exclude={dir}"));
        }
        for pattern in &opts.exclude {
            rsync_opts.push_str(&format!(" --exclude=\"{pattern}\""));
        }

        let cmd = format!(
            "rsync -L -e 'ssh {options}' {rsync_opts} {source} {}@{host}:{destination}",
            self.endpoint.user()
        );
        self.runner.run(&cmd, &RunOptions::quiet())
    }

    fn copy_single(&mut self, opts: &CopyOptions) -> Result<String> {
        let source = opts
            .source
            .as_deref()
            .ok_or_else(|| Error::Validation("you must pass a local file to copy".to_string()))?;

        let destination = opts.destination.as_deref().unwrap_or(source);
        let host = self.endpoint.resolve_host()?;
        let options = self.endpoint.options(&opts.ssh);

        let cmd = format!(
            "scp {options} {source} {}@{host}:{destination}",
            self.endpoint.user()
        );
        self.runner.run(&cmd, &RunOptions::default())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::endpoint::StaticHost;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Runner that records command lines and replays canned output.
    #[derive(Clone, Default)]
    pub struct RecordingRunner {
        pub commands: Arc<Mutex<Vec<String>>>,
        pub interactive: Arc<Mutex<Vec<String>>>,
        pub replies: Arc<Mutex<VecDeque<String>>>,
    }

    impl RecordingRunner {
        pub fn reply(&self, output: &str) {
            self.replies.lock().unwrap().push_back(output.to_string());
        }

        pub fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command: &str, _opts: &RunOptions) -> Result<String> {
            self.commands.lock().unwrap().push(command.to_string());
            Ok(self.replies.lock().unwrap().pop_front().unwrap_or_default())
        }

        fn run_interactive(&self, command: &str) -> Result<bool> {
            self.interactive.lock().unwrap().push(command.to_string());
            Ok(true)
        }
    }

    pub struct Fixed(pub bool);

    impl Reachability for Fixed {
        fn reachable(&self, _host: &str, _port: u16) -> bool {
            self.0
        }
    }

    pub fn transport(
        user: &str,
        reachable: bool,
    ) -> (SshTransport<RecordingRunner>, RecordingRunner) {
        let runner = RecordingRunner::default();
        let endpoint = RemoteEndpoint::new(
            StaticHost::new("web1.example.com").with_public_ip("203.0.113.9"),
            user,
            "/keys/k.pem",
        );
        let transport =
            SshTransport::with_runner(endpoint, runner.clone()).with_reachability(Fixed(reachable));
        (transport, runner)
    }
}
