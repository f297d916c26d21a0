//! # remotekit
//!
//! Remote command execution over `ssh`, built on a small local subprocess
//! primitive.
//!
//! This crate provides:
//! - Shell-safe quoting of composed commands ([`shell_escape`])
//! - Merged, cached `ssh` option sets ([`SshOptions`])
//! - A lazily resolved remote endpoint ([`RemoteEndpoint`])
//! - Bounded TCP port probing ([`probe_port`])
//! - Batched remote execution with env injection and `sudo` wrapping,
//!   `rsync` pushes and `scp` copies ([`SshTransport`])
//!
//! ## Example
//!
//! ```no_run
//! use remotekit::{ExecOptions, RemoteEndpoint, RemoteTransport, SshTransport, StaticHost};
//!
//! let endpoint = RemoteEndpoint::new(
//!     StaticHost::new("node1.example.com"),
//!     "ubuntu",
//!     "/home/me/.ssh/fleet.pem",
//! );
//! let mut transport = SshTransport::new(endpoint);
//!
//! let out = transport
//!     .execute(&["uptime".to_string()], &ExecOptions::default())
//!     .expect("ssh not available");
//! println!("{out}");
//! ```
//!
//! ## Failure Semantics
//!
//! Preconditions (availability, required options) fail with an [`Error`]
//! before anything runs. Once a batch is dispatched, individual command
//! failures only produce a logged warning; callers inspect the returned
//! output for markers.

pub mod endpoint;
pub mod error;
pub mod escape;
pub mod manipulate;
pub mod options;
pub mod probe;
pub mod runner;
pub mod ssh;
pub mod transport;

pub use endpoint::{HostIdentity, RemoteEndpoint, StaticHost};
pub use error::{Error, Result};
pub use escape::shell_escape;
pub use options::SshOptions;
pub use probe::{ProbeConfig, Reachability, probe_port, probe_with};
pub use runner::{CommandRunner, RunOptions, ShellRunner, system_run};
pub use ssh::SshTransport;
pub use transport::{
    CopyOptions, EchoMode, ExecOptions, PRIVILEGED_USER, RemoteTransport, SyncOptions,
    compose_command, env_prefix, wants_sudo,
};
