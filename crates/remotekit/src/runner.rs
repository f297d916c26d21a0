//! Local subprocess execution
//!
//! Every remote operation ends up as one local shell command line (`ssh`,
//! `rsync`, `scp`, `ssh-keygen`). [`system_run`] runs it, streams stdout as
//! it arrives and returns everything it printed. A non-zero exit status is
//! logged, not raised: callers look for markers in the returned text.

use crate::error::{Error, Result};
use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread;

/// Default read size for streamed output.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Options for a local run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Don't echo stdout while it streams
    pub quiet: bool,
    /// Bytes per read
    pub chunk_size: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            quiet: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl RunOptions {
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Default::default()
        }
    }
}

/// Executes composed command lines locally.
///
/// [`ShellRunner`] is the real implementation; tests record command lines
/// instead of running them.
pub trait CommandRunner: Send {
    /// Run a command line and return its captured stdout.
    fn run(&self, command: &str, opts: &RunOptions) -> Result<String>;

    /// Run a command line attached to the terminal. Returns whether it
    /// exited successfully.
    fn run_interactive(&self, command: &str) -> Result<bool>;
}

/// Runs command lines through `sh -c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, opts: &RunOptions) -> Result<String> {
        system_run(command, opts)
    }

    fn run_interactive(&self, command: &str) -> Result<bool> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| Error::Spawn {
                command: command.to_string(),
                source,
            })?;
        Ok(status.success())
    }
}

/// Run `command` through `sh -c`, returning everything it wrote to stdout.
///
/// Stdin is closed immediately. Stdout is read in `chunk_size` pieces and
/// echoed to our stdout unless `quiet`. Stderr is always forwarded to our
/// stderr, including when reading stdout fails part way.
pub fn system_run(command: &str, opts: &RunOptions) -> Result<String> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| Error::Spawn {
            command: command.to_string(),
            source,
        })?;

    drop(child.stdin.take());

    // Drained on its own thread so a full stderr pipe can't stall stdout.
    let stderr_forwarder = child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut sink = io::stderr();
            if let Err(e) = io::copy(&mut stderr, &mut sink) {
                log::debug!("stderr forwarding stopped: {e}");
            }
        })
    });

    let mut buf = Vec::new();
    if let Some(mut stdout) = child.stdout.take() {
        let mut chunk = vec![0u8; opts.chunk_size.max(1)];
        loop {
            match stdout.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if !opts.quiet {
                        let mut out = io::stdout().lock();
                        let _ = out.write_all(&chunk[..n]);
                        let _ = out.flush();
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    log::warn!("reading output failed: {e}");
                    break;
                }
            }
        }
    }

    if let Some(handle) = stderr_forwarder {
        let _ = handle.join();
    }

    match child.wait() {
        Ok(status) if !status.success() => {
            log::warn!("command exited with {status}: {command}");
        }
        Ok(_) => {}
        Err(e) => log::warn!("could not wait for command: {e}"),
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout() {
        let out = system_run("printf 'hello\\nworld\\n'", &RunOptions::quiet()).unwrap();
        assert_eq!(out, "hello\nworld\n");
    }

    #[test]
    fn test_small_chunks_accumulate() {
        let opts = RunOptions {
            quiet: true,
            chunk_size: 1,
        };
        let out = system_run("printf abcdef", &opts).unwrap();
        assert_eq!(out, "abcdef");
    }

    #[test]
    fn test_nonzero_exit_keeps_output() {
        let out = system_run("echo partial; exit 3", &RunOptions::quiet()).unwrap();
        assert_eq!(out, "partial\n");
    }

    #[test]
    fn test_stderr_not_captured() {
        let out = system_run("echo out; echo err 1>&2", &RunOptions::quiet()).unwrap();
        assert_eq!(out, "out\n");
    }

    #[test]
    fn test_stdin_closed() {
        let out = system_run("cat; echo done", &RunOptions::quiet()).unwrap();
        assert_eq!(out, "done\n");
    }

    #[test]
    fn test_failure_does_not_stop_later_commands() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("after");
        let cmd = format!("false; touch {}; echo ran", marker.display());

        let out = system_run(&cmd, &RunOptions::quiet()).unwrap();
        assert_eq!(out, "ran\n");
        assert!(marker.exists());
    }

    #[test]
    fn test_zero_chunk_size_still_reads() {
        let opts = RunOptions {
            quiet: true,
            chunk_size: 0,
        };
        assert_eq!(system_run("printf ok", &opts).unwrap(), "ok");
    }
}
