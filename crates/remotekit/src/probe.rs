//! Bounded TCP port probing.
//!
//! A refused connection is an ordinary outcome: the probe sleeps and tries
//! again until it runs out of attempts. Every successful connection is shut
//! down and dropped before the next attempt so the remote `sshd` does not
//! accumulate unauthenticated connections (see `MaxStartups` in
//! sshd_config(5)).

use serde::{Deserialize, Serialize};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

/// Default number of connection attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 400;

/// Default pause between failed attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Upper bound for a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Maximum number of attempts
    pub max_attempts: u32,
    /// Pause between failed attempts
    #[serde(with = "secs")]
    pub interval: Duration,
    /// Timeout for each individual connect
    #[serde(with = "secs")]
    pub connect_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ProbeConfig {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            ..Default::default()
        }
    }
}

/// Check whether a host accepts connections on a port.
///
/// Implemented by [`ProbeConfig`]; tests substitute fixed answers.
pub trait Reachability: Send {
    fn reachable(&self, host: &str, port: u16) -> bool;
}

impl Reachability for ProbeConfig {
    fn reachable(&self, host: &str, port: u16) -> bool {
        probe_port(host, port, self)
    }
}

/// Run `attempt` up to `config.max_attempts` times.
///
/// `attempt` receives the 1-indexed attempt number. Returns `true` on the
/// first success; sleeps `config.interval` between failures.
pub fn probe_with<F>(config: &ProbeConfig, mut attempt: F) -> bool
where
    F: FnMut(u32) -> bool,
{
    for n in 1..=config.max_attempts {
        if attempt(n) {
            return true;
        }
        if n < config.max_attempts && !config.interval.is_zero() {
            thread::sleep(config.interval);
        }
    }
    false
}

/// Try to open a TCP connection to `host:port`, retrying on failure.
pub fn probe_port(host: &str, port: u16, config: &ProbeConfig) -> bool {
    let connected = probe_with(config, |n| {
        let ok = connect_once(host, port, config.connect_timeout);
        if !ok {
            log::debug!(
                "probe {host}:{port} attempt {n}/{} refused",
                config.max_attempts
            );
        }
        ok
    });
    if !connected {
        log::warn!(
            "{host}:{port} not reachable after {} attempts",
            config.max_attempts
        );
    }
    connected
}

fn connect_once(host: &str, port: u16, timeout: Duration) -> bool {
    let addrs = match (host, port).to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            log::debug!("cannot resolve {host}: {e}");
            return false;
        }
    };

    for addr in addrs {
        if let Ok(stream) = TcpStream::connect_timeout(&addr, timeout) {
            let _ = stream.shutdown(Shutdown::Both);
            return true;
        }
    }
    false
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
