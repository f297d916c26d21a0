//! Destructive manipulations over a connection, like renaming the machine.

use crate::error::{Error, Result};
use crate::runner::CommandRunner;
use crate::ssh::SshTransport;
use crate::transport::{ExecOptions, RemoteTransport};

/// Loopback address Debian-style systems map the host name to.
pub const DEFAULT_HOSTNAME_IP: &str = "127.0.1.1";

const ETC_HOSTS: &str = "/etc/hosts";

impl<R: CommandRunner> SshTransport<R> {
    /// The node's own idea of its name (`hostname -f`), fetched once.
    pub fn remote_hostname(&mut self) -> Result<String> {
        if let Some(name) = &self.remote_hostname {
            return Ok(name.clone());
        }
        let out = self.run("hostname -f", &ExecOptions::new().sudo(false))?;
        let name = out.lines().last().unwrap_or_default().trim().to_string();
        self.remote_hostname = Some(name.clone());
        Ok(name)
    }

    /// Rename the node to `fqdn`, mapping it to `ip` in `/etc/hosts`.
    ///
    /// Runs as one `&&`-joined command so `sudo` never sees a half-renamed
    /// host. A name without a leading label is rejected before anything is
    /// sent; otherwise cached host names and options are dropped whatever the
    /// outcome.
    pub fn change_hostname(&mut self, fqdn: &str, ip: Option<&str>) -> Result<String> {
        let fqdn = fqdn.trim();
        if fqdn.split('.').next().is_none_or(str::is_empty) {
            return Err(Error::Validation(format!("invalid host name {fqdn:?}")));
        }
        let result = self.run(&hostname_commands(fqdn, ip), &ExecOptions::default());
        self.remote_hostname = None;
        self.endpoint_mut().invalidate();
        result
    }
}

/// Command that writes the new name everywhere a Debian-style host keeps it.
pub fn hostname_commands(fqdn: &str, ip: Option<&str>) -> String {
    let ip = ip.unwrap_or(DEFAULT_HOSTNAME_IP);
    let name = fqdn.split('.').next().unwrap_or(fqdn);
    [
        format!("echo \"{name}\" > /etc/hostname"),
        format!("[ -f {ETC_HOSTS}.orig ] || cp {ETC_HOSTS} {ETC_HOSTS}.orig"),
        format!("perl -i.bak -ne \"print unless /^{ip}/\" {ETC_HOSTS}"),
        format!("echo \"{ip} {fqdn} {name}\" >> {ETC_HOSTS}"),
        format!("hostname {name}"),
    ]
    .join("&&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssh::test_support::transport;

    #[test]
    fn test_hostname_commands() {
        let cmd = hostname_commands("db1.fleet.example.com", None);
        assert_eq!(
            cmd,
            "echo \"db1\" > /etc/hostname&&\
             [ -f /etc/hosts.orig ] || cp /etc/hosts /etc/hosts.orig&&\
             perl -i.bak -ne \"print unless /^127.0.1.1/\" /etc/hosts&&\
             echo \"127.0.1.1 db1.fleet.example.com db1\" >> /etc/hosts&&\
             hostname db1"
        );
    }

    #[test]
    fn test_remote_hostname_cached() {
        let (mut t, runner) = transport("ubuntu", true);
        runner.reply("web1.internal\n");
        assert_eq!(t.remote_hostname().unwrap(), "web1.internal");
        assert_eq!(t.remote_hostname().unwrap(), "web1.internal");
        assert_eq!(runner.commands().len(), 1);
    }

    #[test]
    fn test_change_hostname_invalidates_caches() {
        let (mut t, runner) = transport("ubuntu", true);
        runner.reply("old\n");
        t.remote_hostname().unwrap();
        t.change_hostname("new.example.com", Some("10.1.1.1")).unwrap();
        assert!(!t.endpoint().has_cached_host());
        assert!(!t.endpoint().has_cached_options());

        runner.reply("new.example.com\n");
        assert_eq!(t.remote_hostname().unwrap(), "new.example.com");
        let sent = runner.commands();
        assert_eq!(sent.len(), 3);
        assert!(sent[1].contains("sudo sh -c"));
        assert!(sent[1].contains("10.1.1.1 new.example.com new"));
    }

    #[test]
    fn test_change_hostname_clears_cache_on_failure() {
        let (mut t, _) = transport("ubuntu", false);
        assert!(t.change_hostname("x.example.com", None).is_err());
        assert!(!t.endpoint().has_cached_host());
    }

    #[test]
    fn test_change_hostname_rejects_empty_name() {
        let (mut t, runner) = transport("ubuntu", true);
        for fqdn in ["", "   ", ".example.com"] {
            let err = t.change_hostname(fqdn, None).unwrap_err();
            assert!(err.is_validation());
        }
        assert!(runner.commands().is_empty());
    }
}
