//! `ssh` option sets
//!
//! Options are kept as ordered flag/value pairs. Merging replaces a flag's
//! value in place, so `-i` from the caller overrides the default identity
//! file without moving it.

use std::fmt;
use std::path::Path;

/// Default host key policy for freshly created nodes.
pub const NO_STRICT_HOST_KEYS: &str = "StrictHostKeyChecking=no";

/// Ordered `ssh` flag/value pairs, e.g. `-i key -o StrictHostKeyChecking=no`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshOptions {
    entries: Vec<(String, String)>,
}

impl SshOptions {
    /// Create an empty option set
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity file plus disabled strict host key checking.
    pub fn defaults(key_path: &Path) -> Self {
        Self::new()
            .with("-i", key_path.display().to_string())
            .with("-o", NO_STRICT_HOST_KEYS)
    }

    /// Set a flag, replacing any existing value for it.
    pub fn set(&mut self, flag: impl Into<String>, value: impl Into<String>) {
        let flag = flag.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == flag) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((flag, value)),
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(flag, value);
        self
    }

    /// Merge `overrides` over these options; overrides win per flag.
    pub fn merge(&mut self, overrides: &SshOptions) {
        for (flag, value) in &overrides.entries {
            self.set(flag.clone(), value.clone());
        }
    }

    /// Value for a flag, if set
    pub fn get(&self, flag: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| f == flag)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a command-line fragment.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(flag, value)| format!("{flag} {value}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for SshOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SshOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (flag, value) in iter {
            options.set(flag, value);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = SshOptions::defaults(Path::new("/keys/fleet.pem"));
        assert_eq!(opts.render(), "-i /keys/fleet.pem -o StrictHostKeyChecking=no");
    }

    #[test]
    fn test_overrides_win_per_key() {
        let mut opts = SshOptions::defaults(Path::new("/keys/fleet.pem"));
        let overrides: SshOptions = [("-i", "/keys/other.pem"), ("-p", "2222")]
            .into_iter()
            .collect();
        opts.merge(&overrides);
        assert_eq!(
            opts.render(),
            "-i /keys/other.pem -o StrictHostKeyChecking=no -p 2222"
        );
        assert_eq!(opts.get("-o"), Some(NO_STRICT_HOST_KEYS));
    }

    #[test]
    fn test_empty_renders_nothing() {
        assert_eq!(SshOptions::new().render(), "");
        assert!(SshOptions::new().is_empty());
    }
}
