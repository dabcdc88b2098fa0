//! Host targets and host-list merging

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};

/// One remote machine the command runs on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostTarget {
    /// Hostname or IP address
    pub address: String,
    /// SSH port
    pub port: u16,
    /// Remote user
    pub username: String,
    /// Private key used to authenticate
    pub identity: PathBuf,
}

impl HostTarget {
    /// Create a target with explicit connection parameters
    pub fn new(
        address: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        identity: impl Into<PathBuf>,
    ) -> Self {
        Self {
            address: address.into(),
            port,
            username: username.into(),
            identity: identity.into(),
        }
    }
}

impl std::fmt::Display for HostTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.address, self.port)
    }
}

/// Connection parameters applied to hosts that do not override them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDefaults {
    /// Remote user
    pub username: String,
    /// SSH port
    pub port: u16,
    /// Private key path (may start with `~`)
    pub identity: PathBuf,
}

impl Default for HostDefaults {
    fn default() -> Self {
        Self {
            username: "root".to_string(),
            port: 22,
            identity: PathBuf::from("~/.ssh/id_rsa"),
        }
    }
}

/// Ordered list of host targets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostList {
    targets: Vec<HostTarget>,
}

impl HostList {
    /// Merge hosts given as flags with hosts read from an input stream
    ///
    /// Flag hosts come first. Input is one host per line; blank lines and
    /// lines starting with `#` are skipped. Each entry may be
    /// `[user@]address[:port]`, overriding the defaults for that host.
    /// Duplicates are kept.
    pub fn merge(
        flag_hosts: &[String],
        input: Option<&str>,
        defaults: &HostDefaults,
    ) -> BenchResult<Self> {
        let from_input = input
            .into_iter()
            .flat_map(str::lines)
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));

        let targets = flag_hosts
            .iter()
            .map(|s| s.trim())
            .chain(from_input)
            .map(|entry| parse_host_entry(entry, defaults))
            .collect::<BenchResult<Vec<_>>>()?;

        Ok(Self { targets })
    }

    /// Number of hosts
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True when there are no hosts
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Borrow the targets
    pub fn targets(&self) -> &[HostTarget] {
        &self.targets
    }
}

fn parse_host_entry(entry: &str, defaults: &HostDefaults) -> BenchResult<HostTarget> {
    let (username, rest) = match entry.split_once('@') {
        Some((user, rest)) if !user.is_empty() => (user.to_string(), rest),
        Some(_) => return Err(BenchError::config(format!("empty user in host {entry:?}"))),
        None => (defaults.username.clone(), entry),
    };

    // Bracketed IPv6 literals carry their own colons.
    let (address, port) = if let Some(inner) = rest.strip_prefix('[') {
        let (addr, tail) = inner
            .split_once(']')
            .ok_or_else(|| BenchError::config(format!("unterminated '[' in host {entry:?}")))?;
        let port = match tail.strip_prefix(':') {
            Some(p) => parse_port(p, entry)?,
            None if tail.is_empty() => defaults.port,
            None => return Err(BenchError::config(format!("invalid host {entry:?}"))),
        };
        (addr.to_string(), port)
    } else {
        match rest.rsplit_once(':') {
            Some((addr, p)) if !addr.contains(':') => (addr.to_string(), parse_port(p, entry)?),
            // No colon, or a bare IPv6 address without a port.
            _ => (rest.to_string(), defaults.port),
        }
    };

    if address.is_empty() {
        return Err(BenchError::config(format!("empty address in host {entry:?}")));
    }

    // The client would read these as options, not as the destination
    if username.starts_with('-') || address.starts_with('-') {
        return Err(BenchError::config(format!(
            "host {entry:?} must not start a user or address with '-'"
        )));
    }

    Ok(HostTarget {
        address,
        port,
        username,
        identity: defaults.identity.clone(),
    })
}

fn parse_port(raw: &str, entry: &str) -> BenchResult<u16> {
    raw.parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| BenchError::config(format!("invalid port {raw:?} in host {entry:?}")))
}

/// Expand `~` in an identity path and make sure the key is readable
///
/// An unreadable identity prevents every host from being attempted, so this
/// is a configuration error rather than a per-host failure.
pub fn resolve_identity(path: &Path) -> BenchResult<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = PathBuf::from(shellexpand::tilde(raw.as_ref()).into_owned());

    std::fs::File::open(&expanded).map_err(|e| {
        BenchError::config(format!(
            "identity file {} is not readable: {e}",
            expanded.display()
        ))
    })?;

    Ok(expanded)
}
