//! SSH client configuration
//!
//! This module provides the host key policy enumeration and the settings
//! passed to every `ssh` invocation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// A required configuration field is missing.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A timeout value is out of acceptable range.
    #[error("invalid timeout: {0:?}")]
    InvalidTimeout(Duration),

    /// An extra option would override one the executor controls.
    #[error("option {0:?} is managed by the executor")]
    ReservedOption(String),
}

// ============================================================================
// Host Key Policy
// ============================================================================

/// How unknown or changed host keys are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostKeyPolicy {
    /// Only hosts already in `known_hosts` are accepted
    #[serde(rename = "strict")]
    Strict,
    /// New hosts are added to `known_hosts`; changed keys are refused
    #[default]
    #[serde(rename = "accept_new")]
    AcceptNew,
    /// Any key is accepted and nothing is recorded
    #[serde(rename = "insecure_accept_any")]
    InsecureAcceptAny,
}

impl HostKeyPolicy {
    /// Returns the identifier string for this policy.
    pub fn id(&self) -> &'static str {
        match self {
            HostKeyPolicy::Strict => "strict",
            HostKeyPolicy::AcceptNew => "accept_new",
            HostKeyPolicy::InsecureAcceptAny => "insecure_accept_any",
        }
    }

    /// OpenSSH `-o` options implementing this policy.
    pub fn ssh_options(&self) -> &'static [&'static str] {
        match self {
            HostKeyPolicy::Strict => &["StrictHostKeyChecking=yes"],
            HostKeyPolicy::AcceptNew => &["StrictHostKeyChecking=accept-new"],
            HostKeyPolicy::InsecureAcceptAny => &[
                "StrictHostKeyChecking=no",
                "UserKnownHostsFile=/dev/null",
                "LogLevel=ERROR",
            ],
        }
    }

    /// Returns all supported policies.
    pub fn all() -> &'static [HostKeyPolicy] {
        &[
            HostKeyPolicy::Strict,
            HostKeyPolicy::AcceptNew,
            HostKeyPolicy::InsecureAcceptAny,
        ]
    }
}

impl std::fmt::Display for HostKeyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for HostKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" | "yes" => Ok(HostKeyPolicy::Strict),
            "accept_new" | "accept-new" => Ok(HostKeyPolicy::AcceptNew),
            "insecure_accept_any" | "insecure-accept-any" | "insecure" | "no" => {
                Ok(HostKeyPolicy::InsecureAcceptAny)
            }
            _ => Err(format!("Unknown host key policy: {}", s)),
        }
    }
}

// ============================================================================
// SSH Configuration
// ============================================================================

/// Options the executor always sets itself.
const RESERVED_OPTIONS: &[&str] = &[
    "batchmode",
    "connecttimeout",
    "stricthostkeychecking",
    "userknownhostsfile",
];

/// Configuration for the SSH executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshConfig {
    /// Client binary to run
    #[serde(default = "default_program")]
    pub program: String,

    /// Time allowed for TCP connect and key exchange
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Host key verification policy
    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,

    /// Additional `-o Key=Value` options
    #[serde(default)]
    pub extra_options: Vec<String>,
}

fn default_program() -> String {
    "ssh".to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            connect_timeout: default_connect_timeout(),
            host_key_policy: HostKeyPolicy::default(),
            extra_options: Vec::new(),
        }
    }
}

impl SshConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the host key policy.
    pub fn with_host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }

    /// Add an extra `-o` option.
    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.extra_options.push(option.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.program.trim().is_empty() {
            return Err(ConfigValidationError::MissingField("program"));
        }

        // OpenSSH takes whole seconds
        if self.connect_timeout < Duration::from_secs(1)
            || self.connect_timeout > Duration::from_secs(300)
        {
            return Err(ConfigValidationError::InvalidTimeout(self.connect_timeout));
        }

        for option in &self.extra_options {
            let key = option
                .split(['=', ' '])
                .next()
                .unwrap_or_default()
                .to_lowercase();
            if RESERVED_OPTIONS.contains(&key.as_str()) {
                return Err(ConfigValidationError::ReservedOption(option.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_accept_new() {
        assert_eq!(HostKeyPolicy::default(), HostKeyPolicy::AcceptNew);
        assert_eq!(
            HostKeyPolicy::default().ssh_options(),
            &["StrictHostKeyChecking=accept-new"]
        );
    }

    #[test]
    fn test_policy_from_str() {
        for policy in HostKeyPolicy::all() {
            assert_eq!(policy.id().parse::<HostKeyPolicy>().unwrap(), *policy);
        }
        assert_eq!(
            "insecure".parse::<HostKeyPolicy>().unwrap(),
            HostKeyPolicy::InsecureAcceptAny
        );
        assert!("maybe".parse::<HostKeyPolicy>().is_err());
    }

    #[test]
    fn test_insecure_policy_skips_known_hosts() {
        let options = HostKeyPolicy::InsecureAcceptAny.ssh_options();
        assert!(options.contains(&"StrictHostKeyChecking=no"));
        assert!(options.contains(&"UserKnownHostsFile=/dev/null"));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SshConfig::default();
        assert_eq!(config.program, "ssh");
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_timeout() {
        let config = SshConfig::new().with_connect_timeout(Duration::from_millis(200));
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_validate_rejects_reserved_option() {
        let config = SshConfig::new().with_option("StrictHostKeyChecking=no");
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::ReservedOption(_))
        ));

        let config = SshConfig::new().with_option("ServerAliveInterval=15");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_program() {
        let config = SshConfig::new().with_program(" ");
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::MissingField("program"))
        );
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: SshConfig = serde_json::from_str(r#"{"host_key_policy":"strict"}"#).unwrap();
        assert_eq!(config.program, "ssh");
        assert_eq!(config.host_key_policy, HostKeyPolicy::Strict);
        assert!(config.extra_options.is_empty());
    }
}
