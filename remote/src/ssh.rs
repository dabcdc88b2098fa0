//! Remote execution over the system OpenSSH client
//!
//! Each call spawns one `ssh` process in batch mode. The process is killed
//! when the returned future is dropped, so a caller-side timeout tears the
//! session down.

use std::ffi::OsString;
use std::process::Stdio;

use async_trait::async_trait;
use candia_core::{CommandOutput, HostTarget, RemoteError, RemoteExecutor};
use tokio::process::Command;

use crate::config::SshConfig;

/// Exit status OpenSSH reserves for its own failures
const SSH_FAILURE_STATUS: i32 = 255;

/// Diagnostics that mean the host was never reached
const CONNECT_MARKERS: &[&str] = &[
    "Connection refused",
    "timed out",
    "Could not resolve hostname",
    "No route to host",
    "Network is unreachable",
    "Connection closed by remote host",
];

/// Diagnostics that mean the host rejected our credentials
const AUTH_MARKERS: &[&str] = &[
    "Permission denied",
    "Too many authentication failures",
];

/// Runs commands through the `ssh` binary
#[derive(Debug, Clone)]
pub struct SshExecutor {
    config: SshConfig,
}

impl SshExecutor {
    /// Create an executor, validating the configuration
    pub fn new(config: SshConfig) -> Result<Self, RemoteError> {
        config
            .validate()
            .map_err(|e| RemoteError::Config(e.to_string()))?;
        Ok(Self { config })
    }

    /// Get the executor configuration
    pub fn config(&self) -> &SshConfig {
        &self.config
    }

    /// Arguments passed to the client for one invocation
    ///
    /// `-- command` is passed as a single argument; the remote shell splits it.
    pub fn build_args(&self, target: &HostTarget, command: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let mut option = |value: String| {
            args.push("-o".into());
            args.push(value.into());
        };

        option("BatchMode=yes".to_string());
        option(format!(
            "ConnectTimeout={}",
            self.config.connect_timeout.as_secs().max(1)
        ));
        for policy_option in self.config.host_key_policy.ssh_options() {
            option((*policy_option).to_string());
        }
        for extra in &self.config.extra_options {
            option(extra.clone());
        }

        args.push("-i".into());
        args.push(target.identity.clone().into_os_string());
        args.push("-p".into());
        args.push(target.port.to_string().into());
        args.push(format!("{}@{}", target.username, target.address).into());
        args.push("--".into());
        args.push(command.into());
        args
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    fn name(&self) -> &str {
        "ssh"
    }

    async fn execute(
        &self,
        target: &HostTarget,
        command: &str,
    ) -> Result<CommandOutput, RemoteError> {
        tracing::debug!(host = %target, program = %self.config.program, "Opening ssh session");

        let output = Command::new(&self.config.program)
            .args(self.build_args(target, command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => RemoteError::Config(format!(
                    "ssh client {:?} not found",
                    self.config.program
                )),
                _ => RemoteError::Io(e),
            })?;

        let exit_code = output.status.code();
        if exit_code == Some(SSH_FAILURE_STATUS) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&stderr));
        }

        // Even if the command fails, its report is still usable
        Ok(CommandOutput::from_bytes(
            &output.stdout,
            &output.stderr,
            exit_code,
        ))
    }
}

/// Map OpenSSH diagnostics printed with exit status 255 to a failure class
///
/// A remote command that itself exits 255 is indistinguishable from a client
/// failure and lands in `Session`.
pub fn classify_failure(stderr: &str) -> RemoteError {
    let message = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("ssh exited with status 255")
        .to_string();

    if AUTH_MARKERS.iter().any(|m| stderr.contains(m)) {
        RemoteError::Auth(message)
    } else if CONNECT_MARKERS.iter().any(|m| stderr.contains(m)) {
        RemoteError::Connect(message)
    } else {
        RemoteError::Session(message)
    }
}
