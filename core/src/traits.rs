//! The remote execution seam
//!
//! The core never opens connections itself. It hands a target and a command to
//! a [`RemoteExecutor`] and gets back captured output or a [`RemoteError`].
//! Implementations live in their own crates (`remote/`).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::host::HostTarget;

// ============================================================================
// Remote Executor Trait
// ============================================================================

/// Runs one command on one host over a secure channel
///
/// Implementations own authentication, transport and session lifecycle. They
/// must not retry, and they must release the session when the returned future
/// is dropped so that a caller-side timeout tears the connection down.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Executor identifier (e.g., "ssh")
    fn name(&self) -> &str;

    /// Run `command` on `target` and capture its output
    ///
    /// A non-zero exit status is not an error: the output is still returned
    /// with [`CommandOutput::exit_code`] set.
    async fn execute(&self, target: &HostTarget, command: &str)
    -> Result<CommandOutput, RemoteError>;
}

/// Which stream of the remote process carries the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    /// Standard output
    Stdout,
    /// Standard error (siege prints its summary here)
    #[default]
    Stderr,
    /// Standard error followed by standard output
    Both,
}

impl std::str::FromStr for OutputStream {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdout" => Ok(OutputStream::Stdout),
            "stderr" => Ok(OutputStream::Stderr),
            "both" => Ok(OutputStream::Both),
            other => Err(format!(
                "unknown output stream {other:?} (expected stdout, stderr or both)"
            )),
        }
    }
}

/// Captured result of a remote command that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
    /// Exit status, `None` if the remote process was killed by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Build output from raw captured bytes
    pub fn from_bytes(stdout: &[u8], stderr: &[u8], exit_code: Option<i32>) -> Self {
        Self {
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
            exit_code,
        }
    }

    /// Whether the remote command exited with status 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Text the extractor should read, according to `stream`
    pub fn report_text(&self, stream: OutputStream) -> std::borrow::Cow<'_, str> {
        match stream {
            OutputStream::Stdout => self.stdout.as_str().into(),
            OutputStream::Stderr => self.stderr.as_str().into(),
            OutputStream::Both => format!("{}\n{}", self.stderr, self.stdout).into(),
        }
    }
}

/// Failures raised by a remote executor
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The host could not be reached
    #[error("connection failed: {0}")]
    Connect(String),

    /// The host refused our credentials
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The session or command channel could not be opened or broke
    #[error("session failed: {0}")]
    Session(String),

    /// The executor gave up waiting
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Local I/O error (e.g. spawning the client)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The executor is misconfigured
    #[error("configuration error: {0}")]
    Config(String),
}

impl RemoteError {
    /// Convert to ErrorKind for failure classification
    pub fn to_error_kind(&self) -> ErrorKind {
        match self {
            RemoteError::Connect(_) => ErrorKind::Connection,
            RemoteError::Auth(_) => ErrorKind::Authentication,
            RemoteError::Session(_) | RemoteError::Io(_) => ErrorKind::Session,
            RemoteError::Timeout(_) => ErrorKind::Timeout,
            RemoteError::Config(_) => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_to_error_kind() {
        assert_eq!(
            RemoteError::Connect("refused".into()).to_error_kind(),
            ErrorKind::Connection
        );
        assert_eq!(
            RemoteError::Auth("denied".into()).to_error_kind(),
            ErrorKind::Authentication
        );
        assert_eq!(
            RemoteError::Session("channel closed".into()).to_error_kind(),
            ErrorKind::Session
        );
        assert_eq!(
            RemoteError::Timeout(Duration::from_secs(3)).to_error_kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            RemoteError::Io(std::io::Error::other("spawn")).to_error_kind(),
            ErrorKind::Session
        );
        assert_eq!(
            RemoteError::Config("bad".into()).to_error_kind(),
            ErrorKind::Config
        );
    }

    #[test]
    fn test_report_text_selects_stream() {
        let out = CommandOutput::from_bytes(b"out", b"err", Some(1));
        assert_eq!(out.report_text(OutputStream::Stdout), "out");
        assert_eq!(out.report_text(OutputStream::Stderr), "err");
        assert_eq!(out.report_text(OutputStream::Both), "err\nout");
        assert!(!out.success());
    }

    #[test]
    fn test_output_stream_from_str() {
        assert_eq!("STDOUT".parse::<OutputStream>(), Ok(OutputStream::Stdout));
        assert_eq!("stderr".parse::<OutputStream>(), Ok(OutputStream::Stderr));
        assert_eq!("both".parse::<OutputStream>(), Ok(OutputStream::Both));
        assert!("pipe".parse::<OutputStream>().is_err());
    }

    #[test]
    fn test_output_stream_default_is_stderr() {
        assert_eq!(OutputStream::default(), OutputStream::Stderr);
    }
}
