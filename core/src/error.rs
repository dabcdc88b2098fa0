//! Error types for candia-core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failure, shared by host-level and run-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Could not reach the host (DNS, refused, unroutable)
    Connection,
    /// The host rejected our credentials
    Authentication,
    /// Connected, but the remote session could not be opened or broke
    Session,
    /// The host did not finish within its deadline
    Timeout,
    /// The run was interrupted before the host finished
    Cancelled,
    /// Configuration that makes the whole run impossible
    Config,
    /// The host task died unexpectedly
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Connection => "connection",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Session => "session",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} error: {message}")]
pub struct BenchError {
    /// What went wrong
    pub kind: ErrorKind,
    /// Human readable detail
    pub message: String,
}

impl BenchError {
    /// Create an error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Invalid configuration
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// A required builder field was never set
    pub fn missing_config(field: &str) -> Self {
        Self::config(format!("missing required field: {field}"))
    }

    /// The fan-out itself could not proceed
    pub fn orchestration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// A failure reported by the remote executor
    pub fn remote(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message)
    }

    /// The run was shut down while waiting
    pub fn shutdown() -> Self {
        Self::new(ErrorKind::Cancelled, "shutdown in progress")
    }
}

/// Result type alias
pub type BenchResult<T> = std::result::Result<T, BenchError>;
