//! Remote executor implementations for candia
//!
//! This crate provides implementations of the `RemoteExecutor` trait for:
//!
//! - OpenSSH (the system `ssh` client, run in batch mode)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod ssh;

pub use config::{ConfigValidationError, HostKeyPolicy, SshConfig};
pub use ssh::{SshExecutor, classify_failure};
