//! CLI argument parsing and run wiring

use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use candia_core::{
    FleetConfig, HostDefaults, HostList, OrchestratorBuilder, OutputStream, resolve_identity,
};
use candia_remote::{HostKeyPolicy, SshConfig, SshExecutor};
use candia_report::{JsonExporter, TableRenderer};
use clap::Parser;

/// Exit status when no host produced a report
const EXIT_ALL_FAILED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "candia")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Hosts may also be piped on stdin, one [user@]address[:port] per line.")]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// SSH identity file (private key)
    #[arg(long, default_value = "~/.ssh/id_rsa", env = "CANDIA_SSH_KEY")]
    pub ssh_key: PathBuf,

    /// SSH username
    #[arg(long, default_value = "root", env = "CANDIA_SSH_USER")]
    pub ssh_user: String,

    /// SSH port
    #[arg(long, default_value_t = 22)]
    pub ssh_port: u16,

    /// SSH host address, repeatable
    #[arg(long = "ssh-addr", value_name = "ADDR")]
    pub ssh_addr: Vec<String>,

    /// Extra `-o Key=Value` option for the ssh client, repeatable
    #[arg(long = "ssh-option", value_name = "OPTION")]
    pub ssh_option: Vec<String>,

    /// SSH client binary
    #[arg(long, default_value = "ssh")]
    pub ssh_program: String,

    /// Host key policy: strict, accept_new or insecure_accept_any
    #[arg(long, default_value_t = HostKeyPolicy::AcceptNew)]
    pub host_key_policy: HostKeyPolicy,

    /// Seconds allowed for connecting to each host
    #[arg(long, default_value_t = 30)]
    pub connect_timeout: u64,

    /// Maximum hosts in flight (default: all at once)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Maximum new SSH sessions per second
    #[arg(long)]
    pub connect_rate: Option<f64>,

    /// Seconds allowed for each host to finish
    #[arg(long, default_value_t = 3600)]
    pub timeout: u64,

    /// Remote stream that carries the report: stdout, stderr or both
    #[arg(long, default_value = "stderr")]
    pub stream: OutputStream,

    /// Load generator to run on every host
    #[arg(long, default_value = "siege")]
    pub program: String,

    /// Also write the report as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Do not read hosts from stdin
    #[arg(long)]
    pub no_stdin: bool,

    /// Arguments passed to the load generator
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl Cli {
    /// Remote command line: program followed by its quoted arguments
    pub fn remote_command(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|a| shell_quote(a)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Fleet settings taken from the flags
    pub fn fleet_config(&self) -> FleetConfig {
        let mut config = FleetConfig::new()
            .with_host_timeout(Duration::from_secs(self.timeout))
            .with_report_stream(self.stream);
        config.concurrency = self.concurrency;
        config.connect_rate = self.connect_rate;
        config
    }

    /// SSH client settings taken from the flags
    pub fn ssh_config(&self) -> SshConfig {
        self.ssh_option.iter().fold(
            SshConfig::new()
                .with_program(&self.ssh_program)
                .with_connect_timeout(Duration::from_secs(self.connect_timeout))
                .with_host_key_policy(self.host_key_policy),
            |config, option| config.with_option(option),
        )
    }
}

/// Quote `arg` for a POSIX shell unless it is plainly safe
fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Hosts piped on stdin, if stdin is not a terminal
fn read_stdin_hosts(disabled: bool) -> Result<Option<String>> {
    let stdin = std::io::stdin();
    if disabled || stdin.is_terminal() {
        return Ok(None);
    }

    let mut buf = String::new();
    stdin
        .lock()
        .read_to_string(&mut buf)
        .context("failed to read hosts from stdin")?;
    Ok(Some(buf))
}

/// Resolve configuration, run every host, and print the report
pub async fn run(cli: Cli) -> Result<ExitCode> {
    // Configuration problems stop the run before any host is attempted
    let identity = resolve_identity(&cli.ssh_key)?;
    let defaults = HostDefaults {
        username: cli.ssh_user.clone(),
        port: cli.ssh_port,
        identity,
    };

    let stdin_hosts = read_stdin_hosts(cli.no_stdin)?;
    let hosts = HostList::merge(&cli.ssh_addr, stdin_hosts.as_deref(), &defaults)?;
    if hosts.is_empty() {
        bail!("no hosts given: use --ssh-addr or pipe one host per line on stdin");
    }

    if cli.host_key_policy == HostKeyPolicy::InsecureAcceptAny {
        tracing::warn!("Host keys are not verified; any machine can impersonate a host");
    }

    let executor = SshExecutor::new(cli.ssh_config())?;
    let orchestrator = OrchestratorBuilder::new()
        .config(cli.fleet_config())
        .executor(Arc::new(executor))
        .build()?;

    let command = cli.remote_command();
    tracing::info!(hosts = hosts.len(), command = %command, "candia starting");

    let report = orchestrator
        .run_with_signal_handling(hosts.targets(), &command)
        .await?;

    TableRenderer::new().render(&report, &mut std::io::stdout().lock())?;

    if let Some(path) = &cli.json {
        JsonExporter::export(&report, path)?;
    }

    if report.all_failed() {
        return Ok(ExitCode::from(EXIT_ALL_FAILED));
    }
    Ok(ExitCode::SUCCESS)
}
