//! CLI argument definitions for connwatch-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Connwatch network connection monitoring daemon.
///
/// Tails the Zeek `conn.log`, classifies every connection record with a
/// rule model, and reports malicious verdicts to the console log.
#[derive(Parser, Debug)]
#[command(name = "connwatch-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to connwatch.toml configuration file.
    #[arg(short, long, default_value = "/etc/connwatch/connwatch.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,

    /// Override PID file path (takes precedence over config file).
    #[arg(long)]
    pub pid_file: Option<String>,
}
