//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// rxmon: Wireless receiver fleet monitor
///
/// Polls a set of networked wireless-microphone receivers for link,
/// battery, and signal status, and logs connection changes.
#[derive(Debug, Parser)]
#[command(name = "rxmon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Receiver address to monitor, in dotted-quad IPv4 form (can be
    /// specified multiple times)
    #[arg(long = "receiver", short = 'r', value_name = "ADDR")]
    pub receivers: Vec<String>,

    /// Polling interval in seconds
    #[arg(long = "poll-interval")]
    pub poll_interval: Option<u64>,

    /// Per-attempt reply timeout in milliseconds
    #[arg(long = "timeout")]
    pub timeout_ms: Option<u64>,

    /// Consecutive failures before a receiver is reported disconnected
    #[arg(long = "disconnect-after")]
    pub disconnect_after: Option<u32>,

    /// Maximum number of concurrently monitored receivers
    #[arg(long = "max-devices")]
    pub max_devices: Option<usize>,

    /// Initial retry delay in seconds after a failed poll
    #[arg(long = "retry-delay")]
    pub retry_delay: Option<u64>,

    /// Maximum retry delay in seconds between failed polls
    #[arg(long = "retry-max-delay")]
    pub retry_max_delay: Option<u64>,

    /// UDP port receivers answer status queries on
    #[arg(long)]
    pub port: Option<u16>,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Path to state file for restoring the receiver list across runs
    #[arg(long = "state-file")]
    pub state_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for rxmon
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "rxmon.toml")]
        output: PathBuf,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
