//! CLI arguments and subcommands for procsnap.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Snapshot output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "procsnap",
    about = "Point-in-time CPU, memory, disk and network snapshot from /proc",
    long_about = "Point-in-time CPU, memory, disk and network snapshot from /proc.\n\n\
                  Reads kernel pseudo-files and statvfs(2) under a shared deadline and prints \
                  one structured record per snapshot. Domains that fail are reported on stderr \
                  while the rest of the snapshot is still printed.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides config)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Root of the proc filesystem
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Deadline for one snapshot in milliseconds
    #[arg(short = 't', long)]
    pub timeout_ms: Option<u64>,

    /// Collect domains concurrently
    #[arg(long, conflicts_with = "sequential")]
    pub parallel: bool,

    /// Collect domains one after another
    #[arg(long, conflicts_with = "parallel")]
    pub sequential: bool,

    /// Worker threads for parallel collection (0 = auto)
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Read buffer size (KB) for /proc readers
    #[arg(long)]
    pub io_buffer_kb: Option<usize>,

    /// Number of snapshots to take
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Seconds between snapshots when --count > 1
    #[arg(short = 'i', long)]
    pub interval: Option<u64>,

    /// Snapshot output format
    #[arg(short = 'o', long, value_enum)]
    pub output: Option<OutputFormat>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration, pseudo-file access and one full snapshot
    Check {
        /// Only check source access, do not take a snapshot
        #[arg(long)]
        sources_only: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}
