//! # smb-cli
//!
//! Command-line tools for sort-merge bucketed datasets.
//!
//! ## Commands
//!
//! - `smb inspect` - Decode a descriptor and show its attributes
//! - `smb check` - Check descriptors for partition compatibility
//! - `smb plan` - Show the bucket groups a merge reads
//! - `smb assign` - Compute bucket and shard for keys or records
//! - `smb new` - Write a canonical descriptor
//!
//! ## Configuration
//!
//! - `SMB_FORMAT` - Output format (`text`, `json`, `table`)
//! - `SMB_LOG_FORMAT` - Log format (`pretty`, `json`)
//! - `RUST_LOG` - Log verbosity (default: `warn`)

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod commands;

use clap::{Parser, Subcommand};
use smb_core::LogFormat;

/// smb CLI - sort-merge bucket descriptor tools.
#[derive(Debug, Parser)]
#[command(name = "smb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, env = "SMB_FORMAT", default_value = "text")]
    pub format: OutputFormat,

    /// Log output format (`pretty` or `json`).
    #[arg(long, global = true, env = "SMB_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            format: self.format.clone(),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decode a descriptor and show its attributes.
    Inspect(commands::inspect::InspectArgs),
    /// Check descriptors for partition compatibility.
    Check(commands::check::CheckArgs),
    /// Show which source buckets each merged bucket reads.
    Plan(commands::plan::PlanArgs),
    /// Compute bucket and shard for a key or for JSON records.
    Assign(commands::assign::AssignArgs),
    /// Write a canonical descriptor.
    New(commands::new::NewArgs),
}

/// Output format.
#[derive(Debug, Clone, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// Table output.
    Table,
}

/// CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Output format.
    pub format: OutputFormat,
}
