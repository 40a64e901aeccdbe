//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ddbctl - Delete reconciler for replicated `DynamoDB` tables.
#[derive(Parser, Debug)]
#[command(name = "ddbctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the table manifest.
    #[arg(short, long, global = true, env = "DDBCTL_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Log format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the table manifest.
    Validate {
        /// Treat warnings as errors.
        #[arg(long)]
        strict: bool,
    },

    /// Show the observed state of the remote table.
    Status,

    /// Show what a delete pass would do, without changing anything.
    PlanDelete,

    /// Delete the table, removing its replicas first.
    Delete {
        /// Run a single pass instead of waiting until the table is gone.
        #[arg(long)]
        once: bool,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,

        /// Override the maximum number of passes.
        #[arg(long)]
        max_passes: Option<u32>,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Log format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable log lines.
    #[default]
    Text,
    /// One JSON object per log line.
    Json,
}
