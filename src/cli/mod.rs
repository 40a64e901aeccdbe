//! CLI module for the table controller.
//!
//! This module provides the command-line interface for inspecting and
//! deleting managed `DynamoDB` tables.

mod commands;
mod output;

pub use commands::{Cli, Commands, LogFormat, OutputFormat};
pub use output::OutputFormatter;
