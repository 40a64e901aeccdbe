//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table as TextTable, Tabled};

use crate::config::{TableManifest, ValidationResult};
use crate::planner::{ReplicaChange, ReplicaDiff};
use crate::reconciler::{DeleteOutcome, DeletePreview, DeletionReport};
use crate::resource::{remote_phase, RemotePhase, Table};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Replica row for status display.
#[derive(Tabled)]
struct ReplicaRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Read capacity")]
    read_capacity: String,
}

/// Replica change row for delete previews.
#[derive(Tabled)]
struct ReplicaChangeRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Region")]
    region: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(&self, manifest: &TableManifest, result: &ValidationResult) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "table": manifest.table_name(),
                "valid": result.is_valid(),
                "errors": result.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "warnings": result.warnings,
            }))
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();

                if result.is_valid() {
                    let _ = writeln!(output, "{} Manifest is valid", "✓".green());
                } else {
                    let _ = writeln!(
                        output,
                        "{} Manifest has {} error(s):",
                        "✗".red(),
                        result.error_count()
                    );
                    for error in &result.errors {
                        let _ = writeln!(output, "   - {error}");
                    }
                }

                if result.warning_count() > 0 {
                    let _ = writeln!(output, "\n{} Warnings:", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }

                let replicas = manifest.spec.replicas.as_ref().map_or(0, Vec::len);
                let _ = write!(
                    output,
                    "\nManifest summary:\n   Resource: {}\n   Table: {}\n   Replicas: {replicas}\n",
                    manifest.metadata.name,
                    manifest.table_name()
                );

                output
            }
        }
    }

    /// Formats the observed state of a table.
    #[must_use]
    pub fn format_status(&self, table_name: &str, observed: Option<&Table>) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "table": table_name,
                "exists": observed.is_some(),
                "phase": observed.map(|t| remote_phase(&t.status)),
                "observed": observed,
            }))
            .unwrap_or_default(),
            OutputFormat::Text => {
                let Some(table) = observed else {
                    return format!("\nTable {table_name}: {}\n", "not found".dimmed());
                };

                let mut output = String::new();
                let _ = write!(
                    output,
                    "\nTable {table_name}: {}\n",
                    Self::format_phase(remote_phase(&table.status))
                );
                if let Some(arn) = &table.status.table_arn {
                    let _ = writeln!(output, "   ARN: {arn}");
                }
                if let Some(items) = table.status.item_count {
                    let _ = writeln!(output, "   Items: {items}");
                }

                if table.has_replicas() {
                    let rows: Vec<ReplicaRow> = table
                        .replicas()
                        .iter()
                        .map(|r| ReplicaRow {
                            region: r.region_name.clone(),
                            status: table
                                .replica_status(&r.region_name)
                                .map_or_else(|| String::from("unknown"), |s| s.to_string()),
                            read_capacity: r
                                .read_capacity_override()
                                .map_or_else(|| String::from("inherited"), |u| u.to_string()),
                        })
                        .collect();
                    output.push('\n');
                    output.push_str(&TextTable::new(rows).to_string());
                    output.push('\n');
                } else {
                    output.push_str("   No replicas.\n");
                }

                output
            }
        }
    }

    /// Formats a delete preview.
    #[must_use]
    pub fn format_preview(&self, preview: &DeletePreview) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(preview).unwrap_or_default(),
            OutputFormat::Text => {
                if !preview.exists {
                    return format!(
                        "{} Table {} does not exist - nothing to delete.\n",
                        "✓".green(),
                        preview.table_name
                    );
                }

                let mut output = format!("\nDelete plan for {}\n", preview.table_name);

                if let Some(reason) = preview.requeue {
                    let _ = writeln!(output, "{} Delete would be requeued: {reason}", "⏸".yellow());
                    return output;
                }

                let rows: Vec<ReplicaChangeRow> = preview
                    .replica_diff
                    .actionable_diffs()
                    .into_iter()
                    .enumerate()
                    .map(|(i, d)| ReplicaChangeRow {
                        index: i + 1,
                        action: Self::format_change(d),
                        region: d.region_name.clone(),
                    })
                    .collect();

                if !rows.is_empty() {
                    output.push_str(&TextTable::new(rows).to_string());
                    output.push('\n');
                }

                let _ = write!(
                    output,
                    "\nPlan: {} replica(s) to remove, then {} table\n",
                    preview.replica_diff.deletes.to_string().red(),
                    "delete".red()
                );

                output
            }
        }
    }

    /// Formats the outcome of a single delete pass.
    #[must_use]
    pub fn format_outcome(&self, table_name: &str, outcome: &DeleteOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "table": table_name,
                "result": outcome,
            }))
            .unwrap_or_default(),
            OutputFormat::Text => {
                let marker = match outcome {
                    DeleteOutcome::Gone | DeleteOutcome::DeleteIssued => "✓".green(),
                    DeleteOutcome::Requeue { .. } => "⏸".yellow(),
                };
                format!("{marker} {table_name}: {outcome}\n")
            }
        }
    }

    /// Formats a deletion report.
    #[must_use]
    pub fn format_report(&self, report: &DeletionReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = format!("{} Table {} deleted\n\n", "✓".green(), report.table_name);
                let _ = writeln!(output, "   Passes: {}", report.passes);
                let _ = writeln!(output, "   Requeues: {}", report.total_requeues());
                for (reason, count) in &report.requeues {
                    let _ = writeln!(output, "     {count}x {reason}");
                }
                if let Some(finished) = report.finished_at {
                    let _ = writeln!(
                        output,
                        "   Finished: {}",
                        finished.format("%Y-%m-%d %H:%M:%S UTC")
                    );
                }

                if !report.errors.is_empty() {
                    let _ = write!(output, "\n{} Recovered errors:\n", "⚠".yellow());
                    for error in &report.errors {
                        let _ = writeln!(output, "   - {error}");
                    }
                }

                output
            }
        }
    }

    /// Formats a replica change with color.
    fn format_change(diff: &ReplicaDiff) -> String {
        match diff.change {
            ReplicaChange::Create => "+add".green().to_string(),
            ReplicaChange::Update => "~update".yellow().to_string(),
            ReplicaChange::Delete => "-remove".red().to_string(),
            ReplicaChange::NoChange => "noop".dimmed().to_string(),
        }
    }

    /// Formats a remote phase with color.
    fn format_phase(phase: RemotePhase) -> String {
        match phase {
            RemotePhase::Active => "active".green().to_string(),
            RemotePhase::Creating | RemotePhase::Updating => phase.to_string().yellow().to_string(),
            RemotePhase::Deleting => "deleting".red().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{compute_replica_diff, RequeueReason};
    use crate::resource::{Replica, TableSpec, TableStatusValue};

    fn observed() -> Table {
        let mut table = Table::new(TableSpec {
            table_name: String::from("orders"),
            replicas: Some(vec![Replica::new("eu-west-1").with_read_capacity(7)]),
            ..TableSpec::default()
        });
        table.status.table_status = Some(TableStatusValue::Active);
        table.status.item_count = Some(42);
        table
    }

    fn preview(requeue: Option<RequeueReason>) -> DeletePreview {
        let table = observed();
        let mut desired = table.clone();
        desired.spec.replicas = None;
        DeletePreview {
            table_name: String::from("orders"),
            exists: true,
            phase: Some(RemotePhase::Active),
            table_arn: None,
            item_count: Some(42),
            replica_diff: compute_replica_diff(&desired, &table),
            requeue,
        }
    }

    #[test]
    fn test_status_text_lists_replicas() {
        let table = observed();
        let text = OutputFormatter::new(OutputFormat::Text).format_status("orders", Some(&table));

        assert!(text.contains("Items: 42"));
        assert!(text.contains("eu-west-1"));
        assert!(text.contains("Read capacity"));
    }

    #[test]
    fn test_status_json_for_missing_table() {
        let json = OutputFormatter::new(OutputFormat::Json).format_status("orders", None);
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["exists"], serde_json::Value::Bool(false));
        assert!(value["observed"].is_null());
    }

    #[test]
    fn test_preview_text_shows_removals() {
        let text = OutputFormatter::new(OutputFormat::Text).format_preview(&preview(None));

        assert!(text.contains("Delete plan for orders"));
        assert!(text.contains("eu-west-1"));
        assert!(text.contains("replica(s) to remove"));
    }

    #[test]
    fn test_preview_text_for_busy_table() {
        let text = OutputFormatter::new(OutputFormat::Text)
            .format_preview(&preview(Some(RequeueReason::WaitWhileUpdating)));

        assert!(text.contains("table in 'UPDATING' state"));
        assert!(!text.contains("to remove"));
    }

    #[test]
    fn test_outcome_json_is_tagged() {
        let json = OutputFormatter::new(OutputFormat::Json)
            .format_outcome("orders", &DeleteOutcome::DeleteIssued);
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["result"]["outcome"], "delete_issued");
    }
}
