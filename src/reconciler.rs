//! Reconciler for table deletion.
//!
//! This module implements the delete path of the reconciliation loop: it
//! observes the remote table, asks the delete planner what to do, issues
//! the delete call, and maps every result to an outcome the caller can
//! schedule. Nothing observed on one pass is carried into the next.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::ControllerSettings;
use crate::dynamodb::TableClient;
use crate::error::{ControllerError, ReconcileError, Result};
use crate::planner::{
    compute_replica_diff, deferral_reason, replica_removal_in_flight, DeleteDecision,
    DeletePlanner, ReplicaDiffResult, RequeueReason,
};
use crate::resource::{remote_phase, RemotePhase, Table, TableSpec};

/// Reconciler driving a table toward deletion.
pub struct TableReconciler<'a, C: TableClient> {
    /// Remote table client.
    client: &'a C,
    /// Controller settings.
    settings: &'a ControllerSettings,
}

/// Result of one delete pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The table no longer exists.
    Gone,
    /// The table is busy; run another pass after `after`.
    Requeue {
        /// Why the pass stopped.
        reason: RequeueReason,
        /// Delay before the next pass.
        after: Duration,
    },
    /// The delete call was accepted.
    DeleteIssued,
}

/// What a delete pass would do, computed without mutating anything.
#[derive(Debug, Serialize)]
pub struct DeletePreview {
    /// Name of the remote table.
    pub table_name: String,
    /// Whether the table exists.
    pub exists: bool,
    /// Observed remote phase.
    pub phase: Option<RemotePhase>,
    /// Observed table ARN.
    pub table_arn: Option<String>,
    /// Approximate item count.
    pub item_count: Option<i64>,
    /// Replica changes made before the delete call.
    pub replica_diff: ReplicaDiffResult,
    /// Reason the pass would requeue instead of deleting.
    pub requeue: Option<RequeueReason>,
}

/// Summary of a `delete_until_gone` run.
#[derive(Debug, Serialize)]
pub struct DeletionReport {
    /// Name of the remote table.
    pub table_name: String,
    /// Number of passes made.
    pub passes: u32,
    /// Whether this run issued the delete call.
    pub delete_issued: bool,
    /// Number of requeues per reason.
    pub requeues: BTreeMap<RequeueReason, u32>,
    /// Errors from failed passes.
    pub errors: Vec<String>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the table was observed gone.
    pub finished_at: Option<DateTime<Utc>>,
}

impl<'a, C: TableClient> TableReconciler<'a, C> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(client: &'a C, settings: &'a ControllerSettings) -> Self {
        Self { client, settings }
    }

    /// Observes the remote table.
    ///
    /// The result carries the desired spec with the replica list replaced
    /// by the remote one, and the remote status. Returns `None` if the
    /// table does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be described.
    pub async fn observe(&self, spec: &TableSpec) -> Result<Option<Table>> {
        let description = match self.client.describe_table(&spec.table_name).await {
            Ok(description) => description,
            Err(err) if err.is_not_found() => {
                debug!("Table {} does not exist", spec.table_name);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let replicas = description.spec_replicas();
        let mut observed_spec = spec.clone();
        observed_spec.replicas = if replicas.is_empty() {
            None
        } else {
            Some(replicas)
        };
        if observed_spec.provisioned_throughput.is_none() {
            observed_spec.provisioned_throughput = description.provisioned_throughput;
        }

        Ok(Some(Table {
            spec: observed_spec,
            status: description.status(),
        }))
    }

    /// Runs one delete pass.
    ///
    /// # Errors
    ///
    /// Returns an error if observation, replica teardown, or the delete
    /// call fails for any reason other than the table being busy or gone.
    pub async fn reconcile_delete(&self, spec: &TableSpec) -> Result<DeleteOutcome> {
        let Some(observed) = self.observe(spec).await? else {
            info!("Table {} is gone", spec.table_name);
            return Ok(DeleteOutcome::Gone);
        };

        let ready = match DeletePlanner::new(self.client).plan_delete(&observed).await? {
            DeleteDecision::Requeue(reason) => return Ok(self.requeue(reason)),
            DeleteDecision::Proceed(ready) => ready,
        };

        info!("Deleting table {}", ready.name());
        match self.client.delete_table(ready.name()).await {
            Ok(()) => Ok(DeleteOutcome::DeleteIssued),
            Err(err) if err.is_in_use() => {
                warn!("Delete of {} rejected: {err}", ready.name());
                Ok(self.requeue(RequeueReason::TableInUse))
            }
            Err(err) if err.is_not_found() => {
                info!("Table {} disappeared before the delete call", ready.name());
                Ok(DeleteOutcome::Gone)
            }
            Err(err) => Err(err),
        }
    }

    /// Computes what a delete pass would do without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be described.
    pub async fn preview_delete(&self, spec: &TableSpec) -> Result<DeletePreview> {
        let Some(observed) = self.observe(spec).await? else {
            return Ok(DeletePreview {
                table_name: spec.table_name.clone(),
                exists: false,
                phase: None,
                table_arn: None,
                item_count: None,
                replica_diff: ReplicaDiffResult::default(),
                requeue: None,
            });
        };

        let mut desired = observed.clone();
        desired.spec.replicas = None;

        Ok(DeletePreview {
            table_name: spec.table_name.clone(),
            exists: true,
            phase: Some(remote_phase(&observed.status)),
            table_arn: observed.status.table_arn.clone(),
            item_count: observed.status.item_count,
            replica_diff: compute_replica_diff(&desired, &observed),
            requeue: deferral_reason(&observed.status).or_else(|| {
                replica_removal_in_flight(&observed).then_some(RequeueReason::WaitForReplicaRemoval)
            }),
        })
    }

    /// Runs delete passes until the table is gone.
    ///
    /// Sleeps for the requeue delay after each requeue and for the
    /// while-deleting delay after issuing the delete. A transient failure
    /// (throttling, network, table in use) waits for the error's own retry
    /// delay and does not count toward `max_failures`; any other failure
    /// waits the failure backoff.
    ///
    /// # Errors
    ///
    /// Returns the last error after `max_failures` consecutive
    /// non-transient failures, or [`ReconcileError::PassLimitExceeded`]
    /// once `max_passes` passes have been made.
    pub async fn delete_until_gone(&self, spec: &TableSpec) -> Result<DeletionReport> {
        let max_passes = self.settings.max_passes;
        let mut report = DeletionReport::new(&spec.table_name);
        let mut consecutive_failures = 0;

        info!(
            "Deleting table {} (at most {max_passes} passes)",
            spec.table_name
        );

        for pass in 1..=max_passes {
            debug!("Delete pass {pass}/{max_passes}");
            report.passes = pass;

            let wait = match self.reconcile_delete(spec).await {
                Ok(DeleteOutcome::Gone) => {
                    report.finished_at = Some(Utc::now());
                    info!("Table {} deleted after {pass} pass(es)", spec.table_name);
                    return Ok(report);
                }
                Ok(DeleteOutcome::Requeue { reason, after }) => {
                    consecutive_failures = 0;
                    *report.requeues.entry(reason).or_default() += 1;
                    after
                }
                Ok(DeleteOutcome::DeleteIssued) => {
                    consecutive_failures = 0;
                    report.delete_issued = true;
                    self.settings
                        .requeue
                        .delay_for(RequeueReason::WaitWhileDeleting)
                }
                Err(err) if err.is_retryable() => {
                    let delay = err
                        .retry_delay_secs()
                        .map_or_else(|| self.settings.failure_backoff(), Duration::from_secs);
                    warn!(
                        "Delete pass {pass} hit a transient error, retrying in {}s: {err}",
                        delay.as_secs()
                    );
                    report.errors.push(format!("Pass {pass}: {err}"));
                    delay
                }
                Err(err) => {
                    consecutive_failures += 1;
                    error!("Delete pass {pass} failed: {err}");
                    report.errors.push(format!("Pass {pass}: {err}"));

                    if consecutive_failures >= self.settings.max_failures {
                        return Err(err);
                    }
                    self.settings.failure_backoff()
                }
            };

            if pass < max_passes {
                tokio::time::sleep(wait).await;
            }
        }

        Err(ControllerError::Reconcile(ReconcileError::PassLimitExceeded {
            table: spec.table_name.clone(),
            passes: max_passes,
        }))
    }

    fn requeue(&self, reason: RequeueReason) -> DeleteOutcome {
        let after = self.settings.requeue.delay_for(reason);
        info!("Requeueing after {}s: {reason}", after.as_secs());
        DeleteOutcome::Requeue { reason, after }
    }
}

impl DeleteOutcome {
    /// Returns true if the table no longer exists.
    #[must_use]
    pub const fn is_gone(&self) -> bool {
        matches!(self, Self::Gone)
    }
}

impl DeletionReport {
    fn new(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            passes: 0,
            delete_issued: false,
            requeues: BTreeMap::new(),
            errors: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Total number of requeued passes.
    #[must_use]
    pub fn total_requeues(&self) -> u32 {
        self.requeues.values().sum()
    }
}

impl std::fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gone => write!(f, "table is gone"),
            Self::Requeue { reason, after } => {
                write!(f, "requeue in {}s: {reason}", after.as_secs())
            }
            Self::DeleteIssued => write!(f, "delete issued"),
        }
    }
}

impl std::fmt::Display for DeletionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Deletion of {}:", self.table_name)?;
        writeln!(f, "  Passes: {}", self.passes)?;
        writeln!(f, "  Delete issued: {}", self.delete_issued)?;
        for (reason, count) in &self.requeues {
            writeln!(f, "  Requeued {count}x: {reason}")?;
        }
        if let Some(finished) = self.finished_at {
            let elapsed = finished - self.started_at;
            writeln!(f, "  Duration: {}s", elapsed.num_seconds())?;
        }

        if !self.errors.is_empty() {
            writeln!(f, "  Errors:")?;
            for error in &self.errors {
                writeln!(f, "    - {error}")?;
            }
        }

        Ok(())
    }
}
