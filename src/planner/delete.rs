//! Delete planning for replicated tables.
//!
//! The planner decides whether the remote delete call may be issued on this
//! pass. A busy table yields a requeue decision, never an error. A table
//! with replicas has them torn down first, because `DynamoDB` refuses to
//! delete a table that still has replicas. The delete waits until the last
//! replica removal has finished.

use serde::Serialize;
use tracing::{debug, info};

use crate::dynamodb::TableClient;
use crate::error::Result;
use crate::resource::{remote_phase, RemotePhase, ReplicaStatus, Table, TableStatus};

use super::replicas::{ReplicaSync, SyncStatus};

/// Outcome of planning a delete.
///
/// Failure is the `Err` arm of the planner result, so "retry later" and
/// "something broke" can never be confused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteDecision {
    /// The remote delete call may be issued for this table.
    ///
    /// The carried resource is a copy of the observed one with its replica
    /// list cleared.
    Proceed(Table),
    /// The table is busy; reconcile again later.
    Requeue(RequeueReason),
}

/// Why a pass ended without issuing the delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequeueReason {
    /// A delete is already in flight.
    WaitWhileDeleting,
    /// An update is in flight.
    WaitWhileUpdating,
    /// The remote rejected the delete call because the table is in use.
    TableInUse,
    /// A replica is still being removed.
    WaitForReplicaRemoval,
}

/// Planner for the delete path.
#[derive(Debug)]
pub struct DeletePlanner<'a, C: TableClient> {
    /// Remote table client used for replica teardown.
    client: &'a C,
}

impl<'a, C: TableClient> DeletePlanner<'a, C> {
    /// Creates a new delete planner.
    #[must_use]
    pub const fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Plans the deletion of an observed table.
    ///
    /// `observed` is only read; any replica teardown works on a clone.
    ///
    /// Proceeds only once the replica set is empty; a replica still in
    /// `DELETING` yields [`RequeueReason::WaitForReplicaRemoval`].
    ///
    /// # Errors
    ///
    /// Returns the replica sync error verbatim if removing a replica fails.
    pub async fn plan_delete(&self, observed: &Table) -> Result<DeleteDecision> {
        if let Some(reason) = deferral_reason(&observed.status) {
            info!("Requeueing delete of {}: {reason}", observed.name());
            return Ok(DeleteDecision::Requeue(reason));
        }

        let mut desired = observed.clone();
        desired.spec.replicas = None;

        if observed.has_replicas() {
            info!(
                "Table {} has {} replica(s), removing them before delete",
                observed.name(),
                observed.replicas().len()
            );
            let status = ReplicaSync::new(self.client).sync(&desired, observed).await?;
            if let SyncStatus::AwaitingRemoval(regions) = status {
                info!(
                    "Requeueing delete of {}: replicas still being removed in {}",
                    observed.name(),
                    regions.join(", ")
                );
                return Ok(DeleteDecision::Requeue(RequeueReason::WaitForReplicaRemoval));
            }
        } else {
            debug!("Table {} has no replicas", observed.name());
        }

        Ok(DeleteDecision::Proceed(desired))
    }
}

/// Returns why a delete must wait for the table to settle, if it must.
///
/// `Creating` is not deferred here; the remote rejects that delete as in use.
#[must_use]
pub const fn deferral_reason(status: &TableStatus) -> Option<RequeueReason> {
    match remote_phase(status) {
        RemotePhase::Deleting => Some(RequeueReason::WaitWhileDeleting),
        RemotePhase::Updating => Some(RequeueReason::WaitWhileUpdating),
        RemotePhase::Creating | RemotePhase::Active => None,
    }
}

/// Returns true if any replica of `table` is already being removed.
#[must_use]
pub fn replica_removal_in_flight(table: &Table) -> bool {
    table
        .replicas()
        .iter()
        .any(|r| table.replica_status(&r.region_name) == Some(ReplicaStatus::Deleting))
}

impl DeleteDecision {
    /// Returns true if the delete call may be issued.
    #[must_use]
    pub const fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed(_))
    }

    /// Returns the requeue reason, if any.
    #[must_use]
    pub const fn requeue_reason(&self) -> Option<RequeueReason> {
        match self {
            Self::Requeue(reason) => Some(*reason),
            Self::Proceed(_) => None,
        }
    }
}

impl std::fmt::Display for RequeueReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::WaitWhileDeleting => "table in 'DELETING' state, cannot be modified or deleted",
            Self::WaitWhileUpdating => "table in 'UPDATING' state, cannot be modified or deleted",
            Self::TableInUse => "table is in use by another operation, cannot be deleted yet",
            Self::WaitForReplicaRemoval => "replica removal in progress, cannot delete table yet",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for DeleteDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Proceed(table) => write!(f, "proceed with deletion of {}", table.name()),
            Self::Requeue(reason) => write!(f, "requeue: {reason}"),
        }
    }
}
