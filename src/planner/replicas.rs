//! Replica synchronization.
//!
//! Drives the observed replica set of a table toward the desired set, one
//! remote call per region. The first failing call stops the sync and its
//! error is returned as-is; the next reconciliation pass recomputes the
//! diff from fresh observations and picks up where this one stopped.
//!
//! A replica the remote is already removing gets no second removal call.
//! The sync reports it as pending, since the replica set is not empty yet.

use tracing::{debug, info};

use crate::dynamodb::{effective_replica_throughput, TableClient};
use crate::error::Result;
use crate::resource::{Replica, ReplicaStatus, Table};

use super::diff::{compute_replica_diff, ReplicaChange, ReplicaDiff};

/// Where the replica set stands after a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Every required call was issued and no removal is outstanding.
    Converged,
    /// These regions were already being removed and still exist remotely.
    AwaitingRemoval(Vec<String>),
}

impl SyncStatus {
    /// Returns true if nothing is left to wait for.
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }
}

/// Applies replica diffs through a [`TableClient`].
#[derive(Debug)]
pub struct ReplicaSync<'a, C: TableClient> {
    /// Remote table client.
    client: &'a C,
}

impl<'a, C: TableClient> ReplicaSync<'a, C> {
    /// Creates a new replica sync.
    #[must_use]
    pub const fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Reconciles the replicas of `observed` toward those of `desired`.
    ///
    /// Removals run first, then throughput updates, then additions.
    /// Replicas already in `DELETING` are left alone and reported back in
    /// [`SyncStatus::AwaitingRemoval`].
    ///
    /// # Errors
    ///
    /// Returns the error of the first remote call that fails.
    pub async fn sync(&self, desired: &Table, observed: &Table) -> Result<SyncStatus> {
        let diff = compute_replica_diff(desired, observed);

        if !diff.has_changes() {
            debug!("Replicas of {} already converged", observed.name());
            return Ok(SyncStatus::Converged);
        }

        info!(
            "Syncing replicas of {}: {} creates, {} updates, {} deletes",
            observed.name(),
            diff.creates,
            diff.updates,
            diff.deletes
        );

        let mut pending = Vec::new();
        for replica_diff in diff.actionable_diffs() {
            let region = replica_diff.region_name.as_str();
            if replica_diff.change == ReplicaChange::Delete
                && observed.replica_status(region) == Some(ReplicaStatus::Deleting)
            {
                info!(
                    "Replica of {} in {region} is already being removed",
                    observed.name()
                );
                pending.push(region.to_string());
                continue;
            }
            self.apply(replica_diff, desired, observed).await?;
        }

        if pending.is_empty() {
            Ok(SyncStatus::Converged)
        } else {
            Ok(SyncStatus::AwaitingRemoval(pending))
        }
    }

    /// Issues the remote call for one replica diff.
    async fn apply(&self, replica_diff: &ReplicaDiff, desired: &Table, observed: &Table) -> Result<()> {
        let table_name = observed.name();
        let region = replica_diff.region_name.as_str();

        match replica_diff.change {
            ReplicaChange::Delete => {
                info!("Removing replica of {table_name} in {region}");
                self.client.remove_replica(table_name, region).await
            }
            ReplicaChange::Update => {
                let throughput = desired_replica(desired, region)
                    .and_then(|r| effective_replica_throughput(desired, r));
                info!("Updating replica of {table_name} in {region}");
                self.client
                    .update_replica(table_name, region, throughput.as_ref())
                    .await
            }
            ReplicaChange::Create => {
                let throughput = desired_replica(desired, region)
                    .and_then(|r| effective_replica_throughput(desired, r));
                info!("Adding replica of {table_name} in {region}");
                self.client
                    .add_replica(table_name, region, throughput.as_ref())
                    .await
            }
            ReplicaChange::NoChange => {
                debug!("Replica of {table_name} in {region} unchanged");
                Ok(())
            }
        }
    }
}

fn desired_replica<'t>(desired: &'t Table, region: &str) -> Option<&'t Replica> {
    desired.replicas().iter().find(|r| r.region_name == region)
}
