//! Diff engine for comparing desired vs observed replicas.
//!
//! This module computes, per region, what has to happen to move the
//! observed replica set of a table to the desired one.

use std::collections::BTreeMap;
use tracing::debug;

use crate::resource::{Replica, Table};

/// Change required for a single replica region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicaChange {
    /// Replica needs to be created.
    Create,
    /// Replica throughput needs to be updated.
    Update,
    /// Replica needs to be removed.
    Delete,
    /// Replica is unchanged.
    NoChange,
}

/// Difference for a single replica region.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReplicaDiff {
    /// Region of the replica.
    pub region_name: String,
    /// Type of change.
    pub change: ReplicaChange,
    /// Observed read capacity override.
    pub old_read_capacity: Option<i64>,
    /// Desired read capacity override.
    pub new_read_capacity: Option<i64>,
}

/// Complete replica diff.
#[derive(Debug, Default, serde::Serialize)]
pub struct ReplicaDiffResult {
    /// Per-region diffs: deletes, then updates, then creates, then unchanged.
    pub diffs: Vec<ReplicaDiff>,
    /// Number of replicas to create.
    pub creates: usize,
    /// Number of replicas to update.
    pub updates: usize,
    /// Number of replicas to delete.
    pub deletes: usize,
    /// Number of unchanged replicas.
    pub unchanged: usize,
}

/// Computes the replica diff between a desired and an observed table.
#[must_use]
pub fn compute_replica_diff(desired: &Table, observed: &Table) -> ReplicaDiffResult {
    let desired_by_region: BTreeMap<&str, &Replica> = desired
        .replicas()
        .iter()
        .map(|r| (r.region_name.as_str(), r))
        .collect();
    let observed_by_region: BTreeMap<&str, &Replica> = observed
        .replicas()
        .iter()
        .map(|r| (r.region_name.as_str(), r))
        .collect();

    let mut deletes = Vec::new();
    let mut updates = Vec::new();
    let mut creates = Vec::new();
    let mut unchanged = Vec::new();

    for (region, obs) in &observed_by_region {
        match desired_by_region.get(region) {
            None => {
                debug!("Replica in {region} is not desired, removing");
                deletes.push(ReplicaDiff {
                    region_name: (*region).to_string(),
                    change: ReplicaChange::Delete,
                    old_read_capacity: obs.read_capacity_override(),
                    new_read_capacity: None,
                });
            }
            Some(want) => {
                let old = obs.read_capacity_override();
                let new = want.read_capacity_override();
                let change = if old == new {
                    ReplicaChange::NoChange
                } else {
                    debug!("Replica in {region} needs throughput update ({old:?} -> {new:?})");
                    ReplicaChange::Update
                };
                let diff = ReplicaDiff {
                    region_name: (*region).to_string(),
                    change,
                    old_read_capacity: old,
                    new_read_capacity: new,
                };
                if change == ReplicaChange::Update {
                    updates.push(diff);
                } else {
                    unchanged.push(diff);
                }
            }
        }
    }

    for (region, want) in &desired_by_region {
        if !observed_by_region.contains_key(region) {
            debug!("Replica in {region} needs to be created");
            creates.push(ReplicaDiff {
                region_name: (*region).to_string(),
                change: ReplicaChange::Create,
                old_read_capacity: None,
                new_read_capacity: want.read_capacity_override(),
            });
        }
    }

    ReplicaDiffResult {
        creates: creates.len(),
        updates: updates.len(),
        deletes: deletes.len(),
        unchanged: unchanged.len(),
        diffs: deletes
            .into_iter()
            .chain(updates)
            .chain(creates)
            .chain(unchanged)
            .collect(),
    }
}

impl ReplicaDiffResult {
    /// Returns true if there are any changes.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.creates > 0 || self.updates > 0 || self.deletes > 0
    }

    /// Returns the total number of changes.
    #[must_use]
    pub const fn total_changes(&self) -> usize {
        self.creates + self.updates + self.deletes
    }

    /// Filters to only diffs that require action.
    #[must_use]
    pub fn actionable_diffs(&self) -> Vec<&ReplicaDiff> {
        self.diffs
            .iter()
            .filter(|d| d.change != ReplicaChange::NoChange)
            .collect()
    }

    /// Regions whose replicas will be removed.
    #[must_use]
    pub fn removed_regions(&self) -> Vec<&str> {
        self.diffs
            .iter()
            .filter(|d| d.change == ReplicaChange::Delete)
            .map(|d| d.region_name.as_str())
            .collect()
    }
}

impl std::fmt::Display for ReplicaChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::NoChange => "no change",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for ReplicaDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.region_name, self.change)?;
        if self.change == ReplicaChange::Update {
            write!(
                f,
                " (read capacity {} -> {})",
                fmt_units(self.old_read_capacity),
                fmt_units(self.new_read_capacity)
            )?;
        }
        Ok(())
    }
}

fn fmt_units(units: Option<i64>) -> String {
    units.map_or_else(|| String::from("inherited"), |u| u.to_string())
}
