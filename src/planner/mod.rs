//! Planning module for table deletion.
//!
//! This module compares desired and observed replica sets, drives the
//! replica set toward the desired one, and decides whether a table delete
//! can be issued on the current pass.

mod delete;
mod diff;
mod replicas;

pub use delete::{
    deferral_reason, replica_removal_in_flight, DeleteDecision, DeletePlanner, RequeueReason,
};
pub use diff::{compute_replica_diff, ReplicaChange, ReplicaDiff, ReplicaDiffResult};
pub use replicas::{ReplicaSync, SyncStatus};
