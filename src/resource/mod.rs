//! Table resource module.
//!
//! This module defines the in-memory table resource (desired spec plus
//! observed status) and the pure predicates that derive the remote
//! lifecycle phase from the observed status.

mod phase;
mod types;

pub use phase::{is_creating, is_deleting, is_updating, remote_phase, RemotePhase};
pub use types::{
    BillingMode, ProvisionedThroughput, ProvisionedThroughputOverride, Replica, ReplicaStatus,
    ReplicaStatusEntry, StreamSpecification, StreamViewType, Table, TableSpec, TableStatus,
    TableStatusValue,
};
