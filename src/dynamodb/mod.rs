//! `DynamoDB` integration module.
//!
//! This module provides the remote table client interface, its AWS SDK
//! implementation, and the construction of wire-format throughput.

mod aws;
mod client;
mod throughput;

#[cfg(test)]
pub(crate) mod testing;

pub use aws::AwsTableClient;
pub use client::{ReplicaDescription, TableClient, TableDescription};
pub use throughput::{
    effective_replica_throughput, normalize_throughput, WireThroughput, DEFAULT_CAPACITY_UNITS,
};
