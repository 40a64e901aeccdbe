//! Remote table client trait.
//!
//! This module defines the interface the controller uses to read and mutate
//! the remote table. Implementations perform one blocking remote call per
//! method and never retry on their own.

use async_trait::async_trait;

use crate::error::Result;
use crate::resource::{
    ProvisionedThroughput, ProvisionedThroughputOverride, Replica, ReplicaStatus,
    ReplicaStatusEntry, TableStatus, TableStatusValue,
};

use super::throughput::WireThroughput;

/// Snapshot of a remote table as reported by `DescribeTable`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDescription {
    /// Table name.
    pub table_name: String,
    /// Table status.
    pub table_status: Option<TableStatusValue>,
    /// Table ARN.
    pub table_arn: Option<String>,
    /// Approximate item count.
    pub item_count: Option<i64>,
    /// Table-level provisioned throughput.
    pub provisioned_throughput: Option<ProvisionedThroughput>,
    /// Replicas of the table.
    pub replicas: Vec<ReplicaDescription>,
}

/// Snapshot of one replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaDescription {
    /// Region hosting the replica.
    pub region_name: String,
    /// Replica status.
    pub replica_status: Option<ReplicaStatus>,
    /// Read capacity override in this region.
    pub read_capacity_override: Option<i64>,
}

/// Client for reading and mutating a remote table.
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Describes a table.
    ///
    /// Fails with [`crate::error::RemoteError::ResourceNotFound`] if the table
    /// does not exist.
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription>;

    /// Issues the delete call for a table.
    async fn delete_table(&self, table_name: &str) -> Result<()>;

    /// Adds a replica in `region`.
    async fn add_replica(
        &self,
        table_name: &str,
        region: &str,
        throughput: Option<&WireThroughput>,
    ) -> Result<()>;

    /// Updates the throughput of the replica in `region`.
    async fn update_replica(
        &self,
        table_name: &str,
        region: &str,
        throughput: Option<&WireThroughput>,
    ) -> Result<()>;

    /// Removes the replica in `region`.
    async fn remove_replica(&self, table_name: &str, region: &str) -> Result<()>;

    /// Gets the client type name.
    fn client_type(&self) -> &'static str;
}

#[async_trait]
impl TableClient for Box<dyn TableClient> {
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        (**self).describe_table(table_name).await
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        (**self).delete_table(table_name).await
    }

    async fn add_replica(
        &self,
        table_name: &str,
        region: &str,
        throughput: Option<&WireThroughput>,
    ) -> Result<()> {
        (**self).add_replica(table_name, region, throughput).await
    }

    async fn update_replica(
        &self,
        table_name: &str,
        region: &str,
        throughput: Option<&WireThroughput>,
    ) -> Result<()> {
        (**self).update_replica(table_name, region, throughput).await
    }

    async fn remove_replica(&self, table_name: &str, region: &str) -> Result<()> {
        (**self).remove_replica(table_name, region).await
    }

    fn client_type(&self) -> &'static str {
        (**self).client_type()
    }
}

impl TableDescription {
    /// Returns the replicas in spec form.
    #[must_use]
    pub fn spec_replicas(&self) -> Vec<Replica> {
        self.replicas
            .iter()
            .map(|r| Replica {
                region_name: r.region_name.clone(),
                provisioned_throughput_override: r.read_capacity_override.map(|units| {
                    ProvisionedThroughputOverride {
                        read_capacity_units: Some(units),
                    }
                }),
            })
            .collect()
    }

    /// Returns the observed status.
    #[must_use]
    pub fn status(&self) -> TableStatus {
        TableStatus {
            table_status: self.table_status,
            table_arn: self.table_arn.clone(),
            item_count: self.item_count,
            replica_statuses: self
                .replicas
                .iter()
                .map(|r| ReplicaStatusEntry {
                    region_name: r.region_name.clone(),
                    replica_status: r.replica_status,
                })
                .collect(),
        }
    }
}
