//! In-memory table client for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ControllerError, RemoteError, Result};
use crate::resource::{ReplicaStatus, TableStatusValue};

use super::client::{ReplicaDescription, TableClient, TableDescription};
use super::throughput::WireThroughput;

/// A remote call recorded by [`FakeTableClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Describe(String),
    DeleteTable(String),
    AddReplica(String, Option<WireThroughput>),
    UpdateReplica(String, Option<WireThroughput>),
    RemoveReplica(String),
}

/// Which call should fail, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    RemoveReplica,
    DeleteTableInUse,
    DeleteTableValidation,
    DeleteTableThrottled,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, TableDescription>,
    calls: Vec<Call>,
    failures: Vec<(Failure, Option<String>)>,
}

/// Records calls in order and serves describe results from memory.
///
/// Successful mutations move the stored table forward the way the remote
/// does, one step at a time: a removed replica disappears, and a table or
/// replica in `DELETING` is gone after it has been described once in that
/// state. A deleted table turns `DELETING`.
#[derive(Debug, Default)]
pub struct FakeTableClient {
    inner: Mutex<Inner>,
}

impl FakeTableClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, description: TableDescription) -> Self {
        self.put_table(description);
        self
    }

    /// Fails the next matching call. `region` narrows replica failures.
    pub fn fail_on(self, failure: Failure, region: Option<&str>) -> Self {
        self.lock().failures.push((failure, region.map(String::from)));
        self
    }

    pub fn put_table(&self, description: TableDescription) {
        self.lock()
            .tables
            .insert(description.table_name.clone(), description);
    }

    pub fn drop_table(&self, table_name: &str) {
        self.lock().tables.remove(table_name);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Calls other than describes.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Describe(_)))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn take_failure(&self, failure: Failure, region: Option<&str>) -> bool {
        let mut inner = self.lock();
        let position = inner.failures.iter().position(|(f, r)| {
            *f == failure && (r.is_none() || r.as_deref() == region)
        });
        if let Some(idx) = position {
            inner.failures.remove(idx);
            return true;
        }
        false
    }
}

/// Marks one replica of a described table as being removed.
pub fn replica_deleting(mut description: TableDescription, region: &str) -> TableDescription {
    for replica in &mut description.replicas {
        if replica.region_name == region {
            replica.replica_status = Some(ReplicaStatus::Deleting);
        }
    }
    description
}

/// Builds a described table with the given replicas.
pub fn described(table_name: &str, status: TableStatusValue, regions: &[&str]) -> TableDescription {
    TableDescription {
        table_name: table_name.to_string(),
        table_status: Some(status),
        table_arn: Some(format!("arn:aws:dynamodb:us-west-2:123456789012:table/{table_name}")),
        item_count: Some(0),
        provisioned_throughput: None,
        replicas: regions
            .iter()
            .map(|region| ReplicaDescription {
                region_name: (*region).to_string(),
                replica_status: Some(ReplicaStatus::Active),
                read_capacity_override: None,
            })
            .collect(),
    }
}

#[async_trait]
impl TableClient for FakeTableClient {
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        let mut inner = self.lock();
        inner.calls.push(Call::Describe(table_name.to_string()));
        let description = inner.tables.get(table_name).cloned().ok_or_else(|| {
            ControllerError::Remote(RemoteError::ResourceNotFound {
                table: table_name.to_string(),
            })
        })?;
        if description.table_status == Some(TableStatusValue::Deleting) {
            inner.tables.remove(table_name);
        } else if let Some(stored) = inner.tables.get_mut(table_name) {
            stored
                .replicas
                .retain(|r| r.replica_status != Some(ReplicaStatus::Deleting));
        }
        Ok(description)
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        self.lock().calls.push(Call::DeleteTable(table_name.to_string()));
        if self.take_failure(Failure::DeleteTableInUse, None) {
            return Err(ControllerError::Remote(RemoteError::ResourceInUse {
                table: table_name.to_string(),
                message: String::from("Attempt to change a resource which is still in use"),
            }));
        }
        if self.take_failure(Failure::DeleteTableThrottled, None) {
            return Err(ControllerError::Remote(RemoteError::Throttled {
                message: String::from("Rate of requests exceeds the allowed throughput"),
            }));
        }
        if self.take_failure(Failure::DeleteTableValidation, None) {
            return Err(ControllerError::Remote(RemoteError::Validation {
                message: String::from("Table has active replicas"),
            }));
        }
        if let Some(table) = self.lock().tables.get_mut(table_name) {
            table.table_status = Some(TableStatusValue::Deleting);
        }
        Ok(())
    }

    async fn add_replica(
        &self,
        _table_name: &str,
        region: &str,
        throughput: Option<&WireThroughput>,
    ) -> Result<()> {
        self.lock()
            .calls
            .push(Call::AddReplica(region.to_string(), throughput.copied()));
        Ok(())
    }

    async fn update_replica(
        &self,
        _table_name: &str,
        region: &str,
        throughput: Option<&WireThroughput>,
    ) -> Result<()> {
        self.lock()
            .calls
            .push(Call::UpdateReplica(region.to_string(), throughput.copied()));
        Ok(())
    }

    async fn remove_replica(&self, table_name: &str, region: &str) -> Result<()> {
        self.lock().calls.push(Call::RemoveReplica(region.to_string()));
        if self.take_failure(Failure::RemoveReplica, Some(region)) {
            return Err(ControllerError::Remote(RemoteError::Validation {
                message: format!("Cannot remove replica in {region}"),
            }));
        }
        if let Some(table) = self.lock().tables.get_mut(table_name) {
            table.replicas.retain(|r| r.region_name != region);
        }
        Ok(())
    }

    fn client_type(&self) -> &'static str {
        "fake"
    }
}
