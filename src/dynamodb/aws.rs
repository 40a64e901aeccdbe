//! `DynamoDB` client backed by the AWS SDK.
//!
//! Replica mutations go through `UpdateTable` with a single
//! `ReplicationGroupUpdate` per call; `DynamoDB` rejects more than one
//! replica change in flight for a table.

use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::{
    CreateReplicationGroupMemberAction, DeleteReplicationGroupMemberAction,
    ProvisionedThroughputOverride, ReplicaStatus as SdkReplicaStatus, ReplicationGroupUpdate,
    TableStatus as SdkTableStatus, UpdateReplicationGroupMemberAction,
};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{ControllerError, RemoteError, Result};
use crate::resource::{ProvisionedThroughput, ReplicaStatus, TableStatusValue};

use super::client::{ReplicaDescription, TableClient, TableDescription};
use super::throughput::WireThroughput;

/// Region used when neither the settings nor the environment provide one.
const DEFAULT_REGION: &str = "us-east-1";

/// `DynamoDB` table client.
#[derive(Debug, Clone)]
pub struct AwsTableClient {
    /// SDK client.
    client: Client,
}

impl AwsTableClient {
    /// Creates a client from the default AWS credential chain.
    ///
    /// `region` overrides the environment; `endpoint_url` points the client
    /// at a local endpoint such as `DynamoDB` Local.
    pub async fn from_env(region: Option<&str>, endpoint_url: Option<&str>) -> Self {
        let region_provider =
            RegionProviderChain::first_try(region.map(|r| Region::new(r.to_string())))
            .or_default_provider()
            .or_else(Region::new(DEFAULT_REGION));

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
        if let Some(url) = endpoint_url {
            debug!("Using custom DynamoDB endpoint: {url}");
            loader = loader.endpoint_url(url);
        }

        let config = loader.load().await;
        info!(
            "DynamoDB client configured for region {}",
            config
                .region()
                .map_or_else(|| DEFAULT_REGION.to_string(), ToString::to_string)
        );

        Self {
            client: Client::new(&config),
        }
    }

    /// Sends one replication group update.
    async fn update_replication_group(
        &self,
        table_name: &str,
        update: ReplicationGroupUpdate,
    ) -> Result<()> {
        self.client
            .update_table()
            .table_name(table_name)
            .replica_updates(update)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, table_name))?;
        Ok(())
    }
}

#[async_trait]
impl TableClient for AwsTableClient {
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        debug!("Describing table {table_name}");

        let output = self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, table_name))?;

        let table = output.table().ok_or_else(|| {
            RemoteError::invalid_response(format!("DescribeTable returned no table for {table_name}"))
        })?;

        let replicas = table
            .replicas()
            .iter()
            .filter_map(|r| {
                r.region_name().map(|region| ReplicaDescription {
                    region_name: region.to_string(),
                    replica_status: r.replica_status().and_then(map_replica_status),
                    read_capacity_override: r
                        .provisioned_throughput_override()
                        .and_then(|o| o.read_capacity_units()),
                })
            })
            .collect();

        Ok(TableDescription {
            table_name: table.table_name().unwrap_or(table_name).to_string(),
            table_status: table.table_status().and_then(map_table_status),
            table_arn: table.table_arn().map(String::from),
            item_count: table.item_count(),
            provisioned_throughput: table.provisioned_throughput().map(|pt| ProvisionedThroughput {
                read_capacity_units: pt.read_capacity_units(),
                write_capacity_units: pt.write_capacity_units(),
            }),
            replicas,
        })
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        info!("Deleting table {table_name}");
        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, table_name))?;
        Ok(())
    }

    async fn add_replica(
        &self,
        table_name: &str,
        region: &str,
        throughput: Option<&WireThroughput>,
    ) -> Result<()> {
        let action = CreateReplicationGroupMemberAction::builder()
            .region_name(region)
            .set_provisioned_throughput_override(throughput.and_then(to_sdk_override))
            .build()
            .map_err(|e| ControllerError::internal(format!("Invalid create replica action: {e}")))?;

        self.update_replication_group(
            table_name,
            ReplicationGroupUpdate::builder().create(action).build(),
        )
        .await
    }

    async fn update_replica(
        &self,
        table_name: &str,
        region: &str,
        throughput: Option<&WireThroughput>,
    ) -> Result<()> {
        let action = UpdateReplicationGroupMemberAction::builder()
            .region_name(region)
            .set_provisioned_throughput_override(throughput.and_then(to_sdk_override))
            .build()
            .map_err(|e| ControllerError::internal(format!("Invalid update replica action: {e}")))?;

        self.update_replication_group(
            table_name,
            ReplicationGroupUpdate::builder().update(action).build(),
        )
        .await
    }

    async fn remove_replica(&self, table_name: &str, region: &str) -> Result<()> {
        let action = DeleteReplicationGroupMemberAction::builder()
            .region_name(region)
            .build()
            .map_err(|e| ControllerError::internal(format!("Invalid delete replica action: {e}")))?;

        self.update_replication_group(
            table_name,
            ReplicationGroupUpdate::builder().delete(action).build(),
        )
        .await
    }

    fn client_type(&self) -> &'static str {
        "aws"
    }
}

/// Replica overrides only carry read capacity.
fn to_sdk_override(throughput: &WireThroughput) -> Option<ProvisionedThroughputOverride> {
    throughput.read_capacity_units.map(|units| {
        ProvisionedThroughputOverride::builder()
            .read_capacity_units(units)
            .build()
    })
}

fn map_table_status(status: &SdkTableStatus) -> Option<TableStatusValue> {
    match status {
        SdkTableStatus::Creating => Some(TableStatusValue::Creating),
        SdkTableStatus::Updating => Some(TableStatusValue::Updating),
        SdkTableStatus::Deleting => Some(TableStatusValue::Deleting),
        SdkTableStatus::Active => Some(TableStatusValue::Active),
        SdkTableStatus::Archiving => Some(TableStatusValue::Archiving),
        SdkTableStatus::Archived => Some(TableStatusValue::Archived),
        SdkTableStatus::InaccessibleEncryptionCredentials => {
            Some(TableStatusValue::InaccessibleEncryptionCredentials)
        }
        _ => None,
    }
}

fn map_replica_status(status: &SdkReplicaStatus) -> Option<ReplicaStatus> {
    match status {
        SdkReplicaStatus::Creating => Some(ReplicaStatus::Creating),
        SdkReplicaStatus::CreationFailed => Some(ReplicaStatus::CreationFailed),
        SdkReplicaStatus::Updating => Some(ReplicaStatus::Updating),
        SdkReplicaStatus::Deleting => Some(ReplicaStatus::Deleting),
        SdkReplicaStatus::Active => Some(ReplicaStatus::Active),
        SdkReplicaStatus::RegionDisabled => Some(ReplicaStatus::RegionDisabled),
        SdkReplicaStatus::InaccessibleEncryptionCredentials => {
            Some(ReplicaStatus::InaccessibleEncryptionCredentials)
        }
        _ => None,
    }
}

/// Maps an SDK error to a [`RemoteError`] using the service error code.
fn map_sdk_error<E, R>(err: SdkError<E, R>, table_name: &str) -> ControllerError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let remote = match &err {
        SdkError::DispatchFailure(dispatch) => {
            let kind = if dispatch.is_timeout() {
                "timed out"
            } else if dispatch.is_io() {
                "failed (I/O error)"
            } else {
                "failed"
            };
            RemoteError::network(format!("Connection to DynamoDB {kind}"))
        }
        SdkError::TimeoutError(_) => RemoteError::network("Connection to DynamoDB timed out"),
        SdkError::ServiceError(service) => {
            let inner = service.err();
            let code = inner.code().unwrap_or("Unknown");
            let message = inner.message().unwrap_or("no message").to_string();
            map_service_code(code, message, table_name)
        }
        other => RemoteError::Service {
            code: String::from("Unknown"),
            message: format!("{other:?}"),
        },
    };
    ControllerError::Remote(remote)
}

fn map_service_code(code: &str, message: String, table_name: &str) -> RemoteError {
    match code {
        "ResourceNotFoundException" => RemoteError::ResourceNotFound {
            table: table_name.to_string(),
        },
        "ResourceInUseException" => RemoteError::ResourceInUse {
            table: table_name.to_string(),
            message,
        },
        "ValidationException" => RemoteError::Validation { message },
        "ProvisionedThroughputExceededException"
        | "LimitExceededException"
        | "RequestLimitExceeded"
        | "ThrottlingException" => RemoteError::Throttled { message },
        other => RemoteError::Service {
            code: other.to_string(),
            message,
        },
    }
}
