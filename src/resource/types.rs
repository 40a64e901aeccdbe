//! Table resource types.
//!
//! A [`Table`] pairs the desired state (`spec`) with the observed state
//! (`status`). The value is rebuilt from the remote table on every
//! reconciliation pass and dropped at the end of it.

use serde::{Deserialize, Serialize};

/// The managed table: desired spec plus observed status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Desired state.
    pub spec: TableSpec,
    /// Observed state.
    #[serde(default)]
    pub status: TableStatus,
}

/// Desired state of a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    /// Name of the remote table.
    pub table_name: String,
    /// Billing mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_mode: Option<BillingMode>,
    /// Table-level read/write capacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<ProvisionedThroughput>,
    /// Stream settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_specification: Option<StreamSpecification>,
    /// Cross-region replicas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<Vec<Replica>>,
}

/// Billing mode of a table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingMode {
    /// Capacity is provisioned up front.
    Provisioned,
    /// On-demand capacity.
    PayPerRequest,
}

/// Read/write capacity units. An absent field means "use the default".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedThroughput {
    /// Read capacity units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_capacity_units: Option<i64>,
    /// Write capacity units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_capacity_units: Option<i64>,
}

/// Stream settings of a table.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreamSpecification {
    /// Whether streams are enabled.
    #[serde(default)]
    pub stream_enabled: bool,
    /// What each stream record contains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_view_type: Option<StreamViewType>,
}

/// Content of stream records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamViewType {
    /// Key attributes only.
    KeysOnly,
    /// The item after modification.
    NewImage,
    /// The item before modification.
    OldImage,
    /// Both images.
    NewAndOldImages,
}

/// One region-local copy of the table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Replica {
    /// Region hosting the replica.
    pub region_name: String,
    /// Per-region read capacity override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput_override: Option<ProvisionedThroughputOverride>,
}

/// Per-region capacity override. Write capacity is shared across regions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedThroughputOverride {
    /// Read capacity units in this region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_capacity_units: Option<i64>,
}

/// Observed state of a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TableStatus {
    /// Remote lifecycle status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_status: Option<TableStatusValue>,
    /// Table ARN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_arn: Option<String>,
    /// Approximate item count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_count: Option<i64>,
    /// Per-region replica status.
    #[serde(default)]
    pub replica_statuses: Vec<ReplicaStatusEntry>,
}

/// Remote table status values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatusValue {
    /// The table is being created.
    Creating,
    /// The table is being updated.
    Updating,
    /// The table is being deleted.
    Deleting,
    /// The table is ready.
    Active,
    /// The table is being archived.
    Archiving,
    /// The table has been archived.
    Archived,
    /// The KMS key of the table is unreachable.
    InaccessibleEncryptionCredentials,
}

/// Observed status of a single replica.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaStatusEntry {
    /// Region hosting the replica.
    pub region_name: String,
    /// Replica status, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_status: Option<ReplicaStatus>,
}

/// Remote replica status values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicaStatus {
    /// The replica is being created.
    Creating,
    /// Replica creation failed.
    CreationFailed,
    /// The replica is being updated.
    Updating,
    /// The replica is being removed.
    Deleting,
    /// The replica is ready.
    Active,
    /// The replica region is disabled.
    RegionDisabled,
    /// The KMS key of the replica is unreachable.
    InaccessibleEncryptionCredentials,
}

impl Table {
    /// Creates a table resource from a desired spec with an empty status.
    #[must_use]
    pub fn new(spec: TableSpec) -> Self {
        Self {
            spec,
            status: TableStatus::default(),
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.table_name
    }

    /// Returns the replicas declared in the spec, or an empty slice.
    #[must_use]
    pub fn replicas(&self) -> &[Replica] {
        self.spec.replicas.as_deref().unwrap_or_default()
    }

    /// Returns true if the spec declares at least one replica.
    #[must_use]
    pub fn has_replicas(&self) -> bool {
        !self.replicas().is_empty()
    }

    /// Returns the observed status of the replica in `region`, if any.
    #[must_use]
    pub fn replica_status(&self, region: &str) -> Option<ReplicaStatus> {
        self.status
            .replica_statuses
            .iter()
            .find(|r| r.region_name == region)
            .and_then(|r| r.replica_status)
    }
}

impl Replica {
    /// Creates a replica descriptor without a throughput override.
    #[must_use]
    pub fn new(region_name: impl Into<String>) -> Self {
        Self {
            region_name: region_name.into(),
            provisioned_throughput_override: None,
        }
    }

    /// Sets the per-region read capacity override.
    #[must_use]
    pub fn with_read_capacity(mut self, units: i64) -> Self {
        self.provisioned_throughput_override = Some(ProvisionedThroughputOverride {
            read_capacity_units: Some(units),
        });
        self
    }

    /// Returns the per-region read capacity override, if set.
    #[must_use]
    pub fn read_capacity_override(&self) -> Option<i64> {
        self.provisioned_throughput_override
            .and_then(|o| o.read_capacity_units)
    }
}

impl std::fmt::Display for TableStatusValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Creating => "CREATING",
            Self::Updating => "UPDATING",
            Self::Deleting => "DELETING",
            Self::Active => "ACTIVE",
            Self::Archiving => "ARCHIVING",
            Self::Archived => "ARCHIVED",
            Self::InaccessibleEncryptionCredentials => "INACCESSIBLE_ENCRYPTION_CREDENTIALS",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for ReplicaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Creating => "CREATING",
            Self::CreationFailed => "CREATION_FAILED",
            Self::Updating => "UPDATING",
            Self::Deleting => "DELETING",
            Self::Active => "ACTIVE",
            Self::RegionDisabled => "REGION_DISABLED",
            Self::InaccessibleEncryptionCredentials => "INACCESSIBLE_ENCRYPTION_CREDENTIALS",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replicas_default_to_empty() {
        let table = Table::new(TableSpec {
            table_name: String::from("orders"),
            ..TableSpec::default()
        });

        assert!(table.replicas().is_empty());
        assert!(!table.has_replicas());
    }

    #[test]
    fn test_empty_replica_list_is_not_replicated() {
        let table = Table::new(TableSpec {
            table_name: String::from("orders"),
            replicas: Some(vec![]),
            ..TableSpec::default()
        });

        assert!(!table.has_replicas());
    }

    #[test]
    fn test_replica_status_lookup() {
        let mut table = Table::new(TableSpec {
            table_name: String::from("orders"),
            replicas: Some(vec![Replica::new("us-east-1")]),
            ..TableSpec::default()
        });
        table.status.replica_statuses.push(ReplicaStatusEntry {
            region_name: String::from("us-east-1"),
            replica_status: Some(ReplicaStatus::Deleting),
        });

        assert_eq!(table.replica_status("us-east-1"), Some(ReplicaStatus::Deleting));
        assert_eq!(table.replica_status("eu-west-1"), None);
    }

    #[test]
    fn test_spec_deserializes_from_camel_case() {
        let yaml = r"
tableName: orders
billingMode: PROVISIONED
provisionedThroughput:
  writeCapacityUnits: 10
replicas:
  - regionName: us-east-1
    provisionedThroughputOverride:
      readCapacityUnits: 7
";
        let spec: TableSpec = serde_yaml::from_str(yaml).expect("spec should parse");

        assert_eq!(spec.billing_mode, Some(BillingMode::Provisioned));
        assert_eq!(
            spec.provisioned_throughput,
            Some(ProvisionedThroughput {
                read_capacity_units: None,
                write_capacity_units: Some(10),
            })
        );
        let replicas = spec.replicas.expect("replicas should be present");
        assert_eq!(replicas[0].region_name, "us-east-1");
        assert_eq!(replicas[0].read_capacity_override(), Some(7));
    }
}
