//! Manifest types for the table controller.
//!
//! This module defines the structs that map to a `table.yaml` manifest: the
//! desired table spec plus the settings that tune the controller itself.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::planner::RequeueReason;
use crate::resource::{Table, TableSpec};

/// Kind expected in every manifest.
pub const MANIFEST_KIND: &str = "Table";

/// The root manifest structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TableManifest {
    /// Optional API version string, kept for round-tripping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Resource kind, always `Table`.
    pub kind: String,
    /// Manifest metadata.
    pub metadata: ManifestMetadata,
    /// Desired table state.
    pub spec: TableSpec,
    /// Controller settings.
    #[serde(default)]
    pub controller: ControllerSettings,
}

/// Manifest metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestMetadata {
    /// Name of the managed resource.
    pub name: String,
}

/// Settings that tune how the controller talks to `DynamoDB` and how
/// patiently it waits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSettings {
    /// AWS region of the table. Falls back to the default provider chain.
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint, e.g. `DynamoDB` Local.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Requeue delays.
    #[serde(default)]
    pub requeue: RequeueSettings,
    /// Maximum passes made by `delete` before giving up.
    #[serde(default = "default_max_passes")]
    pub max_passes: u32,
    /// Consecutive failed passes tolerated by `delete`.
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    /// Delay after a failed pass, in seconds.
    #[serde(default = "default_failure_backoff_secs")]
    pub failure_backoff_secs: u64,
}

/// How long to wait before the next pass, per requeue reason.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequeueSettings {
    /// Delay while a delete is already in flight, in seconds.
    #[serde(default = "default_requeue_secs")]
    pub while_deleting_secs: u64,
    /// Delay while an update is in flight, in seconds.
    #[serde(default = "default_requeue_secs")]
    pub while_updating_secs: u64,
    /// Delay after the delete call was rejected as in use, in seconds.
    #[serde(default = "default_requeue_secs")]
    pub in_use_secs: u64,
}

impl TableManifest {
    /// Builds the in-memory resource described by this manifest.
    #[must_use]
    pub fn to_table(&self) -> Table {
        Table::new(self.spec.clone())
    }

    /// Returns the name of the remote table.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.spec.table_name
    }
}

impl ControllerSettings {
    /// Delay after a failed pass.
    #[must_use]
    pub const fn failure_backoff(&self) -> Duration {
        Duration::from_secs(self.failure_backoff_secs)
    }
}

impl RequeueSettings {
    /// Uses the same delay for every reason.
    #[must_use]
    pub const fn uniform(secs: u64) -> Self {
        Self {
            while_deleting_secs: secs,
            while_updating_secs: secs,
            in_use_secs: secs,
        }
    }

    /// Returns the delay for a requeue reason.
    ///
    /// Replica removal runs as a table update remotely, so it shares the
    /// while-updating delay.
    #[must_use]
    pub const fn delay_for(&self, reason: RequeueReason) -> Duration {
        let secs = match reason {
            RequeueReason::WaitWhileDeleting => self.while_deleting_secs,
            RequeueReason::WaitWhileUpdating | RequeueReason::WaitForReplicaRemoval => {
                self.while_updating_secs
            }
            RequeueReason::TableInUse => self.in_use_secs,
        };
        Duration::from_secs(secs)
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            requeue: RequeueSettings::default(),
            max_passes: default_max_passes(),
            max_failures: default_max_failures(),
            failure_backoff_secs: default_failure_backoff_secs(),
        }
    }
}

impl Default for RequeueSettings {
    fn default() -> Self {
        Self::uniform(default_requeue_secs())
    }
}

const fn default_requeue_secs() -> u64 {
    30
}

const fn default_max_passes() -> u32 {
    60
}

const fn default_max_failures() -> u32 {
    3
}

const fn default_failure_backoff_secs() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requeue_delay_per_reason() {
        let requeue = RequeueSettings {
            while_deleting_secs: 10,
            while_updating_secs: 20,
            in_use_secs: 30,
        };

        assert_eq!(requeue.delay_for(RequeueReason::WaitWhileDeleting), Duration::from_secs(10));
        assert_eq!(requeue.delay_for(RequeueReason::WaitWhileUpdating), Duration::from_secs(20));
        assert_eq!(requeue.delay_for(RequeueReason::TableInUse), Duration::from_secs(30));
        assert_eq!(
            requeue.delay_for(RequeueReason::WaitForReplicaRemoval),
            Duration::from_secs(20)
        );
    }

    #[test]
    fn test_default_settings() {
        let settings = ControllerSettings::default();
        assert_eq!(settings.max_passes, 60);
        assert_eq!(settings.max_failures, 3);
        assert_eq!(settings.failure_backoff(), Duration::from_secs(5));
        assert_eq!(settings.requeue, RequeueSettings::uniform(30));
    }
}
