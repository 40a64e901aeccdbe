//! Remote lifecycle phase predicates.
//!
//! The phase is derived from the observed [`TableStatus`] and never stored.
//! Observation is asynchronous, so an `Active` reading may already be stale
//! by the time a caller acts on it.

use serde::Serialize;

use super::types::{TableStatus, TableStatusValue};

/// Lifecycle phase of the remote table at observation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemotePhase {
    /// The table is being created.
    Creating,
    /// The table is being updated.
    Updating,
    /// The table is being deleted.
    Deleting,
    /// Any other state, including an unknown or missing status.
    Active,
}

/// Returns the remote phase for an observed status.
#[must_use]
pub const fn remote_phase(status: &TableStatus) -> RemotePhase {
    match status.table_status {
        Some(TableStatusValue::Creating) => RemotePhase::Creating,
        Some(TableStatusValue::Updating) => RemotePhase::Updating,
        Some(TableStatusValue::Deleting) => RemotePhase::Deleting,
        _ => RemotePhase::Active,
    }
}

/// Returns true if the table is being created.
#[must_use]
pub const fn is_creating(status: &TableStatus) -> bool {
    matches!(remote_phase(status), RemotePhase::Creating)
}

/// Returns true if the table is being updated.
#[must_use]
pub const fn is_updating(status: &TableStatus) -> bool {
    matches!(remote_phase(status), RemotePhase::Updating)
}

/// Returns true if the table is being deleted.
#[must_use]
pub const fn is_deleting(status: &TableStatus) -> bool {
    matches!(remote_phase(status), RemotePhase::Deleting)
}

impl std::fmt::Display for RemotePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Creating => "creating",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
            Self::Active => "active",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(value: Option<TableStatusValue>) -> TableStatus {
        TableStatus {
            table_status: value,
            ..TableStatus::default()
        }
    }

    #[test]
    fn test_transitional_statuses_map_to_phases() {
        assert_eq!(remote_phase(&status(Some(TableStatusValue::Creating))), RemotePhase::Creating);
        assert_eq!(remote_phase(&status(Some(TableStatusValue::Updating))), RemotePhase::Updating);
        assert_eq!(remote_phase(&status(Some(TableStatusValue::Deleting))), RemotePhase::Deleting);
    }

    #[test]
    fn test_other_statuses_are_active() {
        assert_eq!(remote_phase(&status(None)), RemotePhase::Active);
        assert_eq!(remote_phase(&status(Some(TableStatusValue::Active))), RemotePhase::Active);
        assert_eq!(remote_phase(&status(Some(TableStatusValue::Archived))), RemotePhase::Active);
        assert_eq!(
            remote_phase(&status(Some(TableStatusValue::InaccessibleEncryptionCredentials))),
            RemotePhase::Active
        );
    }

    #[test]
    fn test_predicates_are_mutually_exclusive() {
        let deleting = status(Some(TableStatusValue::Deleting));
        assert!(is_deleting(&deleting));
        assert!(!is_updating(&deleting));
        assert!(!is_creating(&deleting));

        let updating = status(Some(TableStatusValue::Updating));
        assert!(is_updating(&updating));
        assert!(!is_deleting(&updating));
    }
}
