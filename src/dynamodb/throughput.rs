//! Wire-format throughput construction.
//!
//! Converts the optional capacity settings of a table spec into the shape
//! the `DynamoDB` API expects. Unset fields are filled with
//! [`DEFAULT_CAPACITY_UNITS`]; magnitudes are passed through untouched.

use serde::{Deserialize, Serialize};

use crate::resource::{ProvisionedThroughput, Replica, Table};

/// Capacity substituted for an unset read or write field.
pub const DEFAULT_CAPACITY_UNITS: i64 = 1;

/// Throughput as sent to the remote API.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct WireThroughput {
    /// Read capacity units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_capacity_units: Option<i64>,
    /// Write capacity units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_capacity_units: Option<i64>,
}

/// Normalizes a throughput spec into its wire form.
///
/// `None` stays `None`. Each unset field independently becomes
/// [`DEFAULT_CAPACITY_UNITS`].
#[must_use]
pub fn normalize_throughput(pt: Option<&ProvisionedThroughput>) -> Option<WireThroughput> {
    pt.map(|pt| WireThroughput {
        read_capacity_units: Some(pt.read_capacity_units.unwrap_or(DEFAULT_CAPACITY_UNITS)),
        write_capacity_units: Some(pt.write_capacity_units.unwrap_or(DEFAULT_CAPACITY_UNITS)),
    })
}

/// Builds the throughput payload for adding or updating `replica` on `table`.
///
/// Read capacity comes from the replica override when present, otherwise
/// from the normalized table throughput. Write capacity is table-wide.
#[must_use]
pub fn effective_replica_throughput(table: &Table, replica: &Replica) -> Option<WireThroughput> {
    let table_wire = normalize_throughput(table.spec.provisioned_throughput.as_ref());
    let read_override = replica.read_capacity_override();

    match (table_wire, read_override) {
        (None, None) => None,
        (None, Some(read)) => Some(WireThroughput {
            read_capacity_units: Some(read),
            write_capacity_units: None,
        }),
        (Some(wire), read) => Some(WireThroughput {
            read_capacity_units: read.or(wire.read_capacity_units),
            write_capacity_units: wire.write_capacity_units,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::TableSpec;

    fn throughput(read: Option<i64>, write: Option<i64>) -> ProvisionedThroughput {
        ProvisionedThroughput {
            read_capacity_units: read,
            write_capacity_units: write,
        }
    }

    fn wire(read: i64, write: i64) -> WireThroughput {
        WireThroughput {
            read_capacity_units: Some(read),
            write_capacity_units: Some(write),
        }
    }

    #[test]
    fn test_absent_throughput_stays_absent() {
        assert_eq!(normalize_throughput(None), None);
    }

    #[test]
    fn test_read_capacity_defaults_when_unset() {
        let pt = throughput(None, Some(10));
        assert_eq!(normalize_throughput(Some(&pt)), Some(wire(1, 10)));
    }

    #[test]
    fn test_write_capacity_defaults_when_unset() {
        let pt = throughput(Some(5), None);
        assert_eq!(normalize_throughput(Some(&pt)), Some(wire(5, 1)));
    }

    #[test]
    fn test_both_fields_set_pass_through() {
        let pt = throughput(Some(5), Some(5));
        assert_eq!(normalize_throughput(Some(&pt)), Some(wire(5, 5)));
    }

    #[test]
    fn test_both_fields_unset_default_to_one() {
        let pt = throughput(None, None);
        assert_eq!(normalize_throughput(Some(&pt)), Some(wire(1, 1)));
    }

    #[test]
    fn test_magnitudes_are_not_validated() {
        let pt = throughput(Some(0), Some(-3));
        assert_eq!(normalize_throughput(Some(&pt)), Some(wire(0, -3)));

        let pt = throughput(Some(i64::MAX), None);
        assert_eq!(normalize_throughput(Some(&pt)), Some(wire(i64::MAX, 1)));
    }

    #[test]
    fn test_wire_shape_uses_api_field_names() {
        let json = serde_json::to_value(wire(3, 4)).expect("serialize");
        assert_eq!(json, serde_json::json!({ "ReadCapacityUnits": 3, "WriteCapacityUnits": 4 }));

        let empty = serde_json::to_value(WireThroughput::default()).expect("serialize");
        assert_eq!(empty, serde_json::json!({}));
    }

    #[test]
    fn test_replica_override_wins_over_table_read() {
        let table = Table::new(TableSpec {
            table_name: String::from("orders"),
            provisioned_throughput: Some(throughput(None, Some(8))),
            ..TableSpec::default()
        });
        let replica = Replica::new("eu-west-1").with_read_capacity(20);

        assert_eq!(effective_replica_throughput(&table, &replica), Some(wire(20, 8)));
        assert_eq!(
            effective_replica_throughput(&table, &Replica::new("eu-west-1")),
            Some(wire(1, 8))
        );
    }

    #[test]
    fn test_replica_without_any_throughput() {
        let table = Table::new(TableSpec {
            table_name: String::from("orders"),
            ..TableSpec::default()
        });

        assert_eq!(effective_replica_throughput(&table, &Replica::new("eu-west-1")), None);
        assert_eq!(
            effective_replica_throughput(&table, &Replica::new("eu-west-1").with_read_capacity(4)),
            Some(WireThroughput {
                read_capacity_units: Some(4),
                write_capacity_units: None,
            })
        );
    }
}
