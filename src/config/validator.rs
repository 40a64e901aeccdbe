//! Manifest validation.
//!
//! This module checks a table manifest before any remote call is made,
//! collecting every error and warning in one pass.

use crate::error::{ConfigError, ControllerError, Result};
use crate::resource::{BillingMode, StreamViewType, TableSpec};
use std::collections::HashSet;
use tracing::debug;

use super::spec::{TableManifest, MANIFEST_KIND};

/// Message reported when replicas are declared without the required streams.
pub const STREAMS_REQUIRED_MESSAGE: &str =
    "table must have DynamoDB Streams enabled with StreamViewType set to NEW_AND_OLD_IMAGES";

const MIN_TABLE_NAME_LEN: usize = 3;
const MAX_TABLE_NAME_LEN: usize = 255;

/// Validator for table manifests.
#[derive(Debug, Default)]
pub struct ManifestValidator {
    /// Treat warnings as errors.
    strict: bool,
}

/// Validation result containing all issues found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
    /// Set when the error is a region declared twice.
    pub duplicate_region: Option<String>,
}

impl ManifestValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self { strict: false }
    }

    /// Makes every warning fail validation.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Validates a manifest, failing on the first error found.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self, manifest: &TableManifest) -> Result<ValidationResult> {
        let result = self.check(manifest);

        match result.errors.first() {
            None => {
                debug!("Manifest validation passed");
                Ok(result)
            }
            Some(first) => Err(ControllerError::Config(first.to_config_error())),
        }
    }

    /// Validates only what the delete path needs: the manifest kind, its
    /// name, and the table name.
    ///
    /// Replica, stream and capacity rules describe how a table should be
    /// created; deletion works from the remote replica list instead.
    ///
    /// # Errors
    ///
    /// Returns an error on the first failed check.
    pub fn validate_for_delete(&self, manifest: &TableManifest) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_metadata(manifest, &mut result);
        Self::validate_table_name(&manifest.spec.table_name, &mut result);

        match result.errors.first() {
            None => {
                debug!("Manifest is usable for deletion");
                Ok(result)
            }
            Some(first) => Err(ControllerError::Config(first.to_config_error())),
        }
    }

    /// Collects every error and warning without failing.
    #[must_use]
    pub fn check(&self, manifest: &TableManifest) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_metadata(manifest, &mut result);
        Self::validate_table_name(&manifest.spec.table_name, &mut result);
        Self::validate_replicas(&manifest.spec, &mut result);
        Self::validate_streams(&manifest.spec, &mut result);
        Self::validate_capacity(&manifest.spec, &mut result);

        if self.strict {
            for warning in std::mem::take(&mut result.warnings) {
                result.push_error("warning", warning);
            }
        }

        result
    }

    fn validate_metadata(manifest: &TableManifest, result: &mut ValidationResult) {
        if manifest.kind != MANIFEST_KIND {
            result.push_error(
                "kind",
                format!("Unsupported kind '{}', expected '{MANIFEST_KIND}'", manifest.kind),
            );
        }

        if manifest.metadata.name.is_empty() {
            result.push_error("metadata.name", "Resource name cannot be empty");
        }
    }

    fn validate_table_name(name: &str, result: &mut ValidationResult) {
        if name.is_empty() {
            result.push_error("spec.tableName", "Table name cannot be empty");
        } else if !is_valid_table_name(name) {
            result.push_error(
                "spec.tableName",
                format!(
                    "Table name '{name}' is invalid. Must be {MIN_TABLE_NAME_LEN}-{MAX_TABLE_NAME_LEN} \
                     characters of letters, digits, '_', '-' or '.'"
                ),
            );
        }
    }

    fn validate_replicas(spec: &TableSpec, result: &mut ValidationResult) {
        let Some(replicas) = &spec.replicas else {
            return;
        };

        let mut seen = HashSet::new();

        for (i, replica) in replicas.iter().enumerate() {
            let field = format!("spec.replicas[{i}].regionName");

            if replica.region_name.trim().is_empty() {
                result.push_error(field, "Replica region cannot be empty");
                continue;
            }

            if !seen.insert(replica.region_name.as_str()) {
                result.errors.push(ValidationError {
                    field,
                    message: format!("Duplicate replica region: {}", replica.region_name),
                    duplicate_region: Some(replica.region_name.clone()),
                });
            }
        }
    }

    fn validate_streams(spec: &TableSpec, result: &mut ValidationResult) {
        if !spec.replicas.as_ref().is_some_and(|r| !r.is_empty()) {
            return;
        }

        let streams_ok = spec.stream_specification.is_some_and(|s| {
            s.stream_enabled && s.stream_view_type == Some(StreamViewType::NewAndOldImages)
        });

        if !streams_ok {
            result.push_error("spec.streamSpecification", STREAMS_REQUIRED_MESSAGE);
        }
    }

    fn validate_capacity(spec: &TableSpec, result: &mut ValidationResult) {
        if let Some(pt) = &spec.provisioned_throughput {
            if spec.billing_mode == Some(BillingMode::PayPerRequest) {
                result.warnings.push(String::from(
                    "spec.provisionedThroughput: ignored by DynamoDB when billingMode is PAY_PER_REQUEST",
                ));
            }

            let fields = [
                ("readCapacityUnits", pt.read_capacity_units),
                ("writeCapacityUnits", pt.write_capacity_units),
            ];
            for (name, value) in fields {
                if let Some(units) = value.filter(|u| *u <= 0) {
                    result.warnings.push(format!(
                        "spec.provisionedThroughput.{name}: {units} is not a positive capacity"
                    ));
                }
            }
        }

        for (i, replica) in spec.replicas.iter().flatten().enumerate() {
            if let Some(units) = replica.read_capacity_override().filter(|u| *u <= 0) {
                result.warnings.push(format!(
                    "spec.replicas[{i}].provisionedThroughputOverride.readCapacityUnits: \
                     {units} is not a positive capacity"
                ));
            }
        }
    }
}

/// Table names are 3-255 characters of `[A-Za-z0-9_.-]`.
fn is_valid_table_name(name: &str) -> bool {
    (MIN_TABLE_NAME_LEN..=MAX_TABLE_NAME_LEN).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

impl ValidationResult {
    fn push_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            message: message.into(),
            duplicate_region: None,
        });
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl ValidationError {
    /// Converts this issue into the matching configuration error.
    #[must_use]
    pub fn to_config_error(&self) -> ConfigError {
        match &self.duplicate_region {
            Some(region) => ConfigError::DuplicateReplica {
                region: region.clone(),
            },
            None => ConfigError::validation(self.message.clone(), self.field.clone()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManifestMetadata;
    use crate::resource::{ProvisionedThroughput, Replica, StreamSpecification};

    fn manifest(spec: TableSpec) -> TableManifest {
        TableManifest {
            api_version: None,
            kind: String::from("Table"),
            metadata: ManifestMetadata {
                name: String::from("orders"),
            },
            spec,
            controller: crate::config::ControllerSettings::default(),
        }
    }

    fn replicated(regions: &[&str]) -> TableSpec {
        TableSpec {
            table_name: String::from("orders"),
            stream_specification: Some(StreamSpecification {
                stream_enabled: true,
                stream_view_type: Some(StreamViewType::NewAndOldImages),
            }),
            replicas: Some(regions.iter().map(|r| Replica::new(*r)).collect()),
            ..TableSpec::default()
        }
    }

    #[test]
    fn test_valid_table_name() {
        assert!(is_valid_table_name("orders"));
        assert!(is_valid_table_name("Orders_v2.prod-eu"));
        assert!(is_valid_table_name("abc"));
    }

    #[test]
    fn test_invalid_table_name() {
        assert!(!is_valid_table_name("ab"));
        assert!(!is_valid_table_name("orders table"));
        assert!(!is_valid_table_name("orders/2024"));
        assert!(!is_valid_table_name(&"a".repeat(256)));
    }

    #[test]
    fn test_replicated_manifest_is_valid() {
        let result = ManifestValidator::new()
            .validate(&manifest(replicated(&["eu-west-1", "ap-south-1"])))
            .expect("manifest should be valid");

        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_duplicate_region_is_rejected() {
        let err = ManifestValidator::new()
            .validate(&manifest(replicated(&["eu-west-1", "eu-west-1"])))
            .expect_err("duplicate regions should fail");

        match err {
            ControllerError::Config(ConfigError::DuplicateReplica { region }) => {
                assert_eq!(region, "eu-west-1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_replicas_require_new_and_old_images_stream() {
        let mut spec = replicated(&["eu-west-1"]);
        spec.stream_specification = Some(StreamSpecification {
            stream_enabled: true,
            stream_view_type: Some(StreamViewType::KeysOnly),
        });

        let result = ManifestValidator::new().check(&manifest(spec));

        assert_eq!(result.error_count(), 1);
        assert_eq!(result.errors[0].field, "spec.streamSpecification");
        assert_eq!(result.errors[0].message, STREAMS_REQUIRED_MESSAGE);
    }

    #[test]
    fn test_delete_path_ignores_create_time_rules() {
        let yaml = r"
kind: Table
metadata:
  name: orders
spec:
  tableName: orders
  replicas:
    - regionName: eu-west-1
";
        let m = crate::config::ManifestParser::new()
            .parse_yaml(yaml, None)
            .expect("manifest should parse");
        let validator = ManifestValidator::new();

        let err = validator.validate(&m).expect_err("streams are required to create");
        assert!(err.to_string().contains(STREAMS_REQUIRED_MESSAGE));

        let result = validator
            .validate_for_delete(&m)
            .expect("deletion does not need streams");
        assert!(result.is_valid());
    }

    #[test]
    fn test_delete_path_still_checks_table_name() {
        let mut m = manifest(replicated(&["eu-west-1"]));
        m.spec.table_name = String::from("x");

        let err = ManifestValidator::new()
            .validate_for_delete(&m)
            .expect_err("bad table name should fail");

        assert!(err.to_string().contains("Table name 'x' is invalid"));
    }

    #[test]
    fn test_empty_region_and_bad_kind() {
        let mut m = manifest(replicated(&[""]));
        m.kind = String::from("Bucket");

        let result = ManifestValidator::new().check(&m);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();

        assert_eq!(fields, vec!["kind", "spec.replicas[0].regionName"]);
    }

    #[test]
    fn test_capacity_issues_are_warnings() {
        let mut spec = replicated(&["eu-west-1"]);
        spec.billing_mode = Some(BillingMode::PayPerRequest);
        spec.provisioned_throughput = Some(ProvisionedThroughput {
            read_capacity_units: Some(0),
            write_capacity_units: None,
        });
        spec.replicas = Some(vec![Replica::new("eu-west-1").with_read_capacity(-1)]);

        let result = ManifestValidator::new()
            .validate(&manifest(spec))
            .expect("warnings do not fail validation");

        assert_eq!(result.warning_count(), 3);
        assert!(result.warnings[0].contains("PAY_PER_REQUEST"));
    }

    #[test]
    fn test_strict_mode_promotes_warnings() {
        let mut spec = replicated(&["eu-west-1"]);
        spec.provisioned_throughput = Some(ProvisionedThroughput {
            read_capacity_units: Some(-5),
            write_capacity_units: Some(1),
        });

        let err = ManifestValidator::new()
            .strict(true)
            .validate(&manifest(spec))
            .expect_err("strict validation should fail");

        assert!(err.to_string().contains("readCapacityUnits"));
    }
}
