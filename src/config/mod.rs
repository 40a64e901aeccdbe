//! Configuration module for the table controller.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `table.yaml` manifests
//! - Environment overrides for controller settings
//! - Validation of manifest values

mod parser;
mod spec;
mod validator;

pub use parser::{
    apply_env_overrides, find_manifest_file, ManifestParser, DEFAULT_MANIFEST_FILES,
    ENV_ENDPOINT_URL, ENV_MAX_PASSES, ENV_REGION, ENV_REQUEUE_SECS,
};
pub use spec::{
    ControllerSettings, ManifestMetadata, RequeueSettings, TableManifest, MANIFEST_KIND,
};
pub use validator::{
    ManifestValidator, ValidationError, ValidationResult, STREAMS_REQUIRED_MESSAGE,
};
