//! Manifest parser for loading table manifests.
//!
//! This module handles loading manifests from YAML files and applying
//! environment variable overrides to the controller settings.

use crate::error::{ConfigError, ControllerError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::{ControllerSettings, RequeueSettings, TableManifest};

/// Environment variable overriding the AWS region.
pub const ENV_REGION: &str = "DDBCTL_REGION";
/// Environment variable overriding the endpoint URL.
pub const ENV_ENDPOINT_URL: &str = "DDBCTL_ENDPOINT_URL";
/// Environment variable overriding the pass limit.
pub const ENV_MAX_PASSES: &str = "DDBCTL_MAX_PASSES";
/// Environment variable overriding every requeue delay.
pub const ENV_REQUEUE_SECS: &str = "DDBCTL_REQUEUE_SECS";

/// Parser for table manifests.
#[derive(Debug, Default)]
pub struct ManifestParser {
    /// Base path for resolving the `.env` file.
    base_path: Option<PathBuf>,
}

impl ManifestParser {
    /// Creates a new manifest parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving the `.env` file.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a manifest from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<TableManifest> {
        let path = path.as_ref();
        info!("Loading manifest from: {}", path.display());

        if !path.exists() {
            return Err(ControllerError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ControllerError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses a manifest from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<TableManifest> {
        debug!("Parsing YAML manifest");

        let manifest: TableManifest = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            ControllerError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!("Parsed manifest for table: {}", manifest.table_name());
        Ok(manifest)
    }

    /// Loads a manifest and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if an
    /// override variable holds an invalid number.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<TableManifest> {
        let mut manifest = self.load_file(path)?;
        apply_env_overrides(&mut manifest.controller, |name| std::env::var(name).ok())?;
        Ok(manifest)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ControllerError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Applies `DDBCTL_*` overrides to the controller settings.
///
/// `lookup` resolves a variable name to its value.
///
/// # Errors
///
/// Returns an error if a numeric override cannot be parsed.
pub fn apply_env_overrides(
    settings: &mut ControllerSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(region) = lookup(ENV_REGION) {
        debug!("Overriding controller.region from environment");
        settings.region = Some(region);
    }

    if let Some(endpoint) = lookup(ENV_ENDPOINT_URL) {
        debug!("Overriding controller.endpointUrl from environment");
        settings.endpoint_url = Some(endpoint);
    }

    if let Some(raw) = lookup(ENV_MAX_PASSES) {
        debug!("Overriding controller.maxPasses from environment");
        settings.max_passes = parse_number(ENV_MAX_PASSES, &raw)?;
    }

    if let Some(raw) = lookup(ENV_REQUEUE_SECS) {
        debug!("Overriding controller.requeue from environment");
        settings.requeue = RequeueSettings::uniform(parse_number(ENV_REQUEUE_SECS, &raw)?);
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        ControllerError::Config(ConfigError::InvalidEnvVar {
            name: name.to_string(),
            value: raw.to_string(),
            expected: "a non-negative integer",
        })
    })
}

/// Default manifest file names to search for.
pub const DEFAULT_MANIFEST_FILES: &[&str] = &["table.yaml", "table.yml", "ddbctl.yaml"];

/// Finds the manifest file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no manifest file is found.
pub fn find_manifest_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_MANIFEST_FILES {
            let manifest_path = current.join(filename);
            if manifest_path.exists() {
                info!("Found manifest file: {}", manifest_path.display());
                return Ok(manifest_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(ControllerError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_MANIFEST_FILES[0]),
    }))
}
