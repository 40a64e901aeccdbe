//! Error types for the table controller.
//!
//! This module provides the error hierarchy for every stage of the delete
//! path: manifest loading, remote `DynamoDB` calls, and reconciliation.
//! Requeue decisions are values of [`crate::planner::DeleteDecision`],
//! never errors.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the table controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote `DynamoDB` errors.
    #[error("DynamoDB error: {0}")]
    Remote(#[from] RemoteError),

    /// Reconciliation errors.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The manifest file was not found.
    #[error("Manifest file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The manifest file could not be parsed.
    #[error("Failed to parse manifest: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Manifest validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Environment variable is set to a value that cannot be used.
    #[error("Invalid value '{value}' for environment variable {name}: expected {expected}")]
    InvalidEnvVar {
        /// Name of the variable.
        name: String,
        /// The value that was set.
        value: String,
        /// What the variable should hold.
        expected: &'static str,
    },

    /// Two replicas in one spec target the same region.
    #[error("Duplicate replica region: {region}")]
    DuplicateReplica {
        /// The duplicated region.
        region: String,
    },
}

/// Errors returned by the remote table API.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The table does not exist.
    #[error("Table not found: {table}")]
    ResourceNotFound {
        /// Table name.
        table: String,
    },

    /// The table is busy with another operation.
    #[error("Table '{table}' is in use: {message}")]
    ResourceInUse {
        /// Table name.
        table: String,
        /// Message from the API.
        message: String,
    },

    /// The request was rejected as invalid.
    #[error("Request rejected by DynamoDB: {message}")]
    Validation {
        /// Message from the API.
        message: String,
    },

    /// The request was throttled.
    #[error("DynamoDB request throttled: {message}")]
    Throttled {
        /// Message from the API.
        message: String,
    },

    /// Transport failure.
    #[error("Network error communicating with DynamoDB: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// Any other service error.
    #[error("DynamoDB service error ({code}): {message}")]
    Service {
        /// Error code reported by the service.
        code: String,
        /// Message from the API.
        message: String,
    },

    /// The response was missing data the controller needs.
    #[error("Invalid response from DynamoDB: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Reconciliation errors.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The driver loop ran out of passes before the table was gone.
    #[error("Table '{table}' still present after {passes} reconciliation passes")]
    PassLimitExceeded {
        /// Table name.
        table: String,
        /// Number of passes made.
        passes: u32,
    },

    /// Reconciliation was aborted.
    #[error("Reconciliation aborted: {reason}")]
    Aborted {
        /// Reason for abort.
        reason: String,
    },
}

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;

impl ControllerError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Remote(
                RemoteError::Throttled { .. }
                    | RemoteError::Network { .. }
                    | RemoteError::ResourceInUse { .. }
            )
        )
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::Remote(RemoteError::Throttled { .. }) => Some(10),
            Self::Remote(RemoteError::Network { .. }) => Some(5),
            Self::Remote(RemoteError::ResourceInUse { .. }) => Some(30),
            _ => None,
        }
    }

    /// Returns true if this error reports that the table does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote(RemoteError::ResourceNotFound { .. }))
    }

    /// Returns true if this error reports that the table is busy.
    #[must_use]
    pub const fn is_in_use(&self) -> bool {
        matches!(self, Self::Remote(RemoteError::ResourceInUse { .. }))
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl RemoteError {
    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}
