// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # DynamoDB Table Controller
//!
//! Delete reconciliation for managed, replicated `DynamoDB` tables.
//!
//! ## Overview
//!
//! Given the intent to delete a table that may have cross-region replicas
//! and may be in the middle of a transition, the controller decides on every
//! pass whether the delete can be issued now, which replicas must be removed
//! first, and whether the caller should come back later.
//!
//! ## Architecture
//!
//! Each pass follows the same shape:
//!
//! 1. **Observe**: describe the remote table and build a fresh [`resource::Table`]
//! 2. **Plan**: the [`planner::DeletePlanner`] requeues busy tables and removes replicas
//! 3. **Act**: the [`reconciler::TableReconciler`] issues the delete and maps the result
//!
//! Nothing observed on one pass is reused on the next.
//!
//! ## Modules
//!
//! - [`config`]: Manifest parsing, environment overrides and validation
//! - [`resource`]: Table resource types and remote phase predicates
//! - [`dynamodb`]: Remote table client and throughput normalization
//! - [`planner`]: Replica diff, replica sync and delete planning
//! - [`reconciler`]: Delete passes and the loop that runs them to completion
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! kind: Table
//! metadata:
//!   name: orders
//! spec:
//!   tableName: orders
//!   streamSpecification:
//!     streamEnabled: true
//!     streamViewType: NEW_AND_OLD_IMAGES
//!   replicas:
//!     - regionName: eu-west-1
//! controller:
//!   region: us-east-1
//!   maxPasses: 30
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod dynamodb;
pub mod error;
pub mod planner;
pub mod reconciler;
pub mod resource;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ControllerSettings, ManifestParser, ManifestValidator, TableManifest};
pub use dynamodb::{normalize_throughput, AwsTableClient, TableClient, WireThroughput};
pub use error::{ControllerError, Result};
pub use planner::{DeleteDecision, DeletePlanner, ReplicaSync, RequeueReason, SyncStatus};
pub use reconciler::{DeleteOutcome, DeletePreview, DeletionReport, TableReconciler};
pub use resource::{is_deleting, is_updating, RemotePhase, Table, TableSpec, TableStatus};
