//! ddbctl CLI entrypoint.
//!
//! This is the main entrypoint for the ddbctl command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ddb_table_controller::cli::{Cli, Commands, LogFormat, OutputFormatter};
use ddb_table_controller::config::{
    find_manifest_file, ManifestParser, ManifestValidator, TableManifest,
};
use ddb_table_controller::dynamodb::{AwsTableClient, TableClient};
use ddb_table_controller::error::{ControllerError, ReconcileError, Result};
use ddb_table_controller::reconciler::TableReconciler;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_format);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` takes precedence over `--verbose` when set.
fn init_logging(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Validate { strict } => cmd_validate(cli.manifest.as_ref(), strict, &formatter),
        Commands::Status => cmd_status(cli.manifest.as_ref(), &formatter).await,
        Commands::PlanDelete => cmd_plan_delete(cli.manifest.as_ref(), &formatter).await,
        Commands::Delete {
            once,
            yes,
            max_passes,
        } => cmd_delete(cli.manifest.as_ref(), once, yes, max_passes, &formatter).await,
    }
}

/// Validate the manifest.
fn cmd_validate(
    manifest_path: Option<&PathBuf>,
    strict: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let manifest_file = resolve_manifest_path(manifest_path)?;
    info!("Validating manifest: {}", manifest_file.display());

    let parser = ManifestParser::new().with_base_path(base_dir(&manifest_file));
    parser.load_dotenv()?;
    let manifest = parser.load_with_env(&manifest_file)?;

    let result = ManifestValidator::new().strict(strict).check(&manifest);
    eprintln!("{}", formatter.format_validation(&manifest, &result));

    match result.errors.first() {
        None => Ok(()),
        Some(first) => Err(ControllerError::Config(first.to_config_error())),
    }
}

/// Show the observed table.
async fn cmd_status(manifest_path: Option<&PathBuf>, formatter: &OutputFormatter) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let client = create_client(&manifest).await;
    let reconciler = TableReconciler::new(&client, &manifest.controller);

    let observed = reconciler.observe(&manifest.spec).await?;
    eprintln!(
        "{}",
        formatter.format_status(manifest.table_name(), observed.as_ref())
    );

    Ok(())
}

/// Show what a delete pass would do.
async fn cmd_plan_delete(
    manifest_path: Option<&PathBuf>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let client = create_client(&manifest).await;
    let reconciler = TableReconciler::new(&client, &manifest.controller);

    let preview = reconciler.preview_delete(&manifest.spec).await?;
    eprintln!("{}", formatter.format_preview(&preview));

    Ok(())
}

/// Delete the table.
async fn cmd_delete(
    manifest_path: Option<&PathBuf>,
    once: bool,
    auto_approve: bool,
    max_passes: Option<u32>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut manifest = load_manifest(manifest_path)?;
    if let Some(passes) = max_passes {
        manifest.controller.max_passes = passes;
    }

    let client = create_client(&manifest).await;
    let reconciler = TableReconciler::new(&client, &manifest.controller);

    // Show what is about to happen
    let preview = reconciler.preview_delete(&manifest.spec).await?;
    eprintln!("{}", formatter.format_preview(&preview));

    if !preview.exists {
        return Ok(());
    }

    // Confirm
    if !auto_approve {
        eprint!(
            "\nThis action is IRREVERSIBLE. Type the table name '{}' to confirm: ",
            manifest.table_name()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if input.trim() != manifest.table_name() {
            return Err(ControllerError::Reconcile(ReconcileError::Aborted {
                reason: String::from("deletion not confirmed"),
            }));
        }
    }

    if once {
        let outcome = reconciler.reconcile_delete(&manifest.spec).await?;
        eprintln!("{}", formatter.format_outcome(manifest.table_name(), &outcome));
    } else {
        let report = reconciler.delete_until_gone(&manifest.spec).await?;
        eprintln!("{}", formatter.format_report(&report));
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolves the manifest file path.
fn resolve_manifest_path(manifest_path: Option<&PathBuf>) -> Result<PathBuf> {
    manifest_path.map_or_else(|| find_manifest_file("."), |path| Ok(path.clone()))
}

/// Directory holding the manifest, used to find `.env`.
fn base_dir(manifest_file: &Path) -> &Path {
    manifest_file.parent().unwrap_or_else(|| Path::new("."))
}

/// Loads and overrides the manifest, then checks what the delete path needs.
fn load_manifest(manifest_path: Option<&PathBuf>) -> Result<TableManifest> {
    let manifest_file = resolve_manifest_path(manifest_path)?;
    debug!("Loading manifest from: {}", manifest_file.display());

    let parser = ManifestParser::new().with_base_path(base_dir(&manifest_file));
    parser.load_dotenv()?;

    let manifest = parser.load_with_env(&manifest_file)?;
    ManifestValidator::new().validate_for_delete(&manifest)?;

    Ok(manifest)
}

/// Creates the `DynamoDB` client for the manifest's region and endpoint.
async fn create_client(manifest: &TableManifest) -> AwsTableClient {
    let client = AwsTableClient::from_env(
        manifest.controller.region.as_deref(),
        manifest.controller.endpoint_url.as_deref(),
    )
    .await;
    debug!("Using {} table client", client.client_type());
    client
}
