//! cloud-maintenance - Main entry point
//!
//! Loads a resource snapshot, resolves the operator's view of one maintenance
//! and writes the numbered runbook for them to execute by hand.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use cloudmaint::cli::{Cli, Commands, ScopeArgs};
use cloudmaint::engine::pipeline::{plan_pipeline, run_pipeline};
use cloudmaint::{MAINTENANCE_RUNBOOK, MaintenanceConfig, OperatorContext, ResourceDataLoader, Snapshot};

/// Initialize the tracing subscriber with appropriate settings
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    // Allows RUST_LOG env var to override
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main application entry point
fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);
    debug!("CLI arguments parsed");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Using configuration file: {:?}", path);
            MaintenanceConfig::load_from_file(path)?
        }
        None => MaintenanceConfig::default(),
    };

    match cli.command {
        Commands::Generate {
            scope,
            operator,
            output_root,
            aws_profile,
            dry_run,
        } => {
            apply_overrides(&mut config, output_root, aws_profile);
            config.validate().context("Invalid configuration")?;
            generate(&config, &scope, &operator, dry_run)
        }
        Commands::Inventory { scope, operator } => inventory(&scope, operator.as_deref()),
        Commands::Validate { scope } => {
            config.validate().context("Invalid configuration")?;
            validate(&config, &scope)
        }
    }
}

/// CLI flags win over the configuration file.
fn apply_overrides(config: &mut MaintenanceConfig, output_root: Option<PathBuf>, aws_profile: Option<String>) {
    if let Some(root) = output_root {
        config.output_root = root;
    }
    if let Some(profile) = aws_profile {
        config.aws_profile = Some(profile);
    }
}

fn load_snapshot(scope: &ScopeArgs) -> Result<Snapshot> {
    Snapshot::read_from_file(&scope.data_path)
        .with_context(|| format!("Failed to load snapshot {:?}", scope.data_path))
}

fn generate(config: &MaintenanceConfig, scope: &ScopeArgs, operator: &str, dry_run: bool) -> Result<()> {
    let snapshot = load_snapshot(scope)?;

    let regions = ResourceDataLoader::build(&snapshot, &scope.maintenance_id, None)?;
    for line in regions.detail_lines() {
        info!("{}", line);
    }

    if dry_run {
        let context = OperatorContext::load(operator, &snapshot, &scope.maintenance_id, &config.output_root)?;
        let report = plan_pipeline(MAINTENANCE_RUNBOOK, &context, config)?;
        println!("{}", report.summary());
        for step in report.realized() {
            println!();
            println!("# {}", step);
            for command in &step.commands {
                println!("{}", command);
            }
        }
        return Ok(());
    }

    let context = OperatorContext::resolve_from_snapshot(
        operator,
        &snapshot,
        &scope.maintenance_id,
        &config.output_root,
    )?;
    let report = run_pipeline(MAINTENANCE_RUNBOOK, &context, config)?;
    println!("{}", report.summary());
    println!(
        "✓ {} step file(s) written to {}",
        report.realized_count(),
        report.output_dir.display()
    );
    Ok(())
}

fn inventory(scope: &ScopeArgs, operator: Option<&str>) -> Result<()> {
    let snapshot = load_snapshot(scope)?;
    let topology = ResourceDataLoader::build(&snapshot, &scope.maintenance_id, operator)?;
    for line in topology.detail_lines() {
        println!("{}", line);
    }
    println!("{} resource(s) in scope", topology.resource_count());
    Ok(())
}

fn validate(config: &MaintenanceConfig, scope: &ScopeArgs) -> Result<()> {
    let snapshot = load_snapshot(scope)?;
    let topology = ResourceDataLoader::build(&snapshot, &scope.maintenance_id, None)?;

    // Plan against the unscoped view so every resource's commands are checked
    let context = OperatorContext {
        operator_id: "validate".to_string(),
        output_dir: config.output_root.clone(),
        topology,
    };
    let report = plan_pipeline(MAINTENANCE_RUNBOOK, &context, config)?;
    println!(
        "✓ Snapshot is valid: {} resource(s), {} step(s)",
        context.topology.resource_count(),
        report.realized_count()
    );
    Ok(())
}
