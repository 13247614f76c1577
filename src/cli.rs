use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Cloud maintenance runbook generator
#[derive(Parser)]
#[command(name = "cloud-maintenance")]
#[command(about = "Generate numbered command files for a cloud maintenance window")]
#[command(version)]
pub struct Cli {
    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Snapshot source and maintenance scope shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ScopeArgs {
    /// The path to the resource snapshot file
    #[arg(short = 'd', long)]
    pub data_path: PathBuf,

    /// Maintenance ID
    #[arg(short = 'i', long)]
    pub maintenance_id: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the runbook for an operator
    Generate {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Name of operator
        #[arg(short, long)]
        operator: String,

        /// Root directory for generated files (overrides the config file)
        #[arg(long)]
        output_root: Option<PathBuf>,

        /// AWS CLI profile to put on every aws command (overrides the config file)
        #[arg(long)]
        aws_profile: Option<String>,

        /// Show the runbook without writing any file
        #[arg(long)]
        dry_run: bool,
    },
    /// List the resources in scope of a maintenance
    Inventory {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Only list what this operator sees
        #[arg(short, long)]
        operator: Option<String>,
    },
    /// Check that a snapshot loads and every step can generate its commands
    Validate {
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
