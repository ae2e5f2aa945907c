//! Warehouse - secondary-output service
//!
//! Main entry point for the warehouse CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{projects, start};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Warehouse - secondary outputs and group-analysis launches
#[derive(Parser)]
#[command(name = "warehouse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to config file (skips discovery)
    #[arg(long, global = true, env = "WAREHOUSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project database (overrides config)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the warehouse server
    Start(start::StartArgs),

    /// Manage the local project store
    Projects(projects::ProjectsArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = commands::load_config(cli.config.as_deref())?;

    // Console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "warehouse=debug,warehouse_server=debug,warehouse_client=debug,warehouse_store=debug,warehouse_config=debug,info"
    } else {
        "warehouse=info,warehouse_server=info,warehouse_client=info,warehouse_store=info,warn"
    };

    let log_dir = loaded
        .config
        .logging
        .as_ref()
        .and_then(|l| l.dir.clone())
        .or_else(|| warehouse_config::xdg_config_dir().map(|d| d.join("logs")))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "warehouse.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "warehouse=trace,warehouse_server=trace,warehouse_client=trace,warehouse_store=trace,warehouse_config=trace,info",
                )),
        )
        .init();

    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        database: cli.database.unwrap_or_else(|| loaded.config.database_path()),
        loaded,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Projects(args) => projects::run(args, &ctx),
    }
}
