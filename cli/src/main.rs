// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Storex CLI
//!
//! The `storex` binary is an operator front end for the Storex core: it
//! applies the schema, inspects configuration, and drives the provisioning
//! workflow and agreement lifecycle against the configured store.
//!
//! ## Commands
//!
//! - `storex migrate [--dry-run]` - Apply database migrations
//! - `storex config show|validate|generate` - Configuration management
//! - `storex provision` - Customer → facility → unit → agreement in one run
//! - `storex agreement complete|cancel|list` - Close or inspect agreements
//! - `storex unit status|set` - Inspect or change unit status

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;

use commands::{AgreementCommand, ConfigCommand, MigrateCommand, ProvisionCommand, UnitCommand};

/// Storex - self-storage facility backend
#[derive(Parser)]
#[command(name = "storex")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "STOREX_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "STOREX_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    #[command(name = "migrate")]
    Migrate {
        #[command(flatten)]
        command: MigrateCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Create a customer, facility, unit and agreement in one run
    #[command(name = "provision")]
    Provision {
        #[command(flatten)]
        command: ProvisionCommand,
    },

    /// Agreement lifecycle
    #[command(name = "agreement")]
    Agreement {
        #[command(subcommand)]
        command: AgreementCommand,
    },

    /// Unit status
    #[command(name = "unit")]
    Unit {
        #[command(subcommand)]
        command: UnitCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Migrate { command }) => commands::migrate::execute(command, cli.config).await,
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        Some(Commands::Provision { command }) => commands::provision::execute(command, cli.config).await,
        Some(Commands::Agreement { command }) => {
            commands::agreement::handle_command(command, cli.config).await
        }
        Some(Commands::Unit { command }) => commands::unit::handle_command(command, cli.config).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}
