// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use storex_core::domain::config::{BackendKind, StorexConfig};

const ANNOTATED_TEMPLATE: &str = include_str!("../../templates/storex-config.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./storex-config.yaml")]
        output: PathBuf,

        /// Include comments for every field
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, examples } => generate(output, examples),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = StorexConfig::load_or_default(config_override.clone()).context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. STOREX_CONFIG_PATH: {}",
            std::env::var("STOREX_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./storex-config.yaml");
        println!("  4. ~/.storex/config.yaml");
        println!("  5. /etc/storex/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Node:".bold());
    println!("  Name: {}", config.metadata.name);
    if let Some(region) = &config.metadata.region {
        println!("  Region: {}", region);
    }
    println!();

    println!("{}", "Storage:".bold());
    let backend = match config.spec.storage_backend {
        BackendKind::Postgres => "postgres",
        BackendKind::InMemory => "in_memory",
    };
    println!("  Backend: {}", backend);
    if config.spec.storage_backend == BackendKind::Postgres {
        println!("  Database: {}", config.redacted_database_url());
        println!("  Max connections: {}", config.spec.database.max_connections);
    }
    match config.spec.database.operation_timeout_secs {
        Some(secs) => println!("  Operation timeout: {}s", secs),
        None => println!("  Operation timeout: {}", "(none)".dimmed()),
    }
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = StorexConfig::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());
    Ok(())
}

fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    if with_examples {
        std::fs::write(&output, ANNOTATED_TEMPLATE)
            .with_context(|| format!("Failed to write config to {:?}", output))?;
    } else {
        StorexConfig::default()
            .to_yaml_file(&output)
            .with_context(|| format!("Failed to write config to {:?}", output))?;
    }

    println!("{}", format!("✓ Configuration generated: {}", output.display()).green());
    Ok(())
}
