// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Database Migrate Command
//!
//! Implements `storex migrate`, which brings the PostgreSQL schema up to
//! date with the migrations embedded in `storex-core`.
//!
//! # Architecture
//!
//! - **Layer:** CLI/Presentation
//! - **Purpose:** Database schema migration management
//! - **Integration:** CLI → `storex_core::infrastructure::db::MIGRATOR` → PostgreSQL
//!
//! # Usage
//!
//! ```bash
//! # Apply all pending migrations
//! storex migrate
//!
//! # Preview migrations without applying
//! storex migrate --dry-run
//! ```
//!
//! The database URL comes from the loaded configuration, which honours
//! `STOREX_DATABASE_URL` and `DATABASE_URL`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use storex_core::domain::config::StorexConfig;
use storex_core::domain::repository::StorageBackend;
use storex_core::infrastructure::db::{Database, MIGRATOR};

#[derive(Args)]
pub struct MigrateCommand {
    /// Perform a dry run without applying changes
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(cmd: MigrateCommand, config_path: Option<PathBuf>) -> Result<()> {
    println!("{}", "Storex Migrate".bold().green());

    let config = StorexConfig::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    let StorageBackend::PostgreSQL(pg) = config.storage_backend() else {
        println!("{}", "In-memory backend configured; nothing to migrate.".yellow());
        return Ok(());
    };

    println!("Connecting to {}...", config.redacted_database_url());
    let db = Database::new(&pg.connection_string, 1).await?;
    db.ping().await?;

    let applied_count = match db.applied_migration_count().await {
        Ok(count) => count,
        Err(e) => {
            db.close().await;
            return Err(e);
        }
    };
    let total_migrations = MIGRATOR.iter().count();

    println!(
        "Migration status: {} applied, {} total available.",
        applied_count, total_migrations
    );

    if applied_count < total_migrations {
        if cmd.dry_run {
            println!("Pending migrations found (Dry Run):");
            for migration in MIGRATOR.iter().skip(applied_count) {
                println!(" - {} {}", migration.version, migration.description);
            }
            println!("Skipping application due to --dry-run");
        } else {
            println!("Applying pending migrations...");
            db.migrate().await?;
            println!("{}", "✓ Database updated successfully.".green());
        }
    } else {
        println!("{}", "✓ Database is up to date.".green());
    }

    db.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storex-config.yaml");
        std::fs::write(
            &path,
            "apiVersion: storex/v1\nkind: NotAStorexConfig\nmetadata:\n  name: storex\nspec:\n  storage_backend: in_memory\n",
        )
        .unwrap();

        let err = execute(MigrateCommand { dry_run: true }, Some(path))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Configuration validation failed"));
    }
}
