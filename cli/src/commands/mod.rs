// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Storex CLI

pub mod agreement;
pub mod config;
pub mod migrate;
pub mod provision;
pub mod unit;

pub use self::agreement::AgreementCommand;
pub use self::config::ConfigCommand;
pub use self::migrate::MigrateCommand;
pub use self::provision::ProvisionCommand;
pub use self::unit::UnitCommand;

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, warn};

use storex_core::application::{create_repositories, Repositories};
use storex_core::domain::config::StorexConfig;
use storex_core::domain::repository::StorageBackend;
use storex_core::infrastructure::db::Database;

/// Configured store opened for the duration of one command.
pub(crate) struct Session {
    pub config: StorexConfig,
    pub repos: Repositories,
    database: Option<Database>,
}

impl Session {
    pub async fn open(config_path: Option<PathBuf>) -> Result<Self> {
        let config = StorexConfig::load_or_default(config_path).context("Failed to load configuration")?;
        config.validate().context("Configuration validation failed")?;

        let backend = config.storage_backend();
        let database = match &backend {
            StorageBackend::PostgreSQL(pg) => {
                debug!("Connecting to {}", config.redacted_database_url());
                let db = Database::from_config(pg).await?;
                db.ping().await?;
                Some(db)
            }
            StorageBackend::InMemory => {
                warn!("Using the in-memory store; nothing will outlive this command");
                None
            }
        };

        let repos = create_repositories(&backend, database.as_ref())?;
        Ok(Self {
            config,
            repos,
            database,
        })
    }

    pub async fn close(self) {
        if let Some(db) = self.database {
            db.close().await;
        }
    }
}
