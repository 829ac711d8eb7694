// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Connection Pool
//!
//! Wraps `sqlx::postgres::PgPool` in a thin `Database` newtype that is
//! created once at startup, handed to every PostgreSQL repository, and
//! closed explicitly on shutdown. There is no process-global handle.

use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::domain::repository::PostgresConfig;

/// Embedded schema migrations from `backend/core/migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    pub async fn from_config(config: &PostgresConfig) -> Result<Self> {
        Self::new(&config.connection_string, config.max_connections).await
    }

    /// Wrap an existing pool (tests, embedding callers)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query to confirm the store is reachable
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    /// Apply any pending migrations
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .context("Failed to apply migrations")?;
        info!("Database schema is up to date");
        Ok(())
    }

    /// Number of migrations already recorded in `_sqlx_migrations`.
    ///
    /// A database that was never migrated has no bookkeeping table and
    /// counts as zero. Any other failure is returned.
    pub async fn applied_migration_count(&self) -> Result<usize> {
        match sqlx::query("SELECT version FROM _sqlx_migrations")
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => Ok(rows.len()),
            Err(e) if is_undefined_table(&e) => Ok(0),
            Err(e) => Err(e).context("Failed to read applied migrations"),
        }
    }

    /// Release all pooled connections
    pub async fn close(self) {
        self.pool.close().await;
    }
}

// SQLSTATE 42P01
fn is_undefined_table(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("42P01"))
}
