// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Facility
//!
//! PostgreSQL-backed persistence for facilities. The configuration payload
//! lives in a JSONB column and is re-validated on the way out, so a row
//! edited by hand into a non-object surfaces as a serialization error
//! instead of a silently empty config.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements `FacilityRepository` over the `facilities` table

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::info;

use crate::domain::facility::{Facility, FacilityConfig, FacilityId, NewFacility};
use crate::domain::repository::{FacilityRepository, RepositoryError};

pub struct PostgresFacilityRepository {
    pool: PgPool,
}

impl PostgresFacilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FacilityRepository for PostgresFacilityRepository {
    async fn create(&self, input: NewFacility) -> Result<Facility, RepositoryError> {
        let facility = Facility::new(input)?;

        let row = sqlx::query(
            r#"
            INSERT INTO facilities (id, name, address, region, config, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, address, region, config, created_at
            "#,
        )
        .bind(facility.id.0)
        .bind(&facility.name)
        .bind(&facility.address)
        .bind(&facility.region)
        .bind(facility.config.to_value())
        .bind(facility.created_at)
        .fetch_one(&self.pool)
        .await?;

        let stored = parse_facility_row(&row)?;
        info!("Created facility {} ({})", stored.id, stored.name);
        Ok(stored)
    }

    async fn find_by_id(&self, id: FacilityId) -> Result<Option<Facility>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, address, region, config, created_at
            FROM facilities
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(parse_facility_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Facility>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, address, region, config, created_at
            FROM facilities
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_facility_row).collect()
    }
}

fn parse_facility_row(row: &PgRow) -> Result<Facility, RepositoryError> {
    let config_val: serde_json::Value = row.try_get("config")?;
    let config = FacilityConfig::from_value(config_val)
        .map_err(|e| RepositoryError::Serialization(format!("Failed to deserialize config: {}", e)))?;

    Ok(Facility {
        id: FacilityId(row.try_get("id")?),
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        region: row.try_get("region")?,
        config,
        created_at: row.try_get("created_at")?,
    })
}
