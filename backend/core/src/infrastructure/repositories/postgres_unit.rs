// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Unit
//!
//! PostgreSQL-backed persistence for storage units.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements `UnitRepository` over the `units` table
//!
//! Operational status changes lock the unit row (`SELECT … FOR UPDATE`) so
//! they serialize with agreement creation on the same unit.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::info;

use crate::domain::facility::FacilityId;
use crate::domain::repository::{RepositoryError, UnitRepository};
use crate::domain::unit::{NewUnit, Unit, UnitId, UnitStatus};
use crate::infrastructure::repositories::check_operational_transition;

pub(crate) const UNIT_COLUMNS: &str =
    "id, facility_id, unit_type, size, price, status, created_at, updated_at";

pub struct PostgresUnitRepository {
    pool: PgPool,
}

impl PostgresUnitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitRepository for PostgresUnitRepository {
    async fn create(&self, input: NewUnit) -> Result<Unit, RepositoryError> {
        let unit = Unit::new(input)?;

        let query = format!(
            r#"
            INSERT INTO units (id, facility_id, unit_type, size, price, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {UNIT_COLUMNS}
            "#
        );
        let row = sqlx::query(&query)
            .bind(unit.id.0)
            .bind(unit.facility_id.0)
            .bind(&unit.unit_type)
            .bind(&unit.size)
            .bind(&unit.price)
            .bind(unit.status.as_str())
            .bind(unit.created_at)
            .bind(unit.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match RepositoryError::from(e) {
                RepositoryError::NotFound { .. } => RepositoryError::not_found("facility", unit.facility_id),
                other => other,
            })?;

        let stored = parse_unit_row(&row)?;
        info!("Created unit {} in facility {} ({})", stored.id, stored.facility_id, stored.status);
        Ok(stored)
    }

    async fn find_by_id(&self, id: UnitId) -> Result<Option<Unit>, RepositoryError> {
        let query = format!("SELECT {UNIT_COLUMNS} FROM units WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(parse_unit_row).transpose()
    }

    async fn find_by_facility(&self, facility_id: FacilityId) -> Result<Vec<Unit>, RepositoryError> {
        let query = format!("SELECT {UNIT_COLUMNS} FROM units WHERE facility_id = $1 ORDER BY created_at ASC");
        let rows = sqlx::query(&query)
            .bind(facility_id.0)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(parse_unit_row).collect()
    }

    async fn transition_status(&self, id: UnitId, to: UnitStatus) -> Result<Unit, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {UNIT_COLUMNS} FROM units WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&query)
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::not_found("unit", id))?;

        let mut unit = parse_unit_row(&row)?;
        check_operational_transition(&unit, to)?;
        unit.transition_to(to)?;

        sqlx::query("UPDATE units SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(unit.id.0)
            .bind(unit.status.as_str())
            .bind(unit.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Unit {} is now {}", id, to);
        Ok(unit)
    }
}

pub(crate) fn parse_unit_row(row: &PgRow) -> Result<Unit, RepositoryError> {
    let status: String = row.try_get("status")?;
    Ok(Unit {
        id: UnitId(row.try_get("id")?),
        facility_id: FacilityId(row.try_get("facility_id")?),
        unit_type: row.try_get("unit_type")?,
        size: row.try_get("size")?,
        price: row.try_get("price")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
