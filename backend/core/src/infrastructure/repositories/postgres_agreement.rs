// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! PostgreSQL Agreement Repository
//!
//! Provides PostgreSQL-backed persistence for rental agreements, including
//! the unit status changes that must accompany them.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Lease units to customers without ever double-leasing
//! - **Integration:** Domain AgreementRepository → PostgreSQL `agreements` + `units` tables
//!
//! # Transactions
//!
//! Both write paths run inside a single transaction:
//!
//! - **create**: verify the customer, lock the unit row with
//!   `SELECT … FOR UPDATE`, require `available`, insert the agreement, mark
//!   the unit `occupied`, commit.
//! - **close**: lock the agreement and its unit, move the agreement to
//!   `completed`/`cancelled`, return the unit to `available`, commit.
//!
//! Concurrent `create` calls on one unit queue on the row lock. The first
//! to commit wins; every later caller re-reads the row, sees `occupied` and
//! receives `Conflict`. The partial unique index
//! `idx_agreements_one_active_per_unit` backs this up at the storage layer,
//! and its unique violation also surfaces as `Conflict`.
//!
//! Any early return drops the `Transaction`, which rolls it back, so no
//! partial write is ever visible.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::{info, warn};

use crate::domain::agreement::{Agreement, AgreementId, AgreementStatus, NewAgreement};
use crate::domain::customer::CustomerId;
use crate::domain::repository::{AgreementRepository, RepositoryError};
use crate::domain::unit::{UnitId, UnitStatus};
use crate::infrastructure::repositories::postgres_unit::{parse_unit_row, UNIT_COLUMNS};

const AGREEMENT_COLUMNS: &str =
    "id, customer_id, unit_id, start_date, end_date, status, created_at, closed_at";

pub struct PostgresAgreementRepository {
    pool: PgPool,
}

impl PostgresAgreementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgreementRepository for PostgresAgreementRepository {
    async fn create(&self, input: NewAgreement) -> Result<Agreement, RepositoryError> {
        let agreement = Agreement::new(input)?;

        let mut tx = self.pool.begin().await?;

        let customer_exists = sqlx::query("SELECT 1 FROM customers WHERE id = $1")
            .bind(agreement.customer_id.0)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !customer_exists {
            return Err(RepositoryError::not_found("customer", agreement.customer_id));
        }

        let lock_query = format!("SELECT {UNIT_COLUMNS} FROM units WHERE id = $1 FOR UPDATE");
        let unit_row = sqlx::query(&lock_query)
            .bind(agreement.unit_id.0)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::not_found("unit", agreement.unit_id))?;
        let mut unit = parse_unit_row(&unit_row)?;

        if !unit.is_available() {
            warn!("Refusing agreement on unit {}: status is {}", unit.id, unit.status);
            return Err(RepositoryError::Conflict(format!(
                "unit {} is {}, not available",
                unit.id, unit.status
            )));
        }
        unit.transition_to(UnitStatus::Occupied)?;

        let insert_query = format!(
            r#"
            INSERT INTO agreements (id, customer_id, unit_id, start_date, end_date, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {AGREEMENT_COLUMNS}
            "#
        );
        let row = sqlx::query(&insert_query)
            .bind(agreement.id.0)
            .bind(agreement.customer_id.0)
            .bind(agreement.unit_id.0)
            .bind(agreement.start_date)
            .bind(agreement.end_date)
            .bind(agreement.status.as_str())
            .bind(agreement.created_at)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE units SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(unit.id.0)
            .bind(unit.status.as_str())
            .bind(unit.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let stored = parse_agreement_row(&row)?;
        info!(
            "Agreement {} created: customer {} now occupies unit {}",
            stored.id, stored.customer_id, stored.unit_id
        );
        Ok(stored)
    }

    async fn find_by_id(&self, id: AgreementId) -> Result<Option<Agreement>, RepositoryError> {
        let query = format!("SELECT {AGREEMENT_COLUMNS} FROM agreements WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(parse_agreement_row).transpose()
    }

    async fn find_active_by_unit(&self, unit_id: UnitId) -> Result<Option<Agreement>, RepositoryError> {
        let query = format!(
            "SELECT {AGREEMENT_COLUMNS} FROM agreements WHERE unit_id = $1 AND status = 'active'"
        );
        let row = sqlx::query(&query)
            .bind(unit_id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(parse_agreement_row).transpose()
    }

    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Agreement>, RepositoryError> {
        let query = format!(
            "SELECT {AGREEMENT_COLUMNS} FROM agreements WHERE customer_id = $1 ORDER BY created_at ASC"
        );
        let rows = sqlx::query(&query)
            .bind(customer_id.0)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(parse_agreement_row).collect()
    }

    async fn close(&self, id: AgreementId, outcome: AgreementStatus) -> Result<Agreement, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {AGREEMENT_COLUMNS} FROM agreements WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&query)
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::not_found("agreement", id))?;
        let mut agreement = parse_agreement_row(&row)?;
        agreement.close(outcome)?;

        let lock_query = format!("SELECT {UNIT_COLUMNS} FROM units WHERE id = $1 FOR UPDATE");
        let unit_row = sqlx::query(&lock_query)
            .bind(agreement.unit_id.0)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::not_found("unit", agreement.unit_id))?;
        let mut unit = parse_unit_row(&unit_row)?;
        unit.transition_to(UnitStatus::Available)?;

        sqlx::query("UPDATE agreements SET status = $2, closed_at = $3 WHERE id = $1")
            .bind(agreement.id.0)
            .bind(agreement.status.as_str())
            .bind(agreement.closed_at.unwrap_or_else(Utc::now))
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE units SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(unit.id.0)
            .bind(unit.status.as_str())
            .bind(unit.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Agreement {} {}; unit {} released", agreement.id, agreement.status, unit.id);
        Ok(agreement)
    }
}

fn parse_agreement_row(row: &PgRow) -> Result<Agreement, RepositoryError> {
    let status: String = row.try_get("status")?;
    Ok(Agreement {
        id: AgreementId(row.try_get("id")?),
        customer_id: CustomerId(row.try_get("customer_id")?),
        unit_id: UnitId(row.try_get("unit_id")?),
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
        closed_at: row.try_get("closed_at")?,
    })
}
