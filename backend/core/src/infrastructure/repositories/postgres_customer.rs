// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Customer
//!
//! PostgreSQL-backed persistence for customer records.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements `CustomerRepository` over the `customers` table

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::info;

use crate::domain::customer::{ContactInfo, Customer, CustomerId, NewCustomer, VerificationStatus};
use crate::domain::repository::{CustomerRepository, RepositoryError};

pub struct PostgresCustomerRepository {
    pool: PgPool,
}

impl PostgresCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn create(&self, input: NewCustomer) -> Result<Customer, RepositoryError> {
        let customer = Customer::new(input)?;

        let row = sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, verification_status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, phone, verification_status, created_at
            "#,
        )
        .bind(customer.id.0)
        .bind(&customer.name)
        .bind(&customer.contact.email)
        .bind(&customer.contact.phone)
        .bind(customer.verification_status.as_str())
        .bind(customer.created_at)
        .fetch_one(&self.pool)
        .await?;

        let stored = parse_customer_row(&row)?;
        info!("Created customer {} ({})", stored.id, stored.name);
        Ok(stored)
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, phone, verification_status, created_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(parse_customer_row).transpose()
    }

    async fn update_verification_status(
        &self,
        id: CustomerId,
        status: VerificationStatus,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query(
            r#"
            UPDATE customers
            SET verification_status = $2
            WHERE id = $1
            RETURNING id, name, email, phone, verification_status, created_at
            "#,
        )
        .bind(id.0)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::not_found("customer", id))?;

        info!("Customer {} verification status is now {}", id, status);
        parse_customer_row(&row)
    }
}

/// Parse a customer from a database row
fn parse_customer_row(row: &PgRow) -> Result<Customer, RepositoryError> {
    let status: String = row.try_get("verification_status")?;
    Ok(Customer {
        id: CustomerId(row.try_get("id")?),
        name: row.try_get("name")?,
        contact: ContactInfo {
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
        },
        verification_status: status.parse()?,
        created_at: row.try_get("created_at")?,
    })
}
