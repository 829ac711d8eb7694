// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for each aggregate root: one repository per
//! aggregate, interface defined in the domain layer, implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `CustomerRepository` | `Customer` | `InMemoryStore`, `PostgresCustomerRepository` |
//! | `FacilityRepository` | `Facility` | `InMemoryStore`, `PostgresFacilityRepository` |
//! | `UnitRepository` | `Unit` | `InMemoryStore`, `PostgresUnitRepository` |
//! | `AgreementRepository` | `Agreement` | `InMemoryStore`, `PostgresAgreementRepository` |
//!
//! ## Cross-aggregate writes
//!
//! `AgreementRepository::create` and `AgreementRepository::close` are the
//! only operations that touch two aggregates. Both must apply the agreement
//! change and the unit status change as one atomic unit: either both are
//! visible or neither is.
//!
//! ## Storage Backend Abstraction
//!
//! Concrete implementations are selected at startup from `StorageBackend`
//! (see `crate::application::repository_factory`). In-memory storage is used
//! for development and testing; PostgreSQL for production.

use async_trait::async_trait;

use crate::domain::agreement::{Agreement, AgreementId, AgreementStatus, NewAgreement};
use crate::domain::customer::{Customer, CustomerId, NewCustomer, VerificationStatus};
use crate::domain::facility::{Facility, FacilityId, NewFacility};
use crate::domain::unit::{NewUnit, Unit, UnitId, UnitStatus};
use crate::domain::validation::ValidationError;

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Validate and persist a new customer
    async fn create(&self, input: NewCustomer) -> Result<Customer, RepositoryError>;

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    /// Record the outcome of an external verification step
    async fn update_verification_status(
        &self,
        id: CustomerId,
        status: VerificationStatus,
    ) -> Result<Customer, RepositoryError>;
}

#[async_trait]
pub trait FacilityRepository: Send + Sync {
    async fn create(&self, input: NewFacility) -> Result<Facility, RepositoryError>;

    async fn find_by_id(&self, id: FacilityId) -> Result<Option<Facility>, RepositoryError>;

    /// List all facilities ordered by name
    async fn list_all(&self) -> Result<Vec<Facility>, RepositoryError>;
}

#[async_trait]
pub trait UnitRepository: Send + Sync {
    /// Create a unit under an existing facility.
    ///
    /// Fails with `NotFound` when the facility does not exist.
    async fn create(&self, input: NewUnit) -> Result<Unit, RepositoryError>;

    async fn find_by_id(&self, id: UnitId) -> Result<Option<Unit>, RepositoryError>;

    async fn find_by_facility(&self, facility_id: FacilityId) -> Result<Vec<Unit>, RepositoryError>;

    /// Operational status change (reserve, maintenance, release a hold).
    ///
    /// Entering or leaving `occupied` is refused with `Conflict`; those
    /// transitions belong to `AgreementRepository`.
    async fn transition_status(&self, id: UnitId, to: UnitStatus) -> Result<Unit, RepositoryError>;
}

#[async_trait]
pub trait AgreementRepository: Send + Sync {
    /// Lease an available unit to a customer.
    ///
    /// Atomically inserts the agreement and marks the unit `occupied`.
    /// Fails with `NotFound` for an unknown customer or unit and with
    /// `Conflict` when the unit is not `available`.
    async fn create(&self, input: NewAgreement) -> Result<Agreement, RepositoryError>;

    async fn find_by_id(&self, id: AgreementId) -> Result<Option<Agreement>, RepositoryError>;

    async fn find_active_by_unit(&self, unit_id: UnitId) -> Result<Option<Agreement>, RepositoryError>;

    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Agreement>, RepositoryError>;

    /// Complete or cancel an active agreement, atomically returning its
    /// unit to `available`.
    async fn close(&self, id: AgreementId, outcome: AgreementStatus) -> Result<Agreement, RepositoryError>;
}

/// Coarse error classification reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Store,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validation => "ValidationError",
            Self::NotFound => "NotFoundError",
            Self::Conflict => "ConflictError",
            Self::Store => "StoreError",
        };
        f.write_str(name)
    }
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Store(_) | Self::Serialization(_) => ErrorKind::Store,
        }
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound {
                entity: "row",
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => RepositoryError::NotFound {
                entity: "referenced record",
                id: db_err.constraint().unwrap_or("unknown").to_string(),
            },
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => RepositoryError::Validation(
                ValidationError::ConstraintViolation(db_err.message().to_string()),
            ),
            _ => RepositoryError::Store(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let validation: RepositoryError = ValidationError::EmptyField {
            entity: "customer",
            field: "name",
        }
        .into();
        assert_eq!(validation.kind(), ErrorKind::Validation);
        assert_eq!(RepositoryError::not_found("unit", UnitId::new()).kind(), ErrorKind::NotFound);
        assert_eq!(RepositoryError::Conflict("taken".into()).kind(), ErrorKind::Conflict);
        assert_eq!(RepositoryError::Serialization("bad".into()).kind(), ErrorKind::Store);
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_not_found() {
        let err: RepositoryError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_sqlx_pool_errors_map_to_store() {
        let err: RepositoryError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.kind(), ErrorKind::Store);
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::Conflict.to_string(), "ConflictError");
        assert_eq!(ErrorKind::Store.to_string(), "StoreError");
    }
}
