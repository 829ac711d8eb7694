// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository implementations based on storage backend
//! configuration, keeping the domain layer free of infrastructure types.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Wire `StorageBackend` to repository trait objects

use std::sync::Arc;

use crate::domain::repository::{
    AgreementRepository, CustomerRepository, FacilityRepository, StorageBackend, UnitRepository,
};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::postgres_agreement::PostgresAgreementRepository;
use crate::infrastructure::repositories::postgres_customer::PostgresCustomerRepository;
use crate::infrastructure::repositories::postgres_facility::PostgresFacilityRepository;
use crate::infrastructure::repositories::postgres_unit::PostgresUnitRepository;
use crate::infrastructure::repositories::InMemoryStore;

/// One handle per aggregate repository, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub customers: Arc<dyn CustomerRepository>,
    pub facilities: Arc<dyn FacilityRepository>,
    pub units: Arc<dyn UnitRepository>,
    pub agreements: Arc<dyn AgreementRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self::from_store(InMemoryStore::new())
    }

    /// Share one in-memory store across all four repositories
    pub fn from_store(store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            customers: store.clone(),
            facilities: store.clone(),
            units: store.clone(),
            agreements: store,
        }
    }

    pub fn postgres(database: &Database) -> Self {
        let pool = database.get_pool();
        Self {
            customers: Arc::new(PostgresCustomerRepository::new(pool.clone())),
            facilities: Arc::new(PostgresFacilityRepository::new(pool.clone())),
            units: Arc::new(PostgresUnitRepository::new(pool.clone())),
            agreements: Arc::new(PostgresAgreementRepository::new(pool.clone())),
        }
    }
}

/// Creates the repository set for the configured backend.
///
/// A PostgreSQL backend needs an open `Database`; the in-memory backend
/// ignores it.
pub fn create_repositories(
    backend: &StorageBackend,
    database: Option<&Database>,
) -> anyhow::Result<Repositories> {
    match backend {
        StorageBackend::InMemory => Ok(Repositories::in_memory()),
        StorageBackend::PostgreSQL(_) => {
            let database = database
                .ok_or_else(|| anyhow::anyhow!("PostgreSQL backend selected but no database connection was opened"))?;
            Ok(Repositories::postgres(database))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::NewCustomer;
    use crate::domain::repository::PostgresConfig;

    #[test]
    fn test_postgres_backend_requires_database() {
        let backend = StorageBackend::PostgreSQL(PostgresConfig {
            connection_string: "postgres://localhost/storex".to_string(),
            max_connections: 1,
        });
        assert!(create_repositories(&backend, None).is_err());
    }

    #[tokio::test]
    async fn test_in_memory_repositories_share_one_store() {
        let repos = create_repositories(&StorageBackend::InMemory, None).unwrap();
        let customer = repos.customers.create(NewCustomer::named("Shared")).await.unwrap();

        let clone = repos.clone();
        assert!(clone.customers.find_by_id(customer.id).await.unwrap().is_some());
    }
}
