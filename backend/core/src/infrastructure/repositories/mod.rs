// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository traits defined in
//! `crate::domain::repository`.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve domain aggregates
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresCustomerRepository** - Customer records
//! - **PostgresFacilityRepository** - Facilities and their JSONB configuration
//! - **PostgresUnitRepository** - Units and operational status changes
//! - **PostgresAgreementRepository** - Agreements; owns the transactional
//!   unit status changes that accompany them
//!
//! ## In-Memory Store
//!
//! **InMemoryStore** implements all four traits over one set of tables
//! guarded by a single lock, so cross-aggregate writes are atomic the same
//! way a database transaction makes them.
//!
//! # Usage
//!
//! ```ignore
//! use storex_core::infrastructure::db::Database;
//! use storex_core::infrastructure::repositories::postgres_customer::PostgresCustomerRepository;
//!
//! let db = Database::new(&database_url, 5).await?;
//! let customers = PostgresCustomerRepository::new(db.get_pool().clone());
//! let customer = customers.create(NewCustomer::named("Acme Storage Test")).await?;
//! ```

pub mod postgres_agreement;
pub mod postgres_customer;
pub mod postgres_facility;
pub mod postgres_unit;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::agreement::{Agreement, AgreementId, AgreementStatus, NewAgreement};
use crate::domain::customer::{Customer, CustomerId, NewCustomer, VerificationStatus};
use crate::domain::facility::{Facility, FacilityId, NewFacility};
use crate::domain::repository::{
    AgreementRepository, CustomerRepository, FacilityRepository, RepositoryError, UnitRepository,
};
use crate::domain::unit::{NewUnit, Unit, UnitId, UnitStatus};

/// Refuse operational transitions that would enter or leave `occupied`.
///
/// Shared by every `UnitRepository` implementation.
pub(crate) fn check_operational_transition(unit: &Unit, to: UnitStatus) -> Result<(), RepositoryError> {
    if unit.status == UnitStatus::Occupied {
        return Err(RepositoryError::Conflict(format!(
            "unit {} is occupied; close its agreement to release it",
            unit.id
        )));
    }
    if to == UnitStatus::Occupied {
        return Err(RepositoryError::Conflict(format!(
            "unit {} can only become occupied through an agreement",
            unit.id
        )));
    }
    Ok(())
}

#[derive(Default)]
struct Tables {
    customers: HashMap<CustomerId, Customer>,
    facilities: HashMap<FacilityId, Facility>,
    units: HashMap<UnitId, Unit>,
    agreements: HashMap<AgreementId, Agreement>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryStore {
    async fn create(&self, input: NewCustomer) -> Result<Customer, RepositoryError> {
        let customer = Customer::new(input)?;
        self.tables.write().customers.insert(customer.id, customer.clone());
        debug!("Created customer {} ({})", customer.id, customer.name);
        Ok(customer)
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.tables.read().customers.get(&id).cloned())
    }

    async fn update_verification_status(
        &self,
        id: CustomerId,
        status: VerificationStatus,
    ) -> Result<Customer, RepositoryError> {
        let mut tables = self.tables.write();
        let customer = tables
            .customers
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("customer", id))?;
        customer.verification_status = status;
        Ok(customer.clone())
    }
}

#[async_trait]
impl FacilityRepository for InMemoryStore {
    async fn create(&self, input: NewFacility) -> Result<Facility, RepositoryError> {
        let facility = Facility::new(input)?;
        self.tables.write().facilities.insert(facility.id, facility.clone());
        debug!("Created facility {} ({})", facility.id, facility.name);
        Ok(facility)
    }

    async fn find_by_id(&self, id: FacilityId) -> Result<Option<Facility>, RepositoryError> {
        Ok(self.tables.read().facilities.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Facility>, RepositoryError> {
        let mut facilities: Vec<Facility> = self.tables.read().facilities.values().cloned().collect();
        facilities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(facilities)
    }
}

#[async_trait]
impl UnitRepository for InMemoryStore {
    async fn create(&self, input: NewUnit) -> Result<Unit, RepositoryError> {
        let unit = Unit::new(input)?;
        let mut tables = self.tables.write();
        if !tables.facilities.contains_key(&unit.facility_id) {
            return Err(RepositoryError::not_found("facility", unit.facility_id));
        }
        tables.units.insert(unit.id, unit.clone());
        debug!("Created unit {} in facility {}", unit.id, unit.facility_id);
        Ok(unit)
    }

    async fn find_by_id(&self, id: UnitId) -> Result<Option<Unit>, RepositoryError> {
        Ok(self.tables.read().units.get(&id).cloned())
    }

    async fn find_by_facility(&self, facility_id: FacilityId) -> Result<Vec<Unit>, RepositoryError> {
        let mut units: Vec<Unit> = self
            .tables
            .read()
            .units
            .values()
            .filter(|u| u.facility_id == facility_id)
            .cloned()
            .collect();
        units.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(units)
    }

    async fn transition_status(&self, id: UnitId, to: UnitStatus) -> Result<Unit, RepositoryError> {
        let mut tables = self.tables.write();
        let unit = tables
            .units
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("unit", id))?;
        check_operational_transition(unit, to)?;
        unit.transition_to(to)?;
        info!("Unit {} is now {}", id, to);
        Ok(unit.clone())
    }
}

#[async_trait]
impl AgreementRepository for InMemoryStore {
    async fn create(&self, input: NewAgreement) -> Result<Agreement, RepositoryError> {
        let agreement = Agreement::new(input)?;

        // Check-and-set under one write lock
        let mut tables = self.tables.write();
        if !tables.customers.contains_key(&agreement.customer_id) {
            return Err(RepositoryError::not_found("customer", agreement.customer_id));
        }
        let unit = tables
            .units
            .get_mut(&agreement.unit_id)
            .ok_or_else(|| RepositoryError::not_found("unit", agreement.unit_id))?;
        if !unit.is_available() {
            return Err(RepositoryError::Conflict(format!(
                "unit {} is {}, not available",
                unit.id, unit.status
            )));
        }
        unit.transition_to(UnitStatus::Occupied)?;
        tables.agreements.insert(agreement.id, agreement.clone());

        info!(
            "Agreement {} created: customer {} now occupies unit {}",
            agreement.id, agreement.customer_id, agreement.unit_id
        );
        Ok(agreement)
    }

    async fn find_by_id(&self, id: AgreementId) -> Result<Option<Agreement>, RepositoryError> {
        Ok(self.tables.read().agreements.get(&id).cloned())
    }

    async fn find_active_by_unit(&self, unit_id: UnitId) -> Result<Option<Agreement>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .agreements
            .values()
            .find(|a| a.unit_id == unit_id && a.is_active())
            .cloned())
    }

    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Agreement>, RepositoryError> {
        let mut agreements: Vec<Agreement> = self
            .tables
            .read()
            .agreements
            .values()
            .filter(|a| a.customer_id == customer_id)
            .cloned()
            .collect();
        agreements.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(agreements)
    }

    async fn close(&self, id: AgreementId, outcome: AgreementStatus) -> Result<Agreement, RepositoryError> {
        let mut tables = self.tables.write();
        let Tables { agreements, units, .. } = &mut *tables;

        let agreement = agreements
            .get(&id)
            .ok_or_else(|| RepositoryError::not_found("agreement", id))?;
        let unit = units
            .get(&agreement.unit_id)
            .ok_or_else(|| RepositoryError::not_found("unit", agreement.unit_id))?;

        // Validate both sides before mutating either
        let mut closed = agreement.clone();
        closed.close(outcome)?;
        let mut released = unit.clone();
        released.transition_to(UnitStatus::Available)?;

        units.insert(released.id, released);
        agreements.insert(closed.id, closed.clone());

        info!("Agreement {} {}; unit {} released", closed.id, closed.status, closed.unit_id);
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::ErrorKind;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    async fn seeded_unit(store: &InMemoryStore) -> (Customer, Unit) {
        let customer = CustomerRepository::create(store, NewCustomer::named("Acme Storage Test"))
            .await
            .unwrap();
        let facility = FacilityRepository::create(store, NewFacility::named("Main Facility"))
            .await
            .unwrap();
        let unit = UnitRepository::create(
            store,
            NewUnit::in_facility(facility.id)
                .with_type("Small Locker")
                .with_price(BigDecimal::from_str("120.00").unwrap()),
        )
        .await
        .unwrap();
        (customer, unit)
    }

    #[tokio::test]
    async fn test_create_and_find_customer() {
        let store = InMemoryStore::new();
        let created = CustomerRepository::create(&store, NewCustomer::named("Acme Storage Test"))
            .await
            .unwrap();
        let found = CustomerRepository::find_by_id(&store, created.id).await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_update_verification_status() {
        let store = InMemoryStore::new();
        let customer = CustomerRepository::create(&store, NewCustomer::named("Jo")).await.unwrap();
        let updated = store
            .update_verification_status(customer.id, VerificationStatus::Verified)
            .await
            .unwrap();
        assert_eq!(updated.verification_status, VerificationStatus::Verified);

        let missing = store
            .update_verification_status(CustomerId::new(), VerificationStatus::Pending)
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_facilities_sorted_by_name() {
        let store = InMemoryStore::new();
        FacilityRepository::create(&store, NewFacility::named("South")).await.unwrap();
        FacilityRepository::create(&store, NewFacility::named("North")).await.unwrap();
        let names: Vec<String> = store.list_all().await.unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["North", "South"]);
    }

    #[tokio::test]
    async fn test_unit_requires_existing_facility() {
        let store = InMemoryStore::new();
        let err = UnitRepository::create(&store, NewUnit::in_facility(FacilityId::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(store.tables.read().units.is_empty());
    }

    #[tokio::test]
    async fn test_find_units_by_facility() {
        let store = InMemoryStore::new();
        let (_, unit) = seeded_unit(&store).await;
        let other = FacilityRepository::create(&store, NewFacility::named("Other")).await.unwrap();
        UnitRepository::create(&store, NewUnit::in_facility(other.id)).await.unwrap();

        let units = store.find_by_facility(unit.facility_id).await.unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].id, unit.id);
    }

    #[tokio::test]
    async fn test_agreement_occupies_unit() {
        let store = InMemoryStore::new();
        let (customer, unit) = seeded_unit(&store).await;

        let agreement = AgreementRepository::create(&store, NewAgreement::new(customer.id, unit.id, today()))
            .await
            .unwrap();
        assert_eq!(agreement.status, AgreementStatus::Active);

        let unit = UnitRepository::find_by_id(&store, unit.id).await.unwrap().unwrap();
        assert_eq!(unit.status, UnitStatus::Occupied);
        assert_eq!(
            store.find_active_by_unit(unit.id).await.unwrap().map(|a| a.id),
            Some(agreement.id)
        );
    }

    #[tokio::test]
    async fn test_agreement_unknown_references() {
        let store = InMemoryStore::new();
        let (customer, unit) = seeded_unit(&store).await;

        let err = AgreementRepository::create(&store, NewAgreement::new(CustomerId::new(), unit.id, today()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { entity: "customer", .. }));

        let err = AgreementRepository::create(&store, NewAgreement::new(customer.id, UnitId::new(), today()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { entity: "unit", .. }));

        // Nothing leaked into the unit
        let unit = UnitRepository::find_by_id(&store, unit.id).await.unwrap().unwrap();
        assert_eq!(unit.status, UnitStatus::Available);
    }

    #[tokio::test]
    async fn test_agreement_replay_conflicts() {
        let store = InMemoryStore::new();
        let (customer, unit) = seeded_unit(&store).await;
        let request = NewAgreement::new(customer.id, unit.id, today());

        AgreementRepository::create(&store, request.clone()).await.unwrap();
        for _ in 0..3 {
            let err = AgreementRepository::create(&store, request.clone()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Conflict);
        }
        assert_eq!(store.find_by_customer(customer.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_agreement_on_maintenance_unit_conflicts() {
        let store = InMemoryStore::new();
        let (customer, unit) = seeded_unit(&store).await;
        store.transition_status(unit.id, UnitStatus::Maintenance).await.unwrap();

        let err = AgreementRepository::create(&store, NewAgreement::new(customer.id, unit.id, today()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_operational_transitions_cannot_touch_occupied() {
        let store = InMemoryStore::new();
        let (customer, unit) = seeded_unit(&store).await;

        let err = store.transition_status(unit.id, UnitStatus::Occupied).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        AgreementRepository::create(&store, NewAgreement::new(customer.id, unit.id, today()))
            .await
            .unwrap();
        let err = store.transition_status(unit.id, UnitStatus::Available).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_close_agreement_releases_unit() {
        let store = InMemoryStore::new();
        let (customer, unit) = seeded_unit(&store).await;
        let agreement = AgreementRepository::create(&store, NewAgreement::new(customer.id, unit.id, today()))
            .await
            .unwrap();

        let closed = store.close(agreement.id, AgreementStatus::Completed).await.unwrap();
        assert_eq!(closed.status, AgreementStatus::Completed);
        assert!(store.find_active_by_unit(unit.id).await.unwrap().is_none());

        let unit_after = UnitRepository::find_by_id(&store, unit.id).await.unwrap().unwrap();
        assert_eq!(unit_after.status, UnitStatus::Available);

        let err = store.close(agreement.id, AgreementStatus::Cancelled).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        // The unit can be leased again
        AgreementRepository::create(&store, NewAgreement::new(customer.id, unit.id, today()))
            .await
            .unwrap();
    }
}
