// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provisioning Workflow
//!
//! Application service that takes a prospective renter from nothing to an
//! active rental agreement: customer, facility, unit, agreement, in that
//! order.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Sequence the four dependent creation steps and
//!   report partial failure
//! - **Collaborators:**
//!   - Domain: Customer, Facility, Unit, Agreement aggregates
//!   - Infrastructure: CustomerRepository, FacilityRepository, UnitRepository, AgreementRepository
//!
//! # State Machine
//!
//! ```text
//! Init → CustomerCreated → FacilityCreated → UnitCreated → AgreementCreated
//!   └──────────────┴───────────────┴──────────────┴──→ Failed(step, cause)
//! ```
//!
//! Each step runs only after the previous one returned successfully. There
//! is no retry and no compensation: a failure at step *k* leaves the records
//! of steps before *k* in place, and their ids are reported in
//! [`ProvisioningError::completed`] for manual cleanup.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::agreement::{Agreement, NewAgreement};
use crate::domain::customer::{Customer, CustomerId, NewCustomer};
use crate::domain::facility::{Facility, FacilityId, NewFacility};
use crate::domain::repository::{
    AgreementRepository, CustomerRepository, ErrorKind, FacilityRepository, RepositoryError, UnitRepository,
};
use crate::domain::unit::{NewUnit, Unit, UnitId, UnitStatus};

use super::repository_factory::Repositories;

/// Unit attributes for the unit step. The facility id is filled in from the
/// facility step.
#[derive(Debug, Clone, Default)]
pub struct UnitRequest {
    pub unit_type: Option<String>,
    pub size: Option<String>,
    pub price: Option<BigDecimal>,
}

impl UnitRequest {
    fn into_new_unit(self, facility_id: FacilityId) -> NewUnit {
        let mut unit = NewUnit::in_facility(facility_id);
        unit.unit_type = self.unit_type;
        unit.size = self.size;
        unit.price = self.price;
        unit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseTerms {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Everything the four steps need.
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    pub customer: NewCustomer,
    pub facility: NewFacility,
    pub unit: UnitRequest,
    pub lease: LeaseTerms,
}

/// Records produced by a successful run.
#[derive(Debug, Clone)]
pub struct ProvisioningOutcome {
    pub customer: Customer,
    pub facility: Facility,
    pub unit: Unit,
    pub agreement: Agreement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStep {
    CreateCustomer,
    CreateFacility,
    CreateUnit,
    CreateAgreement,
}

impl std::fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CreateCustomer => "CreateCustomer",
            Self::CreateFacility => "CreateFacility",
            Self::CreateUnit => "CreateUnit",
            Self::CreateAgreement => "CreateAgreement",
        };
        f.write_str(name)
    }
}

/// Ids of the records created before a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedSteps {
    pub customer_id: Option<CustomerId>,
    pub facility_id: Option<FacilityId>,
    pub unit_id: Option<UnitId>,
}

impl CompletedSteps {
    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none() && self.facility_id.is_none() && self.unit_id.is_none()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("provisioning failed at step {step} ({}): {source}", .source.kind())]
pub struct ProvisioningError {
    pub step: ProvisioningStep,
    pub source: RepositoryError,
    pub completed: CompletedSteps,
}

impl ProvisioningError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

/// Workflow position. Terminal states are `AgreementCreated` and `Failed`.
#[derive(Debug)]
pub enum ProvisioningState {
    Init,
    CustomerCreated {
        customer: Customer,
    },
    FacilityCreated {
        customer: Customer,
        facility: Facility,
    },
    UnitCreated {
        customer: Customer,
        facility: Facility,
        unit: Unit,
    },
    AgreementCreated(ProvisioningOutcome),
    Failed(ProvisioningError),
}

impl ProvisioningState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AgreementCreated(_) | Self::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::CustomerCreated { .. } => "CustomerCreated",
            Self::FacilityCreated { .. } => "FacilityCreated",
            Self::UnitCreated { .. } => "UnitCreated",
            Self::AgreementCreated(_) => "AgreementCreated",
            Self::Failed(_) => "Failed",
        }
    }
}

pub struct ProvisioningWorkflow {
    customers: Arc<dyn CustomerRepository>,
    facilities: Arc<dyn FacilityRepository>,
    units: Arc<dyn UnitRepository>,
    agreements: Arc<dyn AgreementRepository>,
    step_deadline: Option<Duration>,
}

impl ProvisioningWorkflow {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        facilities: Arc<dyn FacilityRepository>,
        units: Arc<dyn UnitRepository>,
        agreements: Arc<dyn AgreementRepository>,
    ) -> Self {
        Self {
            customers,
            facilities,
            units,
            agreements,
            step_deadline: None,
        }
    }

    pub fn from_repositories(repos: &Repositories) -> Self {
        Self::new(
            repos.customers.clone(),
            repos.facilities.clone(),
            repos.units.clone(),
            repos.agreements.clone(),
        )
    }

    /// Bound every repository call; a step that overruns fails with
    /// `Store("deadline exceeded")`.
    ///
    /// Dropping a PostgreSQL transaction before `COMMIT` is sent rolls it
    /// back, but a deadline that fires while the commit is in flight cannot
    /// recall it. A `CreateAgreement` deadline failure may therefore leave
    /// an active agreement behind; check `find_active_by_unit` for the
    /// reported unit before retrying.
    pub fn with_step_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.step_deadline = deadline;
        self
    }

    /// Drive the state machine from `Init` to a terminal state.
    pub async fn run(&self, request: ProvisioningRequest) -> Result<ProvisioningOutcome, ProvisioningError> {
        info!(
            "Provisioning customer '{}' at facility '{}'",
            request.customer.name, request.facility.name
        );

        let mut state = ProvisioningState::Init;
        loop {
            state = match state {
                ProvisioningState::AgreementCreated(outcome) => {
                    info!(
                        "Provisioning complete: agreement {} leases unit {} to customer {}",
                        outcome.agreement.id, outcome.unit.id, outcome.customer.id
                    );
                    return Ok(outcome);
                }
                ProvisioningState::Failed(err) => {
                    warn!("{} (completed: {:?})", err, err.completed);
                    return Err(err);
                }
                pending => {
                    let from = pending.name();
                    let next = self.advance(pending, &request).await;
                    debug!("Provisioning state {} -> {}", from, next.name());
                    next
                }
            };
        }
    }

    /// Execute the single step that follows `state`. Terminal states are
    /// returned unchanged.
    pub async fn advance(&self, state: ProvisioningState, request: &ProvisioningRequest) -> ProvisioningState {
        match state {
            ProvisioningState::Init => {
                match self.guarded(self.customers.create(request.customer.clone())).await {
                    Ok(customer) => ProvisioningState::CustomerCreated { customer },
                    Err(source) => failed(ProvisioningStep::CreateCustomer, source, CompletedSteps::default()),
                }
            }
            ProvisioningState::CustomerCreated { customer } => {
                match self.guarded(self.facilities.create(request.facility.clone())).await {
                    Ok(facility) => ProvisioningState::FacilityCreated { customer, facility },
                    Err(source) => failed(
                        ProvisioningStep::CreateFacility,
                        source,
                        CompletedSteps {
                            customer_id: Some(customer.id),
                            ..Default::default()
                        },
                    ),
                }
            }
            ProvisioningState::FacilityCreated { customer, facility } => {
                let new_unit = request.unit.clone().into_new_unit(facility.id);
                match self.guarded(self.units.create(new_unit)).await {
                    Ok(unit) => ProvisioningState::UnitCreated { customer, facility, unit },
                    Err(source) => failed(
                        ProvisioningStep::CreateUnit,
                        source,
                        CompletedSteps {
                            customer_id: Some(customer.id),
                            facility_id: Some(facility.id),
                            unit_id: None,
                        },
                    ),
                }
            }
            ProvisioningState::UnitCreated { customer, facility, unit } => {
                let mut new_agreement = NewAgreement::new(customer.id, unit.id, request.lease.start_date);
                new_agreement.end_date = request.lease.end_date;

                let completed = CompletedSteps {
                    customer_id: Some(customer.id),
                    facility_id: Some(facility.id),
                    unit_id: Some(unit.id),
                };
                let agreement = match self.guarded(self.agreements.create(new_agreement)).await {
                    Ok(agreement) => agreement,
                    Err(source) => return failed(ProvisioningStep::CreateAgreement, source, completed),
                };

                // Committed together with the agreement; no re-read
                let mut unit = unit;
                unit.status = UnitStatus::Occupied;
                unit.updated_at = agreement.created_at;

                ProvisioningState::AgreementCreated(ProvisioningOutcome {
                    customer,
                    facility,
                    unit,
                    agreement,
                })
            }
            terminal @ (ProvisioningState::AgreementCreated(_) | ProvisioningState::Failed(_)) => terminal,
        }
    }

    async fn guarded<T, F>(&self, operation: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        match self.step_deadline {
            Some(deadline) => tokio::time::timeout(deadline, operation)
                .await
                .map_err(|_| RepositoryError::Store("deadline exceeded".to_string()))?,
            None => operation.await,
        }
    }
}

fn failed(step: ProvisioningStep, source: RepositoryError, completed: CompletedSteps) -> ProvisioningState {
    ProvisioningState::Failed(ProvisioningError {
        step,
        source,
        completed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::facility::FacilityConfig;
    use crate::domain::validation::ValidationError;
    use crate::infrastructure::repositories::InMemoryStore;
    use async_trait::async_trait;
    use chrono::{Months, Utc};
    use std::str::FromStr;

    fn acme_request() -> ProvisioningRequest {
        let today = Utc::now().date_naive();
        ProvisioningRequest {
            customer: NewCustomer::named("Acme Storage Test"),
            facility: NewFacility::named("Main Facility")
                .with_region("VIC")
                .with_config(FacilityConfig::new().with_allow_24hr(true)),
            unit: UnitRequest {
                unit_type: Some("Small Locker".to_string()),
                size: Some("2x2".to_string()),
                price: Some(BigDecimal::from_str("120.00").unwrap()),
            },
            lease: LeaseTerms {
                start_date: today,
                end_date: today.checked_add_months(Months::new(1)),
            },
        }
    }

    fn workflow() -> ProvisioningWorkflow {
        ProvisioningWorkflow::from_repositories(&Repositories::in_memory())
    }

    #[tokio::test]
    async fn test_provisioning_happy_path() {
        let outcome = workflow().run(acme_request()).await.unwrap();

        assert_eq!(outcome.customer.name, "Acme Storage Test");
        assert_eq!(outcome.facility.region.as_deref(), Some("VIC"));
        assert!(outcome.facility.config.allows_24hr());
        assert_eq!(outcome.unit.facility_id, outcome.facility.id);
        assert_eq!(outcome.unit.status, UnitStatus::Occupied);
        assert!(outcome.agreement.is_active());
        assert_eq!(outcome.agreement.unit_id, outcome.unit.id);
        assert_eq!(outcome.agreement.customer_id, outcome.customer.id);
    }

    #[tokio::test]
    async fn test_advance_walks_every_state() {
        let wf = workflow();
        let request = acme_request();

        let mut state = ProvisioningState::Init;
        let mut seen = vec![state.name()];
        while !state.is_terminal() {
            state = wf.advance(state, &request).await;
            seen.push(state.name());
        }

        assert_eq!(
            seen,
            vec!["Init", "CustomerCreated", "FacilityCreated", "UnitCreated", "AgreementCreated"]
        );
    }

    #[tokio::test]
    async fn test_customer_failure_reports_nothing_completed() {
        let mut request = acme_request();
        request.customer = NewCustomer::named("  ");

        let err = workflow().run(request).await.unwrap_err();
        assert_eq!(err.step, ProvisioningStep::CreateCustomer);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.completed.is_empty());
    }

    #[tokio::test]
    async fn test_facility_failure_reports_customer() {
        let mut request = acme_request();
        request.facility = NewFacility::named("");

        let err = workflow().run(request).await.unwrap_err();
        assert_eq!(err.step, ProvisioningStep::CreateFacility);
        assert!(err.completed.customer_id.is_some());
        assert!(err.completed.facility_id.is_none());
    }

    #[tokio::test]
    async fn test_unit_failure_reports_customer_and_facility() {
        let mut request = acme_request();
        request.unit.price = Some(BigDecimal::from_str("-5.00").unwrap());

        let repos = Repositories::in_memory();
        let err = ProvisioningWorkflow::from_repositories(&repos)
            .run(request)
            .await
            .unwrap_err();

        assert_eq!(err.step, ProvisioningStep::CreateUnit);
        assert!(matches!(
            err.source,
            RepositoryError::Validation(ValidationError::InvalidPrice(_))
        ));

        // Completed steps stay in place
        let facility_id = err.completed.facility_id.unwrap();
        assert!(repos.facilities.find_by_id(facility_id).await.unwrap().is_some());
        let customer_id = err.completed.customer_id.unwrap();
        assert!(repos.customers.find_by_id(customer_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_agreement_failure_leaves_unit_available() {
        let mut request = acme_request();
        let start = request.lease.start_date;
        request.lease.end_date = start.pred_opt();

        let repos = Repositories::in_memory();
        let err = ProvisioningWorkflow::from_repositories(&repos)
            .run(request)
            .await
            .unwrap_err();

        assert_eq!(err.step, ProvisioningStep::CreateAgreement);
        assert_eq!(err.kind(), ErrorKind::Validation);

        let unit_id = err.completed.unit_id.unwrap();
        let unit = repos.units.find_by_id(unit_id).await.unwrap().unwrap();
        assert_eq!(unit.status, UnitStatus::Available);
    }

    /// Unit store whose reads always fail; writes go to the shared store.
    struct UnreadableUnits(Arc<InMemoryStore>);

    #[async_trait]
    impl UnitRepository for UnreadableUnits {
        async fn create(&self, input: NewUnit) -> Result<Unit, RepositoryError> {
            UnitRepository::create(self.0.as_ref(), input).await
        }

        async fn find_by_id(&self, _id: UnitId) -> Result<Option<Unit>, RepositoryError> {
            Err(RepositoryError::Store("connection reset".to_string()))
        }

        async fn find_by_facility(&self, facility_id: FacilityId) -> Result<Vec<Unit>, RepositoryError> {
            UnitRepository::find_by_facility(self.0.as_ref(), facility_id).await
        }

        async fn transition_status(&self, id: UnitId, to: UnitStatus) -> Result<Unit, RepositoryError> {
            UnitRepository::transition_status(self.0.as_ref(), id, to).await
        }
    }

    #[tokio::test]
    async fn test_committed_agreement_is_reported_without_unit_read() {
        let store = Arc::new(InMemoryStore::new());
        let wf = ProvisioningWorkflow::new(
            store.clone(),
            store.clone(),
            Arc::new(UnreadableUnits(store.clone())),
            store.clone(),
        );

        let outcome = wf.run(acme_request()).await.unwrap();
        assert_eq!(outcome.unit.status, UnitStatus::Occupied);

        let active = AgreementRepository::find_active_by_unit(store.as_ref(), outcome.unit.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.id, outcome.agreement.id);
        let stored = UnitRepository::find_by_id(store.as_ref(), outcome.unit.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, outcome.unit.status);
    }

    struct SlowCustomers;

    #[async_trait]
    impl CustomerRepository for SlowCustomers {
        async fn create(&self, input: NewCustomer) -> Result<Customer, RepositoryError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Customer::new(input)?)
        }

        async fn find_by_id(&self, _id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
            Ok(None)
        }

        async fn update_verification_status(
            &self,
            id: CustomerId,
            _status: crate::domain::customer::VerificationStatus,
        ) -> Result<Customer, RepositoryError> {
            Err(RepositoryError::not_found("customer", id))
        }
    }

    #[tokio::test]
    async fn test_step_deadline_exceeded() {
        let store = Arc::new(InMemoryStore::new());
        let wf = ProvisioningWorkflow::new(Arc::new(SlowCustomers), store.clone(), store.clone(), store)
            .with_step_deadline(Some(Duration::from_millis(20)));

        let err = wf.run(acme_request()).await.unwrap_err();
        assert_eq!(err.step, ProvisioningStep::CreateCustomer);
        assert_eq!(err.kind(), ErrorKind::Store);
        assert_eq!(err.source.to_string(), "Store error: deadline exceeded");
    }
}
