// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agreement Lifecycle Use Case
//!
//! Application service for everything that happens to a lease after it is
//! signed: completing or cancelling it, and operational unit status changes
//! (reserve, maintenance) outside of any lease.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Close agreements and maintain unit status
//! - **Collaborators:**
//!   - Domain: Agreement, Unit aggregates
//!   - Infrastructure: AgreementRepository, UnitRepository

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::agreement::{Agreement, AgreementId, AgreementStatus};
use crate::domain::repository::{AgreementRepository, RepositoryError, UnitRepository};
use crate::domain::unit::{Unit, UnitId, UnitStatus};

use super::repository_factory::Repositories;

/// A unit together with the agreement currently occupying it, if any.
#[derive(Debug, Clone)]
pub struct UnitOverview {
    pub unit: Unit,
    pub active_agreement: Option<Agreement>,
}

#[async_trait]
pub trait AgreementLifecycleUseCase: Send + Sync {
    /// Mark an active agreement completed and release its unit.
    ///
    /// # Errors
    ///
    /// - NotFound: no such agreement
    /// - Validation: the agreement is already completed or cancelled
    async fn complete_agreement(&self, id: AgreementId) -> Result<Agreement, RepositoryError>;

    /// Cancel an active agreement and release its unit.
    async fn cancel_agreement(&self, id: AgreementId) -> Result<Agreement, RepositoryError>;

    /// Operational status change on a unit that is not under lease.
    ///
    /// # Errors
    ///
    /// - Conflict: the unit is occupied, or `to` is `occupied`
    /// - Validation: the transition is not allowed from the current status
    async fn set_unit_status(&self, id: UnitId, to: UnitStatus) -> Result<Unit, RepositoryError>;

    async fn unit_overview(&self, id: UnitId) -> Result<UnitOverview, RepositoryError>;
}

pub struct StandardAgreementLifecycleUseCase {
    agreements: Arc<dyn AgreementRepository>,
    units: Arc<dyn UnitRepository>,
}

impl StandardAgreementLifecycleUseCase {
    pub fn new(agreements: Arc<dyn AgreementRepository>, units: Arc<dyn UnitRepository>) -> Self {
        Self { agreements, units }
    }

    pub fn from_repositories(repos: &Repositories) -> Self {
        Self::new(repos.agreements.clone(), repos.units.clone())
    }

    async fn close(&self, id: AgreementId, outcome: AgreementStatus) -> Result<Agreement, RepositoryError> {
        let agreement = self.agreements.close(id, outcome).await?;
        info!(
            "Agreement {} for customer {} is {}",
            agreement.id, agreement.customer_id, agreement.status
        );
        Ok(agreement)
    }
}

#[async_trait]
impl AgreementLifecycleUseCase for StandardAgreementLifecycleUseCase {
    async fn complete_agreement(&self, id: AgreementId) -> Result<Agreement, RepositoryError> {
        self.close(id, AgreementStatus::Completed).await
    }

    async fn cancel_agreement(&self, id: AgreementId) -> Result<Agreement, RepositoryError> {
        self.close(id, AgreementStatus::Cancelled).await
    }

    async fn set_unit_status(&self, id: UnitId, to: UnitStatus) -> Result<Unit, RepositoryError> {
        self.units.transition_status(id, to).await
    }

    async fn unit_overview(&self, id: UnitId) -> Result<UnitOverview, RepositoryError> {
        let unit = self
            .units
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("unit", id))?;
        let active_agreement = self.agreements.find_active_by_unit(id).await?;
        Ok(UnitOverview { unit, active_agreement })
    }
}
