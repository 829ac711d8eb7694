// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod agreement_lifecycle;
pub mod provisioning;
pub mod repository_factory;

// Re-export use cases for convenience
pub use agreement_lifecycle::{AgreementLifecycleUseCase, StandardAgreementLifecycleUseCase, UnitOverview};
pub use provisioning::{
    CompletedSteps, LeaseTerms, ProvisioningError, ProvisioningOutcome, ProvisioningRequest, ProvisioningState,
    ProvisioningStep, ProvisioningWorkflow, UnitRequest,
};
pub use repository_factory::{create_repositories, Repositories};
