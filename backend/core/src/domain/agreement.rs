// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Rental agreement aggregate
//!
//! Links one customer to one unit for a date range. An agreement starts
//! `active` and ends in exactly one terminal state: `completed` when the
//! lease ran its course, `cancelled` when it was cut short.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Agreement entity and its status lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::customer::CustomerId;
use crate::domain::unit::UnitId;
use crate::domain::validation::ValidationError;

/// Unique identifier for an agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgreementId(pub Uuid);

impl AgreementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AgreementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgreementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

impl AgreementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Active => false,
            Self::Completed | Self::Cancelled => true,
        }
    }
}

impl FromStr for AgreementStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ValidationError::UnknownStatus {
                kind: "agreement",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for AgreementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for `AgreementRepository::create`.
#[derive(Debug, Clone)]
pub struct NewAgreement {
    pub customer_id: CustomerId,
    pub unit_id: UnitId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl NewAgreement {
    pub fn new(customer_id: CustomerId, unit_id: UnitId, start_date: NaiveDate) -> Self {
        Self {
            customer_id,
            unit_id,
            start_date,
            end_date: None,
        }
    }

    pub fn ending(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    pub id: AgreementId,
    pub customer_id: CustomerId,
    pub unit_id: UnitId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: AgreementStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Agreement {
    pub fn new(input: NewAgreement) -> Result<Self, ValidationError> {
        if let Some(end) = input.end_date {
            if input.start_date > end {
                return Err(ValidationError::InvalidDateRange {
                    start: input.start_date.to_string(),
                    end: end.to_string(),
                });
            }
        }

        Ok(Self {
            id: AgreementId::new(),
            customer_id: input.customer_id,
            unit_id: input.unit_id,
            start_date: input.start_date,
            end_date: input.end_date,
            status: AgreementStatus::Active,
            created_at: Utc::now(),
            closed_at: None,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == AgreementStatus::Active
    }

    /// Close the agreement as `completed` or `cancelled`.
    pub fn close(&mut self, outcome: AgreementStatus) -> Result<(), ValidationError> {
        let allowed = match (self.status, outcome) {
            (AgreementStatus::Active, AgreementStatus::Completed)
            | (AgreementStatus::Active, AgreementStatus::Cancelled) => true,
            (AgreementStatus::Active, AgreementStatus::Active)
            | (AgreementStatus::Completed, _)
            | (AgreementStatus::Cancelled, _) => false,
        };
        if !allowed {
            return Err(ValidationError::InvalidTransition {
                kind: "agreement",
                from: self.status.as_str().to_string(),
                to: outcome.as_str().to_string(),
            });
        }
        self.status = outcome;
        self.closed_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_agreement_starts_active() {
        let agreement = Agreement::new(
            NewAgreement::new(CustomerId::new(), UnitId::new(), date(2026, 10, 16)).ending(date(2026, 11, 16)),
        )
        .unwrap();
        assert!(agreement.is_active());
        assert!(agreement.closed_at.is_none());
    }

    #[test]
    fn test_agreement_open_ended() {
        let agreement = Agreement::new(NewAgreement::new(CustomerId::new(), UnitId::new(), date(2026, 1, 1))).unwrap();
        assert_eq!(agreement.end_date, None);
    }

    #[test]
    fn test_agreement_same_day_range_is_valid() {
        let day = date(2026, 3, 1);
        assert!(Agreement::new(NewAgreement::new(CustomerId::new(), UnitId::new(), day).ending(day)).is_ok());
    }

    #[test]
    fn test_agreement_rejects_inverted_range() {
        let result = Agreement::new(
            NewAgreement::new(CustomerId::new(), UnitId::new(), date(2026, 5, 2)).ending(date(2026, 5, 1)),
        );
        assert!(matches!(result, Err(ValidationError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_agreement_close_once() {
        let mut agreement =
            Agreement::new(NewAgreement::new(CustomerId::new(), UnitId::new(), date(2026, 1, 1))).unwrap();

        assert!(agreement.close(AgreementStatus::Active).is_err());
        agreement.close(AgreementStatus::Completed).unwrap();
        assert_eq!(agreement.status, AgreementStatus::Completed);
        assert!(agreement.closed_at.is_some());

        // Terminal
        assert!(agreement.close(AgreementStatus::Cancelled).is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("cancelled".parse::<AgreementStatus>().unwrap(), AgreementStatus::Cancelled);
        assert!("expired".parse::<AgreementStatus>().is_err());
        assert!(AgreementStatus::Completed.is_terminal());
        assert!(!AgreementStatus::Active.is_terminal());
    }
}
