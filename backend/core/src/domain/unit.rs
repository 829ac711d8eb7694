// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Storage unit aggregate
//!
//! A unit is a leasable space that belongs to exactly one facility. Its
//! status is a closed state machine; the `occupied` state is entered and
//! left only through the agreement lifecycle.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Unit entity, status lifecycle and pricing rules

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::facility::FacilityId;
use crate::domain::validation::{normalize_optional, ValidationError};

/// Prices are stored as NUMERIC(12, 2).
pub const PRICE_SCALE: i64 = 2;

/// Digits left of the decimal point that `NUMERIC(12,2)` can hold.
pub const PRICE_INTEGER_DIGITS: u32 = 10;

/// Unique identifier for a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub Uuid);

impl UnitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unit status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    /// Free to be leased
    #[default]
    Available,
    /// Held for a prospective renter
    Reserved,
    /// Leased under an active agreement
    Occupied,
    /// Out of service
    Maintenance,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Occupied => "occupied",
            Self::Maintenance => "maintenance",
        }
    }

    /// Only an available unit may be leased.
    pub fn can_lease(&self) -> bool {
        matches!(self, Self::Available)
    }

    pub fn can_transition_to(&self, to: UnitStatus) -> bool {
        use UnitStatus::*;
        match (self, to) {
            (Available, Reserved) | (Available, Occupied) | (Available, Maintenance) => true,
            (Reserved, Available) | (Reserved, Occupied) => true,
            (Occupied, Available) => true,
            (Maintenance, Available) => true,
            (Available, Available)
            | (Reserved, Reserved)
            | (Reserved, Maintenance)
            | (Occupied, Reserved)
            | (Occupied, Occupied)
            | (Occupied, Maintenance)
            | (Maintenance, Reserved)
            | (Maintenance, Occupied)
            | (Maintenance, Maintenance) => false,
        }
    }

    pub fn transition_to(self, to: UnitStatus) -> Result<UnitStatus, ValidationError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(ValidationError::InvalidTransition {
                kind: "unit",
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }
}

impl FromStr for UnitStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "reserved" => Ok(Self::Reserved),
            "occupied" => Ok(Self::Occupied),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(ValidationError::UnknownStatus {
                kind: "unit",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for `UnitRepository::create`.
#[derive(Debug, Clone)]
pub struct NewUnit {
    pub facility_id: FacilityId,
    pub unit_type: Option<String>,
    pub size: Option<String>,
    pub price: Option<BigDecimal>,
    pub status: UnitStatus,
}

impl NewUnit {
    pub fn in_facility(facility_id: FacilityId) -> Self {
        Self {
            facility_id,
            unit_type: None,
            size: None,
            price: None,
            status: UnitStatus::Available,
        }
    }

    pub fn with_type(mut self, unit_type: impl Into<String>) -> Self {
        self.unit_type = Some(unit_type.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_price(mut self, price: BigDecimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_status(mut self, status: UnitStatus) -> Self {
        self.status = status;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub facility_id: FacilityId,
    pub unit_type: Option<String>,
    pub size: Option<String>,
    pub price: Option<BigDecimal>,
    pub status: UnitStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Unit {
    /// Aggregate factory. Does not check that the facility exists; that is
    /// a repository concern.
    pub fn new(input: NewUnit) -> Result<Self, ValidationError> {
        // Invariant: occupied is only reachable through an agreement
        if input.status == UnitStatus::Occupied {
            return Err(ValidationError::InvalidTransition {
                kind: "unit",
                from: "new".to_string(),
                to: UnitStatus::Occupied.as_str().to_string(),
            });
        }

        let price = input.price.map(validate_price).transpose()?;
        let now = Utc::now();

        Ok(Self {
            id: UnitId::new(),
            facility_id: input.facility_id,
            unit_type: normalize_optional(input.unit_type),
            size: normalize_optional(input.size),
            price,
            status: input.status,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_available(&self) -> bool {
        self.status.can_lease()
    }

    /// Move to `to`, enforcing the status table.
    pub fn transition_to(&mut self, to: UnitStatus) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(to)?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Reject negative prices and prices with more precision than the column holds.
pub fn validate_price(price: BigDecimal) -> Result<BigDecimal, ValidationError> {
    if price < BigDecimal::from(0) {
        return Err(ValidationError::InvalidPrice(format!("{} is negative", price)));
    }
    if price >= BigDecimal::from(10u64.pow(PRICE_INTEGER_DIGITS)) {
        return Err(ValidationError::InvalidPrice(format!(
            "{} exceeds {} integer digits",
            price, PRICE_INTEGER_DIGITS
        )));
    }
    let (_, scale) = price.normalized().as_bigint_and_exponent();
    if scale > PRICE_SCALE {
        return Err(ValidationError::InvalidPrice(format!(
            "{} has more than {} decimal places",
            price, PRICE_SCALE
        )));
    }
    Ok(price.with_scale(PRICE_SCALE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(raw: &str) -> BigDecimal {
        BigDecimal::from_str(raw).unwrap()
    }

    #[test]
    fn test_unit_creation_defaults_to_available() {
        let unit = Unit::new(
            NewUnit::in_facility(FacilityId::new())
                .with_type("Small Locker")
                .with_size("2x2")
                .with_price(price("120.0")),
        )
        .unwrap();

        assert_eq!(unit.status, UnitStatus::Available);
        assert_eq!(unit.unit_type.as_deref(), Some("Small Locker"));
        assert_eq!(unit.price, Some(price("120.00")));
        assert!(unit.is_available());
    }

    #[test]
    fn test_unit_cannot_be_created_occupied() {
        let result = Unit::new(NewUnit::in_facility(FacilityId::new()).with_status(UnitStatus::Occupied));
        assert!(matches!(result, Err(ValidationError::InvalidTransition { .. })));
    }

    #[test]
    fn test_price_validation() {
        assert!(validate_price(price("-0.01")).is_err());
        assert!(validate_price(price("9.999")).is_err());
        assert_eq!(validate_price(price("0")).unwrap(), price("0.00"));
        // Trailing zeros beyond the scale are not extra precision
        assert_eq!(validate_price(price("75.5000")).unwrap(), price("75.50"));
    }

    #[test]
    fn test_price_upper_bound() {
        assert_eq!(
            validate_price(price("9999999999.99")).unwrap(),
            price("9999999999.99")
        );
        assert!(matches!(
            validate_price(price("10000000000")),
            Err(ValidationError::InvalidPrice(_))
        ));
        assert!(matches!(
            validate_price(price("123456789012345.00")),
            Err(ValidationError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_price_is_exact() {
        let a = validate_price(price("0.10")).unwrap();
        let b = validate_price(price("0.20")).unwrap();
        assert_eq!(a + b, price("0.30"));
    }

    #[test]
    fn test_status_transitions() {
        let mut unit = Unit::new(NewUnit::in_facility(FacilityId::new())).unwrap();

        // Available -> Reserved -> Occupied -> Available
        unit.transition_to(UnitStatus::Reserved).unwrap();
        unit.transition_to(UnitStatus::Occupied).unwrap();
        assert!(!unit.is_available());
        unit.transition_to(UnitStatus::Available).unwrap();

        // Available -> Maintenance -> Available
        unit.transition_to(UnitStatus::Maintenance).unwrap();
        unit.transition_to(UnitStatus::Available).unwrap();
    }

    #[test]
    fn test_invalid_status_transitions() {
        assert!(UnitStatus::Occupied.transition_to(UnitStatus::Maintenance).is_err());
        assert!(UnitStatus::Occupied.transition_to(UnitStatus::Reserved).is_err());
        assert!(UnitStatus::Maintenance.transition_to(UnitStatus::Occupied).is_err());
        assert!(UnitStatus::Available.transition_to(UnitStatus::Available).is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("maintenance".parse::<UnitStatus>().unwrap(), UnitStatus::Maintenance);
        assert!(matches!(
            "leased".parse::<UnitStatus>(),
            Err(ValidationError::UnknownStatus { kind: "unit", .. })
        ));
    }
}
