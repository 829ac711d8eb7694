// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Structural Validation
//!
//! Field-level validation shared by every aggregate factory in the domain
//! layer. Validation is purely structural: required fields present, enum
//! values recognized, configuration payloads well-formed, date ranges
//! ordered. Anything that needs another aggregate (foreign keys, unit
//! availability) is the repository's job.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Error taxonomy for malformed or missing input

use thiserror::Error;

/// Malformed or missing input, local to a single entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{entity}.{field} must not be empty")]
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("Invalid contact info: {0}")]
    InvalidContact(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("start_date {start} is after end_date {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("Unknown {kind} status: '{value}'")]
    UnknownStatus { kind: &'static str, value: String },

    #[error("Invalid facility configuration: {0}")]
    InvalidConfig(String),

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Invalid {kind} status transition from {from} to {to}")]
    InvalidTransition {
        kind: &'static str,
        from: String,
        to: String,
    },
}

/// Trim `value` and reject it when nothing is left.
pub(crate) fn require_non_empty(
    entity: &'static str,
    field: &'static str,
    value: String,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { entity, field });
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Normalize an optional text field: whitespace-only collapses to `None`.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_empty_trims() {
        let name = require_non_empty("customer", "name", "  Acme  ".to_string()).unwrap();
        assert_eq!(name, "Acme");
    }

    #[test]
    fn test_require_non_empty_rejects_blank() {
        let err = require_non_empty("facility", "name", "   ".to_string()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptyField {
                entity: "facility",
                field: "name"
            }
        );
        assert_eq!(err.to_string(), "facility.name must not be empty");
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(None), None);
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(normalize_optional(Some(" VIC ".to_string())), Some("VIC".to_string()));
    }
}
