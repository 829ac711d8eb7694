// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Facility aggregate
//!
//! A facility is a physical site that owns storage units. It carries a
//! structured configuration payload (access-hours policy and similar
//! site-level settings) that is validated when the facility is created,
//! not when it is read back.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Facility entity and its configuration value object

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::validation::{normalize_optional, require_non_empty, ValidationError};

/// Unique identifier for a facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacilityId(pub Uuid);

impl FacilityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for FacilityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FacilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Facility-level settings, always a JSON object.
///
/// Known keys are exposed through typed accessors; unknown keys are kept
/// as-is so operators can extend the payload without a schema change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityConfig(Map<String, Value>);

impl FacilityConfig {
    pub const ALLOW_24HR: &'static str = "allow24hr";

    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse a raw JSON document. Only objects are accepted.
    pub fn from_json_str(raw: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ValidationError::InvalidConfig(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => {
                if let Some(flag) = map.get(Self::ALLOW_24HR) {
                    if !flag.is_boolean() {
                        return Err(ValidationError::InvalidConfig(format!(
                            "'{}' must be a boolean",
                            Self::ALLOW_24HR
                        )));
                    }
                }
                Ok(Self(map))
            }
            other => Err(ValidationError::InvalidConfig(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn with_allow_24hr(mut self, allow: bool) -> Self {
        self.0.insert(Self::ALLOW_24HR.to_string(), Value::Bool(allow));
        self
    }

    /// Whether tenants may access the site around the clock. Absent means no.
    pub fn allows_24hr(&self) -> bool {
        self.0
            .get(Self::ALLOW_24HR)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Input for `FacilityRepository::create`.
#[derive(Debug, Clone, Default)]
pub struct NewFacility {
    pub name: String,
    pub address: Option<String>,
    pub region: Option<String>,
    pub config: Option<FacilityConfig>,
}

impl NewFacility {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_config(mut self, config: FacilityConfig) -> Self {
        self.config = Some(config);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
    pub address: Option<String>,
    pub region: Option<String>,
    pub config: FacilityConfig,
    pub created_at: DateTime<Utc>,
}

impl Facility {
    pub fn new(input: NewFacility) -> Result<Self, ValidationError> {
        let name = require_non_empty("facility", "name", input.name)?;
        Ok(Self {
            id: FacilityId::new(),
            name,
            address: normalize_optional(input.address),
            region: normalize_optional(input.region),
            config: input.config.unwrap_or_default(),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_facility_creation() {
        let facility = Facility::new(
            NewFacility::named("Main Facility")
                .with_address("456 Warehouse Rd")
                .with_region("VIC")
                .with_config(FacilityConfig::new().with_allow_24hr(true)),
        )
        .unwrap();

        assert_eq!(facility.name, "Main Facility");
        assert_eq!(facility.address.as_deref(), Some("456 Warehouse Rd"));
        assert_eq!(facility.region.as_deref(), Some("VIC"));
        assert!(facility.config.allows_24hr());
    }

    #[test]
    fn test_facility_empty_name() {
        assert!(Facility::new(NewFacility::named("")).is_err());
    }

    #[test]
    fn test_config_defaults_to_empty_object() {
        let facility = Facility::new(NewFacility::named("Annex")).unwrap();
        assert!(facility.config.is_empty());
        assert!(!facility.config.allows_24hr());
        assert_eq!(facility.config.to_value(), json!({}));
    }

    #[test]
    fn test_config_from_json_str() {
        let config = FacilityConfig::from_json_str(r#"{"allow24hr": true, "gate": "north"}"#).unwrap();
        assert!(config.allows_24hr());
        assert_eq!(config.get("gate"), Some(&json!("north")));
    }

    #[test]
    fn test_config_rejects_malformed_payloads() {
        assert!(FacilityConfig::from_json_str("{not json").is_err());
        assert!(FacilityConfig::from_json_str("[1, 2]").is_err());
        assert!(FacilityConfig::from_value(json!("allow24hr")).is_err());
        assert!(FacilityConfig::from_value(json!({"allow24hr": "yes"})).is_err());
    }

    #[test]
    fn test_config_deserialize_rejects_non_object() {
        assert!(serde_json::from_value::<FacilityConfig>(json!(42)).is_err());
        let config: FacilityConfig = serde_json::from_value(json!({"allow24hr": false})).unwrap();
        assert!(!config.allows_24hr());
    }
}
