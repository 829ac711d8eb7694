// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::validation::{normalize_optional, require_non_empty, ValidationError};

/// Unique identifier for a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How to reach a customer. Both channels are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ContactInfo {
    pub fn new(email: Option<String>, phone: Option<String>) -> Result<Self, ValidationError> {
        let email = normalize_optional(email);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(ValidationError::InvalidContact(format!(
                    "email '{}' is missing '@'",
                    email
                )));
            }
        }
        Ok(Self {
            email,
            phone: normalize_optional(phone),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none()
    }
}

/// Identity verification state. Transitions are driven by external
/// collaborators (KYC checks, staff review), never by the provisioning flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unverified" => Ok(Self::Unverified),
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            other => Err(ValidationError::UnknownStatus {
                kind: "verification",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for `CustomerRepository::create`.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub contact: Option<ContactInfo>,
}

impl NewCustomer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: None,
        }
    }

    pub fn with_contact(mut self, contact: ContactInfo) -> Self {
        self.contact = Some(contact);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub contact: ContactInfo,
    pub verification_status: VerificationStatus,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Aggregate factory. The name is required; everything else defaults.
    /// A supplied contact is re-checked, since its fields are public.
    pub fn new(input: NewCustomer) -> Result<Self, ValidationError> {
        let name = require_non_empty("customer", "name", input.name)?;
        let contact = input
            .contact
            .map(|c| ContactInfo::new(c.email, c.phone))
            .transpose()?
            .unwrap_or_default();
        Ok(Self {
            id: CustomerId::new(),
            name,
            contact,
            verification_status: VerificationStatus::default(),
            created_at: Utc::now(),
        })
    }
}
