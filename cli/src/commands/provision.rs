// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `storex provision` - run the four-step provisioning workflow
//!
//! ```bash
//! storex provision \
//!     --customer "Acme Storage Test" \
//!     --facility "Main Facility" --region VIC --allow-24hr \
//!     --unit-type "Small Locker" --size 2x2 --price 120.00 \
//!     --months 1
//! ```
//!
//! On failure the records created by earlier steps are listed so they can
//! be cleaned up by hand.

use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use chrono::{Months, NaiveDate, Utc};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::str::FromStr;

use storex_core::application::{
    LeaseTerms, ProvisioningError, ProvisioningOutcome, ProvisioningRequest, ProvisioningWorkflow, UnitRequest,
};
use storex_core::domain::customer::{ContactInfo, NewCustomer};
use storex_core::domain::facility::{FacilityConfig, NewFacility};

#[derive(Args)]
pub struct ProvisionCommand {
    /// Customer name
    #[arg(long)]
    customer: String,

    /// Customer email
    #[arg(long)]
    email: Option<String>,

    /// Customer phone
    #[arg(long)]
    phone: Option<String>,

    /// Facility name
    #[arg(long)]
    facility: String,

    #[arg(long)]
    address: Option<String>,

    #[arg(long)]
    region: Option<String>,

    /// Facility configuration as a JSON object
    #[arg(long, value_name = "JSON")]
    facility_config: Option<String>,

    /// Allow 24-hour access (sets `allow24hr` in the facility configuration)
    #[arg(long)]
    allow_24hr: bool,

    #[arg(long)]
    unit_type: Option<String>,

    #[arg(long)]
    size: Option<String>,

    /// Monthly price, at most two decimal places
    #[arg(long, value_parser = parse_price)]
    price: Option<BigDecimal>,

    /// Lease start date (YYYY-MM-DD, default: today)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Lease end date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "months")]
    end: Option<NaiveDate>,

    /// Lease length in months from the start date
    #[arg(long)]
    months: Option<u32>,

    /// Print the created records as JSON
    #[arg(long)]
    json: bool,
}

fn parse_price(raw: &str) -> Result<BigDecimal, String> {
    BigDecimal::from_str(raw).map_err(|e| format!("invalid price '{}': {}", raw, e))
}

impl ProvisionCommand {
    fn into_request(self) -> Result<ProvisioningRequest> {
        let contact = if self.email.is_some() || self.phone.is_some() {
            Some(ContactInfo::new(self.email, self.phone)?)
        } else {
            None
        };

        let mut config = match &self.facility_config {
            Some(raw) => FacilityConfig::from_json_str(raw).context("Invalid --facility-config")?,
            None => FacilityConfig::new(),
        };
        if self.allow_24hr {
            config = config.with_allow_24hr(true);
        }

        let mut facility = NewFacility::named(self.facility).with_config(config);
        facility.address = self.address;
        facility.region = self.region;

        let start_date = self.start.unwrap_or_else(|| Utc::now().date_naive());
        let end_date = match (self.end, self.months) {
            (Some(end), _) => Some(end),
            (None, Some(months)) => Some(
                start_date
                    .checked_add_months(Months::new(months))
                    .context("Lease end date is out of range")?,
            ),
            (None, None) => None,
        };

        Ok(ProvisioningRequest {
            customer: NewCustomer {
                name: self.customer,
                contact,
            },
            facility,
            unit: UnitRequest {
                unit_type: self.unit_type,
                size: self.size,
                price: self.price,
            },
            lease: LeaseTerms { start_date, end_date },
        })
    }
}

pub async fn execute(cmd: ProvisionCommand, config_path: Option<PathBuf>) -> Result<()> {
    let as_json = cmd.json;
    let request = cmd.into_request()?;

    let session = super::Session::open(config_path).await?;
    let workflow = ProvisioningWorkflow::from_repositories(&session.repos)
        .with_step_deadline(session.config.operation_timeout());

    let result = workflow.run(request).await;
    session.close().await;

    match result {
        Ok(outcome) if as_json => {
            let body = serde_json::json!({
                "customer": outcome.customer,
                "facility": outcome.facility,
                "unit": outcome.unit,
                "agreement": outcome.agreement,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Ok(outcome) => {
            print_outcome(&outcome);
            Ok(())
        }
        Err(err) => {
            print_failure(&err);
            Err(err).context("Provisioning failed")
        }
    }
}

fn print_outcome(outcome: &ProvisioningOutcome) {
    println!("{}", "✓ Provisioning complete".green());
    println!("  Customer:  {} ({})", outcome.customer.id, outcome.customer.name);
    println!("  Facility:  {} ({})", outcome.facility.id, outcome.facility.name);
    println!("  Unit:      {} [{}]", outcome.unit.id, outcome.unit.status);
    println!("  Agreement: {} [{}]", outcome.agreement.id, outcome.agreement.status);
    match outcome.agreement.end_date {
        Some(end) => println!("  Term:      {} → {}", outcome.agreement.start_date, end),
        None => println!("  Term:      from {}", outcome.agreement.start_date),
    }
}

fn print_failure(err: &ProvisioningError) {
    eprintln!(
        "{}",
        format!("✗ {} failed with {}", err.step, err.kind()).red().bold()
    );
    if err.completed.is_empty() {
        eprintln!("  No records were created.");
        return;
    }
    eprintln!("  Records already created (not rolled back):");
    if let Some(id) = err.completed.customer_id {
        eprintln!("    customer  {}", id);
    }
    if let Some(id) = err.completed.facility_id {
        eprintln!("    facility  {}", id);
    }
    if let Some(id) = err.completed.unit_id {
        eprintln!("    unit      {}", id);
    }
}
