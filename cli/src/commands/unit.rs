// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Unit commands
//!
//! Commands: status, set, list

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use storex_core::application::{AgreementLifecycleUseCase, StandardAgreementLifecycleUseCase};
use storex_core::domain::facility::FacilityId;
use storex_core::domain::unit::{Unit, UnitId, UnitStatus};

#[derive(Subcommand)]
pub enum UnitCommand {
    /// Show a unit and the agreement occupying it
    Status {
        #[arg(value_name = "UNIT_ID")]
        id: String,
    },

    /// Change the operational status of a unit (available, reserved, maintenance)
    Set {
        #[arg(value_name = "UNIT_ID")]
        id: String,

        #[arg(value_name = "STATUS")]
        status: UnitStatus,
    },

    /// List the units of a facility
    List {
        #[arg(long, value_name = "FACILITY_ID")]
        facility: String,
    },
}

pub async fn handle_command(command: UnitCommand, config_path: Option<PathBuf>) -> Result<()> {
    let session = super::Session::open(config_path).await?;
    let result = run(command, &session).await;
    session.close().await;
    result
}

async fn run(command: UnitCommand, session: &super::Session) -> Result<()> {
    let lifecycle = StandardAgreementLifecycleUseCase::from_repositories(&session.repos);

    match command {
        UnitCommand::Status { id } => {
            let id = UnitId::from_string(&id).context("Invalid unit id")?;
            let overview = lifecycle.unit_overview(id).await?;
            print_unit(&overview.unit);
            match overview.active_agreement {
                Some(agreement) => println!(
                    "  Leased to customer {} under agreement {} since {}",
                    agreement.customer_id, agreement.id, agreement.start_date
                ),
                None => println!("  {}", "No active agreement".dimmed()),
            }
        }
        UnitCommand::Set { id, status } => {
            let id = UnitId::from_string(&id).context("Invalid unit id")?;
            let unit = lifecycle.set_unit_status(id, status).await?;
            println!("{}", format!("✓ Unit {} is now {}", unit.id, unit.status).green());
        }
        UnitCommand::List { facility } => {
            let facility_id = FacilityId::from_string(&facility).context("Invalid facility id")?;
            let units = session.repos.units.find_by_facility(facility_id).await?;
            if units.is_empty() {
                println!("{}", "No units found.".dimmed());
            }
            for unit in &units {
                print_unit(unit);
            }
        }
    }

    Ok(())
}

fn print_unit(unit: &Unit) {
    let status = match unit.status {
        UnitStatus::Available => unit.status.as_str().green(),
        UnitStatus::Reserved => unit.status.as_str().yellow(),
        UnitStatus::Occupied => unit.status.as_str().blue(),
        UnitStatus::Maintenance => unit.status.as_str().red(),
    };
    let price = unit
        .price
        .as_ref()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}  {}  {}  {}  [{}]",
        unit.id,
        unit.unit_type.as_deref().unwrap_or("-"),
        unit.size.as_deref().unwrap_or("-"),
        price,
        status
    );
}
