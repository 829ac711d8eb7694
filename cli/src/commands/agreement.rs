// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agreement lifecycle commands
//!
//! Commands: complete, cancel, list

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use storex_core::application::{AgreementLifecycleUseCase, StandardAgreementLifecycleUseCase};
use storex_core::domain::agreement::{Agreement, AgreementId, AgreementStatus};
use storex_core::domain::customer::CustomerId;

#[derive(Subcommand)]
pub enum AgreementCommand {
    /// Mark an agreement completed and release its unit
    Complete {
        #[arg(value_name = "AGREEMENT_ID")]
        id: String,
    },

    /// Cancel an agreement and release its unit
    Cancel {
        #[arg(value_name = "AGREEMENT_ID")]
        id: String,
    },

    /// List a customer's agreements
    List {
        #[arg(long, value_name = "CUSTOMER_ID")]
        customer: String,
    },
}

pub async fn handle_command(command: AgreementCommand, config_path: Option<PathBuf>) -> Result<()> {
    let session = super::Session::open(config_path).await?;
    let result = run(command, &session).await;
    session.close().await;
    result
}

async fn run(command: AgreementCommand, session: &super::Session) -> Result<()> {
    let lifecycle = StandardAgreementLifecycleUseCase::from_repositories(&session.repos);

    match command {
        AgreementCommand::Complete { id } => {
            let id = AgreementId::from_string(&id).context("Invalid agreement id")?;
            let agreement = lifecycle.complete_agreement(id).await?;
            println!("{}", format!("✓ Agreement {} completed", agreement.id).green());
            println!("  Unit {} is available again", agreement.unit_id);
        }
        AgreementCommand::Cancel { id } => {
            let id = AgreementId::from_string(&id).context("Invalid agreement id")?;
            let agreement = lifecycle.cancel_agreement(id).await?;
            println!("{}", format!("✓ Agreement {} cancelled", agreement.id).yellow());
            println!("  Unit {} is available again", agreement.unit_id);
        }
        AgreementCommand::List { customer } => {
            let customer_id = CustomerId::from_string(&customer).context("Invalid customer id")?;
            let agreements = session.repos.agreements.find_by_customer(customer_id).await?;
            if agreements.is_empty() {
                println!("{}", "No agreements found.".dimmed());
            }
            for agreement in &agreements {
                print_agreement(agreement);
            }
        }
    }

    Ok(())
}

fn print_agreement(agreement: &Agreement) {
    let status = match agreement.status {
        AgreementStatus::Active => agreement.status.as_str().green(),
        AgreementStatus::Completed => agreement.status.as_str().normal(),
        AgreementStatus::Cancelled => agreement.status.as_str().red(),
    };
    let end = agreement
        .end_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "open".to_string());
    println!(
        "{}  unit {}  {} → {}  [{}]",
        agreement.id, agreement.unit_id, agreement.start_date, end, status
    );
}
