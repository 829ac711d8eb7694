// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Entities, value objects and persistence contracts for the storage
//! facility core.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Customers, facilities, units, agreements and their invariants

pub mod agreement;
pub mod config;
pub mod customer;
pub mod facility;
pub mod repository;
pub mod unit;
pub mod validation;
