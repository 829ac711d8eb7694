// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Storex Core
//!
//! Transactional core of the Storex self-storage backend: customers,
//! facilities, units and rental agreements, plus the provisioning workflow
//! that links them.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, repositories, application services

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
