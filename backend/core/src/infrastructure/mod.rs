// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure
//!
//! Connection bootstrapping and repository adapters.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** PostgreSQL pool, migrations, repository implementations

pub mod db;
pub mod repositories;
