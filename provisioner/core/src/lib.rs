// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Pluto Hub Core
//!
//! Derives per-user isolation for the notebook hub and turns it into requests
//! for the external provisioning layer and the hub runtime environment.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Roster loading, access policy resolution, provisioning plans

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
