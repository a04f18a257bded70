// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Users, rosters, isolation descriptors and the hub configuration manifest.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure access-policy rules with no provisioning side effects

pub mod user;
pub mod roster;
pub mod access_policy;
pub mod volume;
pub mod hub_config;
