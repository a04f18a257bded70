// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for Pluto CLI

pub mod config;
pub mod env;
pub mod plan;
pub mod roster;
pub mod spawn;

pub use self::config::ConfigCommand;
pub use self::env::EnvArgs;
pub use self::plan::PlanArgs;
pub use self::roster::RosterCommand;
pub use self::spawn::SpawnArgs;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;

use pluto_hub_core::domain::hub_config::HubConfigManifest;
use pluto_hub_core::domain::roster::{load_roster, Roster};

/// Structured output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        let rendered = match self {
            Self::Json => serde_json::to_string_pretty(value)?,
            Self::Yaml => serde_yaml::to_string(value)?,
        };
        Ok(rendered)
    }
}

/// Load and validate the hub configuration
pub fn load_config(config_path: Option<std::path::PathBuf>) -> Result<HubConfigManifest> {
    let config = HubConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

/// Load the roster named by the configuration, relative paths resolved against `base_dir`
pub fn load_configured_roster(config: &HubConfigManifest, base_dir: &Path) -> Result<Roster> {
    let sources = config.spec.roster.sources(base_dir);
    let roster = load_roster(&sources, &config.spec.identity.internal_domain_suffix)
        .context("Failed to load roster")?;
    Ok(roster)
}
