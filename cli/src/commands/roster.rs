// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Roster inspection commands
//!
//! Commands: show

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pluto_hub_core::domain::access_policy::IsolationDescriptor;
use pluto_hub_core::domain::hub_config::HubConfigManifest;
use pluto_hub_core::domain::user::IdentityProviderClass;

use super::load_configured_roster;

#[derive(Subcommand)]
pub enum RosterCommand {
    /// Show every roster user with their isolation descriptor
    Show {
        /// Print descriptors as JSON
        #[arg(long)]
        json: bool,

        /// Directory relative roster paths are resolved against
        #[arg(long, value_name = "DIR", default_value = ".")]
        base_dir: PathBuf,
    },
}

pub async fn handle_command(command: RosterCommand, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        RosterCommand::Show { json, base_dir } => show(config_path, &base_dir, json).await,
    }
}

/// Resolve descriptors for the configured roster
pub fn resolve_descriptors(
    config: &HubConfigManifest,
    base_dir: &Path,
) -> Result<BTreeMap<String, IsolationDescriptor>> {
    let roster = load_configured_roster(config, base_dir)?;
    Ok(config.access_policy().resolve(&roster))
}

async fn show(config_path: Option<PathBuf>, base_dir: &Path, json: bool) -> Result<()> {
    let config = HubConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    let descriptors = resolve_descriptors(&config, base_dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }

    if descriptors.is_empty() {
        println!("{}", "Roster is empty".yellow());
        return Ok(());
    }

    println!("{}", format!("Roster ({} users):", descriptors.len()).bold());
    println!();
    for (handle, descriptor) in &descriptors {
        let role = if descriptor.user.is_admin {
            "admin".green()
        } else {
            "user".normal()
        };
        let login = match descriptor.identity_provider_class {
            IdentityProviderClass::Federated => "federated".cyan(),
            IdentityProviderClass::Local => "local".normal(),
        };
        println!("  {} [{}, {}]", handle.bold(), role, login);
        println!("    Private: {}", descriptor.private_path.display());
        println!(
            "    Reference: {} ({})",
            descriptor.reference_path.display(),
            descriptor.reference_access
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pluto_hub_core::domain::volume::AccessMode;

    #[test]
    fn test_resolve_descriptors_from_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("hub_docker")).unwrap();
        std::fs::write(dir.path().join("hub_docker/admins"), "alice@tudelft.nl\n").unwrap();
        std::fs::write(dir.path().join("hub_docker/allowed_users"), "bob@gmail.com\n").unwrap();

        let descriptors = resolve_descriptors(&HubConfigManifest::default(), dir.path()).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors["alice@tudelft.nl"].reference_access, AccessMode::ReadWrite);
        assert_eq!(
            descriptors["bob@gmail.com"].identity_provider_class,
            IdentityProviderClass::Federated
        );
    }
}
