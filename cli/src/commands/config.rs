// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use pluto_hub_core::domain::hub_config::HubConfigManifest;

pub const MINIMAL_TEMPLATE: &str = include_str!("../../templates/config-minimal.yaml");
pub const EXAMPLES_TEMPLATE: &str = include_str!("../../templates/config-with-examples.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./pluto-config.yaml)
        #[arg(short, long, default_value = "./pluto-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = HubConfigManifest::load_or_default(config_override.clone()).context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. PLUTO_CONFIG_PATH: {}",
            std::env::var("PLUTO_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./pluto-config.yaml");
        println!("  4. ~/.pluto/config.yaml");
        println!("  5. /etc/pluto/config.yaml");
        println!();
    }

    let spec = &config.spec;

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Deployment:".bold());
    println!("  Name: {}", config.metadata.name);
    println!("  Base name: {}", spec.deployment.base_name);
    println!("  Hub URL: {}", config.hub_url());
    println!("  Region: {}", spec.deployment.region);
    if let Some(account) = &spec.deployment.account {
        println!("  Account: {}", account);
    }
    println!();

    println!("{}", "Identity:".bold());
    println!("  User pool: {}", spec.identity.cognito_user_pool_id);
    println!("  Login service: {}", spec.identity.oauth_login_service_name);
    println!("  Username key: {}", spec.identity.oauth_login_username_key.as_str());
    println!("  Scope: {}", spec.identity.oauth_scope.join(","));
    println!("  Internal domain suffix: {}", spec.identity.internal_domain_suffix);
    let password = if spec.identity.temp_password.starts_with("env:") {
        spec.identity.temp_password.clone()
    } else if spec.identity.temp_password.is_empty() {
        "(not set)".to_string()
    } else {
        "(literal)".to_string()
    };
    println!("  Temporary password: {}", password);
    println!();

    println!("{}", "Images:".bold());
    println!(
        "  Hub: {}:{} (x{})",
        spec.hub.image_repository_arn, spec.hub.image_tag, spec.hub.num_containers
    );
    println!(
        "  Single user: {}:{}",
        spec.single_user.image_repository_arn, spec.single_user.image_tag
    );
    println!();

    println!("{}", "Storage:".bold());
    println!("  Reference path: {}", spec.storage.reference_path.display());
    println!("  Admins roster: {}", spec.roster.admins.display());
    println!("  Allowed users roster: {}", spec.roster.allowed_users.display());
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = HubConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples { EXAMPLES_TEMPLATE } else { MINIMAL_TEMPLATE };

    std::fs::write(&output, sample).with_context(|| format!("Failed to write config to {:?}", output))?;

    println!("{}", format!("✓ Configuration generated: {}", output.display()).green());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse() {
        for template in [MINIMAL_TEMPLATE, EXAMPLES_TEMPLATE] {
            let config = HubConfigManifest::from_yaml_str(template).unwrap();
            assert_eq!(config.api_version, "pluto-hub/v1");
            assert_eq!(config.kind, "HubConfig");
        }
    }

    #[test]
    fn test_examples_template_is_valid() {
        let config = HubConfigManifest::from_yaml_str(EXAMPLES_TEMPLATE).unwrap();
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_generate_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("pluto-config.yaml");
        generate(output.clone(), false).await.unwrap();
        assert_eq!(std::fs::read_to_string(output).unwrap(), MINIMAL_TEMPLATE);
    }
}
