// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provisioning plan command

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use pluto_hub_core::application::provisioning::ProvisioningPlan;
use pluto_hub_core::domain::hub_config::HubConfigManifest;

use super::roster::resolve_descriptors;
use super::{load_config, OutputFormat};

#[derive(Args)]
pub struct PlanArgs {
    /// Print the full plan in a structured format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Directory relative roster paths are resolved against
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub base_dir: PathBuf,
}

pub fn build_plan(config: &HubConfigManifest, base_dir: &Path) -> Result<ProvisioningPlan> {
    let descriptors = resolve_descriptors(config, base_dir)?;
    ProvisioningPlan::from_config(config, &descriptors)
}

pub async fn execute(args: PlanArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let plan = build_plan(&config, &args.base_dir)?;

    if let Some(format) = args.format {
        println!("{}", format.render(&plan)?);
        return Ok(());
    }

    println!("{}", "Provisioning plan:".bold());
    println!();
    println!(
        "  {} {} -> {}",
        "access point".dimmed(),
        plan.reference_access_point.logical_id,
        plan.reference_access_point.path.display()
    );
    for user in &plan.users {
        println!();
        println!("  {}", user.handle.bold());
        println!(
            "    {} {} -> {}",
            "access point".dimmed(),
            user.access_point.logical_id,
            user.access_point.path.display()
        );
        println!("    {} {}", "task definition".dimmed(), user.task_definition.logical_id);
        for mount in &user.task_definition.container.mounts {
            println!(
                "      {} at {} ({})",
                mount.source_volume,
                mount.container_path.display(),
                mount.access_mode
            );
        }
        if let Some(account) = &user.identity_account {
            println!("    {} {}", "identity account".dimmed(), account.username);
        }
    }
    println!();
    println!("  {}", "hub".bold());
    println!(
        "    {} {} ({} cpu, {} MiB)",
        "task definition".dimmed(),
        plan.hub.task_definition.logical_id,
        plan.hub.task_definition.cpu,
        plan.hub.task_definition.memory_mib
    );
    println!(
        "    {} {} x{}, health check {} ({})",
        "service".dimmed(),
        plan.hub.service.logical_id,
        plan.hub.service.desired_count,
        plan.hub.service.health_check.path,
        plan.hub.service.health_check.healthy_http_codes
    );
    println!(
        "    {} {} on port {}",
        "listener".dimmed(),
        plan.hub.service.listener.logical_id,
        plan.hub.service.listener.port
    );
    if let Some(record) = &plan.hub.dns_record {
        println!(
            "    {} {}.{}",
            "dns record".dimmed(),
            record.record_name,
            record.zone_name
        );
    }
    println!();
    println!(
        "{}",
        format!(
            "{} access points, {} task definitions, {} identity accounts",
            plan.access_point_count(),
            plan.users.len(),
            plan.identity_accounts().count()
        )
        .green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_plan_from_roster_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("hub_docker")).unwrap();
        std::fs::write(dir.path().join("hub_docker/admins"), "alice@tudelft.nl\n").unwrap();

        let mut config = HubConfigManifest::default();
        config.spec.deployment.base_name = "Pluto".to_string();
        let plan = build_plan(&config, dir.path()).unwrap();

        assert_eq!(plan.users.len(), 1);
        assert_eq!(plan.users[0].task_definition.logical_id, "alice_tudelft_nlTaskDef");
        assert!(plan.users[0].identity_account.is_none());

        let yaml = OutputFormat::Yaml.render(&plan).unwrap();
        assert!(yaml.contains("ReferenceAccessPt"));
    }
}
