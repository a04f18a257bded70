// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Hub environment command
//!
//! Runs the provisioning plan against the in-memory backend to obtain the
//! routing table, renders the hub container environment and deploys the hub
//! with it.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use pluto_hub_core::application::hub_environment::{HubEnvironment, ProvisionedOutputs};
use pluto_hub_core::application::provisioning::{ProvisioningPlan, ProvisioningService};
use pluto_hub_core::domain::hub_config::HubConfigManifest;
use pluto_hub_core::infrastructure::InMemoryProvisioningBackend;

use super::{load_config, load_configured_roster};

#[derive(Args)]
pub struct EnvArgs {
    /// YAML file with the resources created by the provisioning layer
    #[arg(long, value_name = "FILE")]
    pub outputs: PathBuf,

    /// Print as a JSON object instead of KEY=\"value\" lines
    #[arg(long)]
    pub json: bool,

    /// Directory relative roster paths are resolved against
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub base_dir: PathBuf,
}

pub async fn build_environment(
    config: &HubConfigManifest,
    base_dir: &Path,
    outputs: &ProvisionedOutputs,
) -> Result<HubEnvironment> {
    let roster = load_configured_roster(config, base_dir)?;
    let descriptors = config.access_policy().resolve(&roster);
    let plan = ProvisioningPlan::from_config(config, &descriptors)?;

    let backend = InMemoryProvisioningBackend::new(
        config.spec.deployment.region.clone(),
        config.spec.deployment.account.clone(),
    );
    let service = ProvisioningService::new(Arc::new(backend));
    let routing = service
        .apply(&plan)
        .await
        .context("Dry-run provisioning failed")?;
    info!(users = routing.len(), "Resolved task definition routing");

    let env = HubEnvironment::build(config, &roster, &routing, outputs)?;
    service
        .deploy_hub(&plan.hub, &env)
        .await
        .context("Dry-run hub deployment failed")?;
    Ok(env)
}

pub async fn execute(args: EnvArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let outputs = ProvisionedOutputs::from_yaml_file(&args.outputs)
        .with_context(|| format!("Failed to load provisioning outputs from {:?}", args.outputs))?;

    let env = build_environment(&config, &args.base_dir, &outputs).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&env)?);
    } else {
        print!("{}", env.to_dotenv());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pluto_hub_core::application::hub_environment::vars;

    #[tokio::test]
    async fn test_build_environment_routes_every_user() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("hub_docker")).unwrap();
        std::fs::write(dir.path().join("hub_docker/admins"), "alice@tudelft.nl\n").unwrap();
        std::fs::write(dir.path().join("hub_docker/allowed_users"), "carol@tudelft.nl\n").unwrap();

        let mut config = HubConfigManifest::default();
        config.spec.deployment.account = Some("123456789012".to_string());

        let env = build_environment(&config, dir.path(), &ProvisionedOutputs::default())
            .await
            .unwrap();

        let routing: serde_json::Value =
            serde_json::from_str(env.get(vars::SPAWNER_TASK_DEFINITIONS).unwrap()).unwrap();
        assert_eq!(
            routing["carol@tudelft.nl"],
            "arn:aws:ecs:eu-central-1:123456789012:task-definition/carol_tudelft_nlTaskDef:1"
        );
        assert_eq!(env.get(vars::ADMIN_USERS), Some(r#"["alice@tudelft.nl"]"#));
    }
}
