// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Spawn arguments command
//!
//! Reads the hub environment from the current process and prints the
//! run-task request that starts a user's notebook server.

use anyhow::{bail, Context, Result};
use clap::Args;
use std::collections::BTreeMap;

use pluto_hub_core::application::hub_environment::HubRuntimeSettings;

#[derive(Args)]
pub struct SpawnArgs {
    /// Authenticated user handle
    #[arg(long, value_name = "HANDLE")]
    pub user: String,

    /// Variable forwarded to the notebook container (repeatable)
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,
}

pub fn parse_env_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid --env value '{}': expected KEY=VALUE", pair);
        };
        if key.is_empty() {
            bail!("Invalid --env value '{}': empty key", pair);
        }
        env.insert(key.to_string(), value.to_string());
    }
    Ok(env)
}

pub async fn execute(args: SpawnArgs) -> Result<()> {
    let settings = HubRuntimeSettings::from_process_env().context("Hub environment is incomplete")?;
    let spawner_env = parse_env_pairs(&args.env)?;

    let request = settings.run_task_request(&args.user, &spawner_env)?;
    println!("{}", serde_json::to_string_pretty(&request)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_pairs() {
        let env = parse_env_pairs(&["A=1".to_string(), "B=x=y".to_string()]).unwrap();
        assert_eq!(env["A"], "1");
        assert_eq!(env["B"], "x=y");

        assert!(parse_env_pairs(&["NOEQUALS".to_string()]).is_err());
        assert!(parse_env_pairs(&["=value".to_string()]).is_err());
    }
}
