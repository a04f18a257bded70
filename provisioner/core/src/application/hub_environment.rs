// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Hub Runtime Environment
//!
//! Builds the environment variables the hub container starts with, and parses
//! them back on the hub side to route an authenticated user to their
//! pre-provisioned task definition.
//!
//! Collections (user sets, the routing table, security groups, subnets) are
//! JSON encoded. `OAUTH_SCOPE` stays a comma-separated list.

use crate::application::provisioning::{TaskDefinitionRouting, SINGLE_USER_CONTAINER_NAME};
use crate::domain::hub_config::HubConfigManifest;
use crate::domain::roster::Roster;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Environment variable names read by the hub runtime
pub mod vars {
    pub const ADMIN_USERS: &str = "ADMIN_USERS";
    pub const ALLOWED_USERS: &str = "ALLOWED_USERS";
    pub const OAUTH_CALLBACK_URL: &str = "OAUTH_CALLBACK_URL";
    pub const OAUTH_CLIENT_ID: &str = "OAUTH_CLIENT_ID";
    pub const OAUTH_CLIENT_SECRET: &str = "OAUTH_CLIENT_SECRET";
    pub const OAUTH_LOGIN_SERVICE_NAME: &str = "OAUTH_LOGIN_SERVICE_NAME";
    pub const OAUTH_LOGIN_USERNAME_KEY: &str = "OAUTH_LOGIN_USERNAME_KEY";
    pub const OAUTH_AUTHORIZE_URL: &str = "OAUTH_AUTHORIZE_URL";
    pub const OAUTH_TOKEN_URL: &str = "OAUTH_TOKEN_URL";
    pub const OAUTH_USERDATA_URL: &str = "OAUTH_USERDATA_URL";
    pub const OAUTH_SCOPE: &str = "OAUTH_SCOPE";
    pub const HUB_CONNECT_IP: &str = "FARGATE_HUB_CONNECT_IP";
    pub const SPAWNER_REGION: &str = "FARGATE_SPAWNER_REGION";
    pub const SPAWNER_ECS_HOST: &str = "FARGATE_SPAWNER_ECS_HOST";
    pub const SPAWNER_CLUSTER: &str = "FARGATE_SPAWNER_CLUSTER";
    pub const SPAWNER_TASK_DEFINITIONS: &str = "FARGATE_SPAWNER_TASK_DEFINITIONS";
    pub const SPAWNER_TASK_ROLE_ARN: &str = "FARGATE_SPAWNER_TASK_ROLE_ARN";
    pub const SPAWNER_SECURITY_GROUPS: &str = "FARGATE_SPAWNER_SECURITY_GROUPS";
    pub const SPAWNER_SUBNETS: &str = "FARGATE_SPAWNER_SUBNETS";
    pub const SPAWNER_CONTAINER_NAME: &str = "FARGATE_SPAWNER_CONTAINER_NAME";
    pub const EFS_ID: &str = "FARGATE_EFS_ID";

    pub const ALL: [&str; 21] = [
        ADMIN_USERS,
        ALLOWED_USERS,
        OAUTH_CALLBACK_URL,
        OAUTH_CLIENT_ID,
        OAUTH_CLIENT_SECRET,
        OAUTH_LOGIN_SERVICE_NAME,
        OAUTH_LOGIN_USERNAME_KEY,
        OAUTH_AUTHORIZE_URL,
        OAUTH_TOKEN_URL,
        OAUTH_USERDATA_URL,
        OAUTH_SCOPE,
        HUB_CONNECT_IP,
        SPAWNER_REGION,
        SPAWNER_ECS_HOST,
        SPAWNER_CLUSTER,
        SPAWNER_TASK_DEFINITIONS,
        SPAWNER_TASK_ROLE_ARN,
        SPAWNER_SECURITY_GROUPS,
        SPAWNER_SUBNETS,
        SPAWNER_CONTAINER_NAME,
        EFS_ID,
    ];
}

/// Command the notebook container is started with
pub const SINGLE_USER_COMMAND: [&str; 2] = [
    "/opt/conda/bin/jupyterhub-singleuser",
    "--config=jupyter_server_config.py",
];

#[derive(Debug, Error)]
pub enum HubEnvironmentError {
    #[error("Missing environment variable {0}")]
    MissingVariable(&'static str),

    #[error("Malformed environment variable {name}: {source}")]
    MalformedVariable {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {name}: {source}")]
    Encode {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("No task definition provisioned for user {0}")]
    UnknownUser(String),
}

/// Resources created by the external provisioning layer that the hub needs to know about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedOutputs {
    pub oauth_client_id: String,
    pub oauth_client_secret: String,
    /// Prefix of the identity pool's hosted login domain
    pub user_pool_domain: String,
    pub cluster_name: String,
    pub task_role_arn: String,
    #[serde(default)]
    pub security_group_ids: Vec<String>,
    #[serde(default)]
    pub subnet_ids: Vec<String>,
    pub file_system_id: String,
}

impl ProvisionedOutputs {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let outputs = serde_yaml::from_str(&content)?;
        Ok(outputs)
    }
}

/// `https://<domain>.auth.<region>.amazoncognito.com/oauth2/<endpoint>`
fn oauth_endpoint(user_pool_domain: &str, region: &str, endpoint: &str) -> String {
    format!(
        "https://{}.auth.{}.amazoncognito.com/oauth2/{}",
        user_pool_domain, region, endpoint
    )
}

fn encode<T: Serialize>(name: &'static str, value: &T) -> Result<String, HubEnvironmentError> {
    serde_json::to_string(value).map_err(|source| HubEnvironmentError::Encode { name, source })
}

fn decode<T: DeserializeOwned>(name: &'static str, raw: &str) -> Result<T, HubEnvironmentError> {
    serde_json::from_str(raw).map_err(|source| HubEnvironmentError::MalformedVariable { name, source })
}

/// Environment of the hub container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HubEnvironment {
    vars: BTreeMap<String, String>,
}

impl HubEnvironment {
    pub fn build(
        config: &HubConfigManifest,
        roster: &Roster,
        routing: &TaskDefinitionRouting,
        outputs: &ProvisionedOutputs,
    ) -> Result<Self, HubEnvironmentError> {
        let spec = &config.spec;
        let region = &spec.deployment.region;

        let admins: BTreeSet<&str> = roster.admins().map(|u| u.raw_handle.as_str()).collect();
        let allowed: BTreeSet<&str> = roster.users().map(|u| u.raw_handle.as_str()).collect();

        let mut env = BTreeMap::new();
        let mut set = |name: &str, value: String| {
            env.insert(name.to_string(), value);
        };

        set(vars::ADMIN_USERS, encode(vars::ADMIN_USERS, &admins)?);
        set(vars::ALLOWED_USERS, encode(vars::ALLOWED_USERS, &allowed)?);
        set(
            vars::OAUTH_CALLBACK_URL,
            format!("{}/hub/oauth_callback", config.hub_url()),
        );
        set(vars::OAUTH_CLIENT_ID, outputs.oauth_client_id.clone());
        set(vars::OAUTH_CLIENT_SECRET, outputs.oauth_client_secret.clone());
        set(
            vars::OAUTH_LOGIN_SERVICE_NAME,
            spec.identity.oauth_login_service_name.clone(),
        );
        set(
            vars::OAUTH_LOGIN_USERNAME_KEY,
            spec.identity.oauth_login_username_key.as_str().to_string(),
        );
        set(
            vars::OAUTH_AUTHORIZE_URL,
            oauth_endpoint(&outputs.user_pool_domain, region, "authorize"),
        );
        set(
            vars::OAUTH_TOKEN_URL,
            oauth_endpoint(&outputs.user_pool_domain, region, "token"),
        );
        set(
            vars::OAUTH_USERDATA_URL,
            oauth_endpoint(&outputs.user_pool_domain, region, "userInfo"),
        );
        set(vars::OAUTH_SCOPE, spec.identity.oauth_scope.join(","));
        set(
            vars::HUB_CONNECT_IP,
            format!("{}Container", spec.deployment.base_name),
        );
        set(vars::SPAWNER_REGION, region.clone());
        set(vars::SPAWNER_ECS_HOST, format!("ecs.{}.amazonaws.com", region));
        set(vars::SPAWNER_CLUSTER, outputs.cluster_name.clone());
        set(
            vars::SPAWNER_TASK_DEFINITIONS,
            encode(vars::SPAWNER_TASK_DEFINITIONS, routing)?,
        );
        set(vars::SPAWNER_TASK_ROLE_ARN, outputs.task_role_arn.clone());
        set(
            vars::SPAWNER_SECURITY_GROUPS,
            encode(vars::SPAWNER_SECURITY_GROUPS, &outputs.security_group_ids)?,
        );
        set(
            vars::SPAWNER_SUBNETS,
            encode(vars::SPAWNER_SUBNETS, &outputs.subnet_ids)?,
        );
        set(
            vars::SPAWNER_CONTAINER_NAME,
            SINGLE_USER_CONTAINER_NAME.to_string(),
        );
        set(vars::EFS_ID, outputs.file_system_id.clone());

        debug!(variables = env.len(), "Built hub environment");
        Ok(Self { vars: env })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// `KEY="value"` lines, loadable as a `.env` file
    pub fn to_dotenv(&self) -> String {
        self.vars
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"\n", k, escape_dotenv(v)))
            .collect()
    }
}

/// Escape a value for a double-quoted `.env` entry; `$` is escaped so it is never substituted
fn escape_dotenv(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ============================================================================
// Hub side
// ============================================================================

/// Settings the hub reads from its environment at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubRuntimeSettings {
    pub admin_users: BTreeSet<String>,
    pub allowed_users: BTreeSet<String>,
    pub oauth_callback_url: String,
    pub oauth_client_id: String,
    pub oauth_client_secret: String,
    pub oauth_login_service_name: String,
    pub oauth_login_username_key: String,
    pub oauth_authorize_url: String,
    pub oauth_token_url: String,
    pub oauth_userdata_url: String,
    pub oauth_scope: Vec<String>,
    /// Host name single-user servers use to reach the hub
    pub hub_connect_ip: String,
    pub region: String,
    pub ecs_host: String,
    pub cluster: String,
    pub task_definitions: TaskDefinitionRouting,
    pub task_role_arn: String,
    pub security_groups: Vec<String>,
    pub subnets: Vec<String>,
    pub container_name: String,
    pub efs_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTaskRequest {
    pub cluster: String,
    pub task_definition: String,
    pub overrides: TaskOverrides,
    pub count: u32,
    pub launch_type: String,
    pub network_configuration: NetworkConfiguration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOverrides {
    pub task_role_arn: String,
    pub container_overrides: Vec<ContainerOverride>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerOverride {
    pub name: String,
    pub command: Vec<String>,
    pub environment: Vec<EnvironmentEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentEntry {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfiguration {
    pub awsvpc_configuration: AwsVpcConfiguration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsVpcConfiguration {
    pub assign_public_ip: String,
    pub security_groups: Vec<String>,
    pub subnets: Vec<String>,
}

impl HubRuntimeSettings {
    /// Parse settings from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HubEnvironmentError> {
        let require = |name: &'static str| lookup(name).ok_or(HubEnvironmentError::MissingVariable(name));

        let oauth_scope = require(vars::OAUTH_SCOPE)?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            admin_users: decode(vars::ADMIN_USERS, &require(vars::ADMIN_USERS)?)?,
            allowed_users: decode(vars::ALLOWED_USERS, &require(vars::ALLOWED_USERS)?)?,
            oauth_callback_url: require(vars::OAUTH_CALLBACK_URL)?,
            oauth_client_id: require(vars::OAUTH_CLIENT_ID)?,
            oauth_client_secret: require(vars::OAUTH_CLIENT_SECRET)?,
            oauth_login_service_name: require(vars::OAUTH_LOGIN_SERVICE_NAME)?,
            oauth_login_username_key: require(vars::OAUTH_LOGIN_USERNAME_KEY)?,
            oauth_authorize_url: require(vars::OAUTH_AUTHORIZE_URL)?,
            oauth_token_url: require(vars::OAUTH_TOKEN_URL)?,
            oauth_userdata_url: require(vars::OAUTH_USERDATA_URL)?,
            oauth_scope,
            hub_connect_ip: require(vars::HUB_CONNECT_IP)?,
            region: require(vars::SPAWNER_REGION)?,
            ecs_host: require(vars::SPAWNER_ECS_HOST)?,
            cluster: require(vars::SPAWNER_CLUSTER)?,
            task_definitions: decode(
                vars::SPAWNER_TASK_DEFINITIONS,
                &require(vars::SPAWNER_TASK_DEFINITIONS)?,
            )?,
            task_role_arn: require(vars::SPAWNER_TASK_ROLE_ARN)?,
            security_groups: decode(
                vars::SPAWNER_SECURITY_GROUPS,
                &require(vars::SPAWNER_SECURITY_GROUPS)?,
            )?,
            subnets: decode(vars::SPAWNER_SUBNETS, &require(vars::SPAWNER_SUBNETS)?)?,
            container_name: require(vars::SPAWNER_CONTAINER_NAME)?,
            efs_id: require(vars::EFS_ID)?,
        })
    }

    /// Encode the settings back into the variables they were read from
    pub fn to_env_map(&self) -> Result<BTreeMap<String, String>, HubEnvironmentError> {
        let entries = [
            (vars::ADMIN_USERS, encode(vars::ADMIN_USERS, &self.admin_users)?),
            (vars::ALLOWED_USERS, encode(vars::ALLOWED_USERS, &self.allowed_users)?),
            (vars::OAUTH_CALLBACK_URL, self.oauth_callback_url.clone()),
            (vars::OAUTH_CLIENT_ID, self.oauth_client_id.clone()),
            (vars::OAUTH_CLIENT_SECRET, self.oauth_client_secret.clone()),
            (vars::OAUTH_LOGIN_SERVICE_NAME, self.oauth_login_service_name.clone()),
            (vars::OAUTH_LOGIN_USERNAME_KEY, self.oauth_login_username_key.clone()),
            (vars::OAUTH_AUTHORIZE_URL, self.oauth_authorize_url.clone()),
            (vars::OAUTH_TOKEN_URL, self.oauth_token_url.clone()),
            (vars::OAUTH_USERDATA_URL, self.oauth_userdata_url.clone()),
            (vars::OAUTH_SCOPE, self.oauth_scope.join(",")),
            (vars::HUB_CONNECT_IP, self.hub_connect_ip.clone()),
            (vars::SPAWNER_REGION, self.region.clone()),
            (vars::SPAWNER_ECS_HOST, self.ecs_host.clone()),
            (vars::SPAWNER_CLUSTER, self.cluster.clone()),
            (
                vars::SPAWNER_TASK_DEFINITIONS,
                encode(vars::SPAWNER_TASK_DEFINITIONS, &self.task_definitions)?,
            ),
            (vars::SPAWNER_TASK_ROLE_ARN, self.task_role_arn.clone()),
            (
                vars::SPAWNER_SECURITY_GROUPS,
                encode(vars::SPAWNER_SECURITY_GROUPS, &self.security_groups)?,
            ),
            (vars::SPAWNER_SUBNETS, encode(vars::SPAWNER_SUBNETS, &self.subnets)?),
            (vars::SPAWNER_CONTAINER_NAME, self.container_name.clone()),
            (vars::EFS_ID, self.efs_id.clone()),
        ];
        Ok(entries
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect())
    }

    pub fn from_env_map(env: &BTreeMap<String, String>) -> Result<Self, HubEnvironmentError> {
        Self::from_lookup(|name| env.get(name).cloned())
    }

    pub fn from_process_env() -> Result<Self, HubEnvironmentError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn is_admin(&self, user: &str) -> bool {
        self.admin_users.contains(user)
    }

    /// Task definition provisioned for an authenticated user
    pub fn task_definition_for(&self, user: &str) -> Result<&str, HubEnvironmentError> {
        self.task_definitions
            .get(user)
            .ok_or_else(|| HubEnvironmentError::UnknownUser(user.to_string()))
    }

    /// Arguments for starting `user`'s notebook task.
    ///
    /// `spawner_env` is forwarded to the notebook container without `PATH`,
    /// which must come from the image.
    pub fn run_task_request(
        &self,
        user: &str,
        spawner_env: &BTreeMap<String, String>,
    ) -> Result<RunTaskRequest, HubEnvironmentError> {
        let task_definition = self.task_definition_for(user)?.to_string();

        let environment = spawner_env
            .iter()
            .filter(|(name, _)| name.as_str() != "PATH")
            .map(|(name, value)| EnvironmentEntry {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();

        Ok(RunTaskRequest {
            cluster: self.cluster.clone(),
            task_definition,
            overrides: TaskOverrides {
                task_role_arn: self.task_role_arn.clone(),
                container_overrides: vec![ContainerOverride {
                    name: self.container_name.clone(),
                    command: SINGLE_USER_COMMAND.iter().map(|s| s.to_string()).collect(),
                    environment,
                }],
            },
            count: 1,
            launch_type: "FARGATE".to_string(),
            network_configuration: NetworkConfiguration {
                awsvpc_configuration: AwsVpcConfiguration {
                    assign_public_ip: "DISABLED".to_string(),
                    security_groups: self.security_groups.clone(),
                    subnets: self.subnets.clone(),
                },
            },
        })
    }
}
