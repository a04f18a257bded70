// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Hub Configuration Types
//
// Defines the configuration schema for a Pluto hub deployment, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Deployment naming (base name, DNS, certificate, region)
// - Identity pool and OAuth login settings
// - Hub and single-user container images
// - Shared storage layout and roster file locations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::access_policy::AccessPolicy;
use crate::domain::roster::RosterSource;
use crate::domain::user::DEFAULT_INTERNAL_DOMAIN_SUFFIX;
use crate::domain::volume::DEFAULT_REFERENCE_PATH;

pub const API_VERSION: &str = "pluto-hub/v1";
pub const KIND: &str = "HubConfig";

/// Top-level Kubernetes-style hub configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfigManifest {
    /// API version (must be "pluto-hub/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "HubConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: HubConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Hub configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubConfigSpec {
    pub deployment: DeploymentConfig,

    pub identity: IdentityConfig,

    pub hub: HubImageConfig,

    pub single_user: SingleUserImageConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub roster: RosterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Prefix for every resource name (e.g. "Pluto")
    pub base_name: String,

    /// Text placed after "pluto-" in the host name
    pub domain_prefix: String,

    /// Name of the hosted DNS zone (e.g. "example.org")
    pub hosted_zone_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosted_zone_id: Option<String>,

    /// ARN of the managed certificate for the host name
    pub certificate_arn: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            base_name: String::new(),
            domain_prefix: String::new(),
            hosted_zone_name: String::new(),
            hosted_zone_id: None,
            certificate_arn: String::new(),
            region: default_region(),
            account: None,
        }
    }
}

/// Claim the hub uses as the username after an OAuth login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsernameKey {
    PreferredUsername,
    Email,
}

impl UsernameKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreferredUsername => "preferred_username",
            Self::Email => "email",
        }
    }
}

impl Default for UsernameKey {
    fn default() -> Self {
        Self::PreferredUsername
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// ID of the (empty) identity user pool
    pub cognito_user_pool_id: String,

    /// Label of the login button
    #[serde(default = "default_login_service_name")]
    pub oauth_login_service_name: String,

    #[serde(default)]
    pub oauth_login_username_key: UsernameKey,

    #[serde(default = "default_oauth_scope")]
    pub oauth_scope: Vec<String>,

    /// Temporary password for external users (supports "env:VAR_NAME")
    #[serde(default)]
    pub temp_password: String,

    /// Users whose handle ends with this suffix sign in through the organization's provider
    #[serde(default = "default_internal_domain_suffix")]
    pub internal_domain_suffix: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            cognito_user_pool_id: String::new(),
            oauth_login_service_name: default_login_service_name(),
            oauth_login_username_key: UsernameKey::default(),
            oauth_scope: default_oauth_scope(),
            temp_password: String::new(),
            internal_domain_suffix: default_internal_domain_suffix(),
        }
    }
}

impl IdentityConfig {
    /// Resolve the temporary password, reading it from the environment when written as "env:VAR_NAME"
    pub fn resolve_temp_password(&self) -> anyhow::Result<String> {
        match self.temp_password.strip_prefix("env:") {
            Some(var) => std::env::var(var)
                .map_err(|_| anyhow::anyhow!("Environment variable '{}' for temp_password is not set", var)),
            None => Ok(self.temp_password.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubImageConfig {
    pub image_repository_arn: String,

    #[serde(default = "default_image_tag")]
    pub image_tag: String,

    /// Desired number of hub service containers
    #[serde(default = "default_num_containers")]
    pub num_containers: u32,
}

impl Default for HubImageConfig {
    fn default() -> Self {
        Self {
            image_repository_arn: String::new(),
            image_tag: default_image_tag(),
            num_containers: default_num_containers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleUserImageConfig {
    pub image_repository_arn: String,

    #[serde(default = "default_image_tag")]
    pub image_tag: String,
}

impl Default for SingleUserImageConfig {
    fn default() -> Self {
        Self {
            image_repository_arn: String::new(),
            image_tag: default_image_tag(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Shared reference subtree; admins may write, everyone else reads
    #[serde(default = "default_reference_path")]
    pub reference_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            reference_path: default_reference_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default = "default_admins_path")]
    pub admins: PathBuf,

    #[serde(default = "default_allowed_users_path")]
    pub allowed_users: PathBuf,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            admins: default_admins_path(),
            allowed_users: default_allowed_users_path(),
        }
    }
}

impl RosterConfig {
    /// Roster sources in load order, relative paths resolved against `base_dir`
    pub fn sources(&self, base_dir: &Path) -> Vec<RosterSource> {
        vec![
            RosterSource::admins(base_dir.join(&self.admins)),
            RosterSource::allowed_users(base_dir.join(&self.allowed_users)),
        ]
    }
}

fn default_region() -> String {
    "eu-central-1".to_string()
}

fn default_login_service_name() -> String {
    "Cognito".to_string()
}

fn default_oauth_scope() -> Vec<String> {
    vec!["openid".to_string(), "email".to_string(), "profile".to_string()]
}

fn default_internal_domain_suffix() -> String {
    DEFAULT_INTERNAL_DOMAIN_SUFFIX.to_string()
}

fn default_image_tag() -> String {
    "latest".to_string()
}

fn default_num_containers() -> u32 {
    1
}

fn default_reference_path() -> PathBuf {
    PathBuf::from(DEFAULT_REFERENCE_PATH)
}

fn default_admins_path() -> PathBuf {
    PathBuf::from("hub_docker/admins")
}

fn default_allowed_users_path() -> PathBuf {
    PathBuf::from("hub_docker/allowed_users")
}

impl Default for HubConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "pluto-hub".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: HubConfigSpec::default(),
        }
    }
}

impl HubConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. PLUTO_CONFIG_PATH environment variable
    /// 2. ./pluto-config.yaml (working directory)
    /// 3. ~/.pluto/config.yaml (user home)
    /// 4. /etc/pluto/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PLUTO_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./pluto-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".pluto").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/pluto/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using empty defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(region) = lookup("CDK_DEFAULT_REGION") {
            tracing::info!("Environment override: CDK_DEFAULT_REGION={}", region);
            self.spec.deployment.region = region;
        }

        if let Some(account) = lookup("CDK_DEFAULT_ACCOUNT") {
            tracing::info!("Environment override: CDK_DEFAULT_ACCOUNT={}", account);
            self.spec.deployment.account = Some(account);
        }

        if let Some(val) = lookup("PLUTO_NUM_CONTAINERS") {
            match val.parse::<u32>() {
                Ok(n) => {
                    tracing::info!("Environment override: PLUTO_NUM_CONTAINERS={}", n);
                    self.spec.hub.num_containers = n;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for PLUTO_NUM_CONTAINERS: '{}'. Expected a positive integer. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Some(suffix) = lookup("PLUTO_INTERNAL_DOMAIN_SUFFIX") {
            tracing::info!("Environment override: PLUTO_INTERNAL_DOMAIN_SUFFIX={}", suffix);
            self.spec.identity.internal_domain_suffix = suffix;
        }
    }

    /// Host name the hub is served on: `pluto-<domain_prefix>.<hosted_zone_name>`
    pub fn domain_name(&self) -> String {
        format!(
            "pluto-{}.{}",
            self.spec.deployment.domain_prefix, self.spec.deployment.hosted_zone_name
        )
    }

    pub fn hub_url(&self) -> String {
        format!("https://{}", self.domain_name())
    }

    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::new(self.spec.storage.reference_path.clone())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let deployment = &self.spec.deployment;
        for (field, value) in [
            ("spec.deployment.base_name", &deployment.base_name),
            ("spec.deployment.domain_prefix", &deployment.domain_prefix),
            ("spec.deployment.hosted_zone_name", &deployment.hosted_zone_name),
            ("spec.deployment.certificate_arn", &deployment.certificate_arn),
            ("spec.deployment.region", &deployment.region),
            ("spec.identity.cognito_user_pool_id", &self.spec.identity.cognito_user_pool_id),
            ("spec.identity.internal_domain_suffix", &self.spec.identity.internal_domain_suffix),
            ("spec.hub.image_repository_arn", &self.spec.hub.image_repository_arn),
            ("spec.single_user.image_repository_arn", &self.spec.single_user.image_repository_arn),
        ] {
            if value.is_empty() {
                anyhow::bail!("{} cannot be empty", field);
            }
        }

        if self.spec.identity.oauth_scope.is_empty() {
            anyhow::bail!("spec.identity.oauth_scope must contain at least one scope");
        }

        if self.spec.hub.num_containers == 0 {
            anyhow::bail!("spec.hub.num_containers must be at least 1");
        }

        if !self.spec.storage.reference_path.is_absolute() {
            anyhow::bail!(
                "spec.storage.reference_path must be absolute, got {:?}",
                self.spec.storage.reference_path
            );
        }

        Ok(())
    }
}
