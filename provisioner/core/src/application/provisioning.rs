// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provisioning Application Service
//!
//! Turns isolation descriptors into concrete requests for the external
//! provisioning layer and submits them:
//! - Domain layer: IsolationDescriptor, SharedVolume, VolumeMount
//! - Backend seam: `ProvisioningBackend` (cloud resource provider, or the
//!   in-memory recorder for dry runs)
//! - Output: `TaskDefinitionRouting`, consumed by the hub environment builder
//!
//! One shared reference access point is created first; every user's access
//! point, task definition and (for federated users) identity account are
//! independent and submitted concurrently. The hub's own task definition and
//! load-balanced service are deployed last, once the hub environment (which
//! embeds the routing table) is known.

use crate::application::hub_environment::HubEnvironment;
use crate::domain::access_policy::IsolationDescriptor;
use crate::domain::hub_config::HubConfigManifest;
use crate::domain::volume::{
    AccessMode, PosixOwnership, SharedVolume, VolumeMount, HUB_HOME_DIR, REFERENCE_DIR, WORK_DIR,
};
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub const SINGLE_USER_CONTAINER_NAME: &str = "SingleUserContainer";
pub const SINGLE_USER_CPU: u32 = 512;
pub const SINGLE_USER_MEMORY_MIB: u32 = 4096;
pub const NOTEBOOK_PORT: u16 = 8888;
pub const REFERENCE_ACCESS_POINT: &str = "ReferenceAccessPt";

pub const HUB_CPU: u32 = 512;
pub const HUB_MEMORY_MIB: u32 = 1024;
pub const HUB_PORT: u16 = 8000;
pub const HUB_HEALTH_CHECK_PATH: &str = "/hub";
pub const HUB_HEALTHY_HTTP_CODES: &str = "200-302";
pub const HTTPS_PORT: u16 = 443;

// ============================================================================
// Requests
// ============================================================================

/// Isolated, permission-scoped entry point into the shared file system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPointRequest {
    pub logical_id: String,
    pub path: PathBuf,
    /// Identity enforced for every client and owner of the created root directory
    pub ownership: PosixOwnership,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerImage {
    pub repository_arn: String,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: ContainerImage,
    pub port: u16,
    pub privileged: bool,
    pub log_stream_prefix: String,
    pub mounts: Vec<VolumeMount>,
}

/// One user's notebook task definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinitionRequest {
    pub logical_id: String,
    /// Raw handle of the user this task definition is routed to
    pub owner: String,
    pub cpu: u32,
    pub memory_mib: u32,
    pub container: ContainerSpec,
    pub volumes: Vec<SharedVolume>,
}

impl TaskDefinitionRequest {
    /// Replace logical access point ids with the identifiers returned by the backend
    pub fn bind_access_points(&self, ids: &HashMap<String, String>) -> Result<Self, ProvisioningError> {
        let mut bound = self.clone();
        for volume in &mut bound.volumes {
            let Some(logical_id) = &volume.access_point else {
                continue;
            };
            let id = ids
                .get(logical_id)
                .ok_or_else(|| ProvisioningError::UnboundAccessPoint {
                    task_definition: self.logical_id.clone(),
                    access_point: logical_id.clone(),
                })?;
            volume.access_point = Some(id.clone());
        }
        Ok(bound)
    }
}

/// Account in the hub's identity pool for a federated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityAccountRequest {
    pub user_pool_id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub temporary_password: String,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubContainerSpec {
    pub name: String,
    pub image: ContainerImage,
    /// Container and host port, TCP
    pub port: u16,
    pub privileged: bool,
    pub log_stream_prefix: String,
    pub mounts: Vec<VolumeMount>,
    /// Hub runtime environment, bound at deploy time
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

/// The hub's own task definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubTaskDefinitionRequest {
    pub logical_id: String,
    pub cpu: u32,
    pub memory_mib: u32,
    pub container: HubContainerSpec,
    pub volumes: Vec<SharedVolume>,
}

impl HubTaskDefinitionRequest {
    pub fn with_environment(&self, environment: &HubEnvironment) -> Self {
        let mut bound = self.clone();
        bound.container.environment = environment.as_map().clone();
        bound
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub path: String,
    pub healthy_http_codes: String,
}

/// HTTPS listener on the load balancer, forwarding to the hub service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpsListener {
    pub logical_id: String,
    pub port: u16,
    pub certificate_arn: String,
}

/// Load-balanced service running the hub task definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubServiceRequest {
    pub logical_id: String,
    /// Task definition identifier, bound at deploy time
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub task_definition: String,
    pub desired_count: u32,
    pub health_check: HealthCheck,
    pub listener: HttpsListener,
}

/// Alias record pointing the hub's host name at the load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecordRequest {
    pub logical_id: String,
    pub hosted_zone_id: String,
    pub zone_name: String,
    pub record_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubDeployment {
    pub task_definition: HubTaskDefinitionRequest,
    pub service: HubServiceRequest,
    /// Only when the hosted zone id is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_record: Option<DnsRecordRequest>,
}

impl HubDeployment {
    pub fn from_config(config: &HubConfigManifest) -> Self {
        let deployment = &config.spec.deployment;
        let base_name = &deployment.base_name;
        let volume = SharedVolume::hub();

        let task_definition = HubTaskDefinitionRequest {
            logical_id: format!("{}TaskDefinition", base_name),
            cpu: HUB_CPU,
            memory_mib: HUB_MEMORY_MIB,
            container: HubContainerSpec {
                name: format!("{}Container", base_name),
                image: ContainerImage {
                    repository_arn: config.spec.hub.image_repository_arn.clone(),
                    tag: config.spec.hub.image_tag.clone(),
                },
                port: HUB_PORT,
                privileged: false,
                log_stream_prefix: format!("{}Hub-", base_name),
                mounts: vec![VolumeMount::new(volume.name.clone(), HUB_HOME_DIR, AccessMode::ReadWrite)],
                environment: BTreeMap::new(),
            },
            volumes: vec![volume],
        };

        let service = HubServiceRequest {
            logical_id: format!("{}HubService", base_name),
            task_definition: String::new(),
            desired_count: config.spec.hub.num_containers,
            health_check: HealthCheck {
                path: HUB_HEALTH_CHECK_PATH.to_string(),
                healthy_http_codes: HUB_HEALTHY_HTTP_CODES.to_string(),
            },
            listener: HttpsListener {
                logical_id: format!("{}HubServiceListener", base_name),
                port: HTTPS_PORT,
                certificate_arn: deployment.certificate_arn.clone(),
            },
        };

        let dns_record = deployment.hosted_zone_id.as_ref().map(|zone_id| DnsRecordRequest {
            logical_id: format!("{}ELBRecord", base_name),
            hosted_zone_id: zone_id.clone(),
            zone_name: deployment.hosted_zone_name.clone(),
            record_name: format!("pluto-{}", deployment.domain_prefix),
        });

        Self {
            task_definition,
            service,
            dns_record,
        }
    }
}

/// Everything provisioned for a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProvisioning {
    pub handle: String,
    pub access_point: AccessPointRequest,
    pub task_definition: TaskDefinitionRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_account: Option<IdentityAccountRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningPlan {
    pub reference_access_point: AccessPointRequest,
    pub users: Vec<UserProvisioning>,
    pub hub: HubDeployment,
}

impl ProvisioningPlan {
    /// Build the plan for every descriptor, in descriptor order.
    pub fn build(
        config: &HubConfigManifest,
        descriptors: &BTreeMap<String, IsolationDescriptor>,
        temporary_password: &str,
    ) -> Self {
        let reference_path = config.spec.storage.reference_path.clone();
        let users = descriptors
            .values()
            .map(|descriptor| plan_user(config, descriptor, temporary_password))
            .collect();

        Self {
            reference_access_point: AccessPointRequest {
                logical_id: REFERENCE_ACCESS_POINT.to_string(),
                path: reference_path,
                ownership: PosixOwnership::default(),
            },
            users,
            hub: HubDeployment::from_config(config),
        }
    }

    /// Build the plan, resolving the temporary password only when a federated user needs it.
    pub fn from_config(
        config: &HubConfigManifest,
        descriptors: &BTreeMap<String, IsolationDescriptor>,
    ) -> anyhow::Result<Self> {
        let needs_password = descriptors
            .values()
            .any(|d| d.identity_provider_class.requires_account());
        let password = if needs_password {
            config.spec.identity.resolve_temp_password()?
        } else {
            String::new()
        };
        Ok(Self::build(config, descriptors, &password))
    }

    pub fn access_point_count(&self) -> usize {
        self.users.len() + 1
    }

    pub fn identity_accounts(&self) -> impl Iterator<Item = &IdentityAccountRequest> {
        self.users.iter().filter_map(|u| u.identity_account.as_ref())
    }
}

fn plan_user(
    config: &HubConfigManifest,
    descriptor: &IsolationDescriptor,
    temporary_password: &str,
) -> UserProvisioning {
    let user = &descriptor.user;
    let base_name = &config.spec.deployment.base_name;
    let access_point_id = format!("{}AccessPt", user.sanitized_handle);

    let private_volume = SharedVolume::private(&user.sanitized_handle, access_point_id.clone());
    let reference_volume = SharedVolume::reference(REFERENCE_ACCESS_POINT);

    let mounts = vec![
        VolumeMount::new(private_volume.name.clone(), WORK_DIR, AccessMode::ReadWrite),
        VolumeMount::new(reference_volume.name.clone(), REFERENCE_DIR, descriptor.reference_access),
    ];

    let task_definition = TaskDefinitionRequest {
        logical_id: format!("{}TaskDef", user.sanitized_handle),
        owner: user.raw_handle.clone(),
        cpu: SINGLE_USER_CPU,
        memory_mib: SINGLE_USER_MEMORY_MIB,
        container: ContainerSpec {
            name: SINGLE_USER_CONTAINER_NAME.to_string(),
            image: ContainerImage {
                repository_arn: config.spec.single_user.image_repository_arn.clone(),
                tag: config.spec.single_user.image_tag.clone(),
            },
            port: NOTEBOOK_PORT,
            privileged: false,
            log_stream_prefix: format!("{}SingleUser-", base_name),
            mounts,
        },
        volumes: vec![private_volume, reference_volume],
    };

    let identity_account = descriptor
        .identity_provider_class
        .requires_account()
        .then(|| IdentityAccountRequest {
            user_pool_id: config.spec.identity.cognito_user_pool_id.clone(),
            username: user.raw_handle.clone(),
            temporary_password: temporary_password.to_string(),
            attributes: BTreeMap::from([("preferred_username".to_string(), user.raw_handle.clone())]),
        });

    UserProvisioning {
        handle: user.raw_handle.clone(),
        access_point: AccessPointRequest {
            logical_id: access_point_id,
            path: descriptor.private_path.clone(),
            ownership: descriptor.private_ownership.clone(),
        },
        task_definition,
        identity_account,
    }
}

// ============================================================================
// Backend seam
// ============================================================================

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("Provisioning backend failed for {resource}: {source}")]
    Backend {
        resource: String,
        #[source]
        source: BackendError,
    },

    #[error("Task definition {task_definition} references unknown access point {access_point}")]
    UnboundAccessPoint {
        task_definition: String,
        access_point: String,
    },
}

/// External provisioning layer
#[async_trait]
pub trait ProvisioningBackend: Send + Sync {
    /// Create an access point, returning its provider identifier
    async fn create_access_point(&self, request: &AccessPointRequest) -> Result<String, BackendError>;

    /// Register a task definition whose volumes carry provider access point ids,
    /// returning the task definition identifier
    async fn register_task_definition(&self, request: &TaskDefinitionRequest) -> Result<String, BackendError>;

    async fn create_identity_account(&self, request: &IdentityAccountRequest) -> Result<(), BackendError>;

    /// Register the hub task definition, returning its identifier
    async fn register_hub_task_definition(&self, request: &HubTaskDefinitionRequest) -> Result<String, BackendError>;

    /// Create the load-balanced hub service and its listener, returning the service identifier
    async fn create_hub_service(&self, request: &HubServiceRequest) -> Result<String, BackendError>;

    async fn create_dns_record(&self, request: &DnsRecordRequest) -> Result<(), BackendError>;
}

/// Raw handle -> task definition identifier, used by the hub to pick a user's task at spawn time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskDefinitionRouting(BTreeMap<String, String>);

impl TaskDefinitionRouting {
    pub fn get(&self, raw_handle: &str) -> Option<&str> {
        self.0.get(raw_handle).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl FromIterator<(String, String)> for TaskDefinitionRouting {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// Service
// ============================================================================

pub struct ProvisioningService {
    backend: Arc<dyn ProvisioningBackend>,
}

impl ProvisioningService {
    pub fn new(backend: Arc<dyn ProvisioningBackend>) -> Self {
        Self { backend }
    }

    /// Submit the whole plan and return the routing table
    pub async fn apply(&self, plan: &ProvisioningPlan) -> Result<TaskDefinitionRouting, ProvisioningError> {
        info!(
            users = plan.users.len(),
            identity_accounts = plan.identity_accounts().count(),
            "Applying provisioning plan"
        );

        let reference = &plan.reference_access_point;
        let reference_id = self.create_access_point(reference).await?;

        let routes = try_join_all(
            plan.users
                .iter()
                .map(|user| self.provision_user(user, &reference.logical_id, &reference_id)),
        )
        .await?;

        info!(task_definitions = routes.len(), "Provisioning plan applied");
        Ok(routes.into_iter().collect())
    }

    /// Deploy the hub with its runtime environment, returning the service identifier
    pub async fn deploy_hub(
        &self,
        hub: &HubDeployment,
        environment: &HubEnvironment,
    ) -> Result<String, ProvisioningError> {
        let request = hub.task_definition.with_environment(environment);
        let task_definition = self
            .backend
            .register_hub_task_definition(&request)
            .await
            .map_err(|source| ProvisioningError::Backend {
                resource: request.logical_id.clone(),
                source,
            })?;
        metrics::counter!("pluto_provisioning_requests_total", "kind" => "hub_task_definition").increment(1);
        debug!(task_definition = %task_definition, variables = environment.len(), "Registered hub task definition");

        let mut service = hub.service.clone();
        service.task_definition = task_definition;
        let service_id = self
            .backend
            .create_hub_service(&service)
            .await
            .map_err(|source| ProvisioningError::Backend {
                resource: service.logical_id.clone(),
                source,
            })?;
        metrics::counter!("pluto_provisioning_requests_total", "kind" => "hub_service").increment(1);

        if let Some(record) = &hub.dns_record {
            self.backend
                .create_dns_record(record)
                .await
                .map_err(|source| ProvisioningError::Backend {
                    resource: record.logical_id.clone(),
                    source,
                })?;
            metrics::counter!("pluto_provisioning_requests_total", "kind" => "dns_record").increment(1);
        }

        info!(
            service = %service_id,
            desired_count = service.desired_count,
            "Hub service deployed"
        );
        Ok(service_id)
    }

    async fn provision_user(
        &self,
        user: &UserProvisioning,
        reference_logical_id: &str,
        reference_id: &str,
    ) -> Result<(String, String), ProvisioningError> {
        let access_point_id = self.create_access_point(&user.access_point).await?;

        let ids = HashMap::from([
            (user.access_point.logical_id.clone(), access_point_id),
            (reference_logical_id.to_string(), reference_id.to_string()),
        ]);
        let request = user.task_definition.bind_access_points(&ids)?;

        let task_definition = self
            .backend
            .register_task_definition(&request)
            .await
            .map_err(|source| ProvisioningError::Backend {
                resource: request.logical_id.clone(),
                source,
            })?;
        metrics::counter!("pluto_provisioning_requests_total", "kind" => "task_definition").increment(1);
        debug!(user = %user.handle, task_definition = %task_definition, "Registered task definition");

        if let Some(account) = &user.identity_account {
            self.backend
                .create_identity_account(account)
                .await
                .map_err(|source| ProvisioningError::Backend {
                    resource: format!("identity account {}", account.username),
                    source,
                })?;
            metrics::counter!("pluto_provisioning_requests_total", "kind" => "identity_account").increment(1);
            debug!(user = %user.handle, "Created identity account");
        }

        Ok((user.handle.clone(), task_definition))
    }

    async fn create_access_point(&self, request: &AccessPointRequest) -> Result<String, ProvisioningError> {
        let id = self
            .backend
            .create_access_point(request)
            .await
            .map_err(|source| ProvisioningError::Backend {
                resource: request.logical_id.clone(),
                source,
            })?;
        metrics::counter!("pluto_provisioning_requests_total", "kind" => "access_point").increment(1);
        debug!(access_point = %request.logical_id, path = %request.path.display(), id = %id, "Created access point");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access_policy::AccessPolicy;
    use crate::domain::roster::Roster;

    fn config() -> HubConfigManifest {
        let mut config = HubConfigManifest::default();
        config.spec.deployment.base_name = "Pluto".to_string();
        config.spec.identity.cognito_user_pool_id = "eu-central-1_pool".to_string();
        config.spec.single_user.image_repository_arn = "arn:aws:ecr:eu-central-1:1:repository/su".to_string();
        config
    }

    fn descriptors() -> BTreeMap<String, IsolationDescriptor> {
        let roster = Roster::from_handles(["alice@tudelft.nl"], ["bob@gmail.com"], "tudelft.nl");
        AccessPolicy::default().resolve(&roster)
    }

    #[test]
    fn test_plan_has_one_access_point_and_task_definition_per_user() {
        let plan = ProvisioningPlan::build(&config(), &descriptors(), "Temp-123");
        assert_eq!(plan.users.len(), 2);
        assert_eq!(plan.access_point_count(), 3);
        assert_eq!(plan.reference_access_point.path, PathBuf::from("/reference"));

        let alice = &plan.users[0];
        assert_eq!(alice.handle, "alice@tudelft.nl");
        assert_eq!(alice.access_point.logical_id, "alice_tudelft_nlAccessPt");
        assert_eq!(alice.access_point.path, PathBuf::from("/alice_tudelft_nl"));
        assert_eq!(alice.task_definition.logical_id, "alice_tudelft_nlTaskDef");
        assert_eq!(alice.task_definition.container.log_stream_prefix, "PlutoSingleUser-");
        assert_eq!(alice.task_definition.container.port, 8888);
    }

    #[test]
    fn test_mounts_follow_reference_access() {
        let plan = ProvisioningPlan::build(&config(), &descriptors(), "Temp-123");

        let mounts = |i: usize| plan.users[i].task_definition.container.mounts.clone();
        let alice = mounts(0);
        let bob = mounts(1);

        assert_eq!(alice[0].container_path, PathBuf::from(WORK_DIR));
        assert!(!alice[0].read_only());
        assert_eq!(alice[1].container_path, PathBuf::from(REFERENCE_DIR));
        assert!(!alice[1].read_only());

        assert!(!bob[0].read_only());
        assert!(bob[1].read_only());
        assert_eq!(bob[1].source_volume, "efs-reference-volume");
    }

    #[test]
    fn test_identity_accounts_only_for_federated_users() {
        let plan = ProvisioningPlan::build(&config(), &descriptors(), "Temp-123");
        let accounts: Vec<_> = plan.identity_accounts().collect();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].username, "bob@gmail.com");
        assert_eq!(accounts[0].temporary_password, "Temp-123");
        assert_eq!(accounts[0].attributes["preferred_username"], "bob@gmail.com");
        assert_eq!(accounts[0].user_pool_id, "eu-central-1_pool");
    }

    #[test]
    fn test_serialized_plan_omits_password() {
        let plan = ProvisioningPlan::build(&config(), &descriptors(), "Temp-123");
        let json = serde_json::to_string(&plan).unwrap();
        assert!(!json.contains("Temp-123"));
        assert!(json.contains("preferred_username"));
    }

    #[test]
    fn test_from_config_skips_password_without_federated_users() {
        let mut config = config();
        config.spec.identity.temp_password = "env:PLUTO_TEST_NEVER_SET".to_string();

        let roster = Roster::from_handles(["alice@tudelft.nl"], std::iter::empty::<&str>(), "tudelft.nl");
        let internal_only = AccessPolicy::default().resolve(&roster);
        assert!(ProvisioningPlan::from_config(&config, &internal_only).is_ok());

        assert!(ProvisioningPlan::from_config(&config, &descriptors()).is_err());
    }

    #[test]
    fn test_bind_access_points_rejects_unknown_ids() {
        let plan = ProvisioningPlan::build(&config(), &descriptors(), "");
        let request = &plan.users[0].task_definition;

        let err = request.bind_access_points(&HashMap::new()).unwrap_err();
        assert!(matches!(err, ProvisioningError::UnboundAccessPoint { .. }));

        let ids = HashMap::from([
            ("alice_tudelft_nlAccessPt".to_string(), "fsap-1".to_string()),
            (REFERENCE_ACCESS_POINT.to_string(), "fsap-ref".to_string()),
        ]);
        let bound = request.bind_access_points(&ids).unwrap();
        assert_eq!(bound.volumes[0].access_point.as_deref(), Some("fsap-1"));
        assert_eq!(bound.volumes[1].access_point.as_deref(), Some("fsap-ref"));
    }

    #[test]
    fn test_hub_deployment_from_config() {
        let mut config = config();
        config.spec.deployment.domain_prefix = "course".to_string();
        config.spec.deployment.hosted_zone_name = "example.org".to_string();
        config.spec.deployment.certificate_arn = "arn:aws:acm:eu-central-1:1:certificate/abc".to_string();
        config.spec.hub.image_repository_arn = "arn:aws:ecr:eu-central-1:1:repository/hub".to_string();
        config.spec.hub.num_containers = 2;

        let hub = HubDeployment::from_config(&config);

        let task_definition = &hub.task_definition;
        assert_eq!(task_definition.logical_id, "PlutoTaskDefinition");
        assert_eq!((task_definition.cpu, task_definition.memory_mib), (512, 1024));
        assert_eq!(task_definition.container.name, "PlutoContainer");
        assert_eq!(task_definition.container.port, 8000);
        assert_eq!(task_definition.container.log_stream_prefix, "PlutoHub-");
        assert_eq!(task_definition.container.image.tag, "latest");
        assert_eq!(task_definition.volumes, vec![SharedVolume::hub()]);
        assert_eq!(task_definition.container.mounts[0].container_path, PathBuf::from("/home"));
        assert!(!task_definition.container.mounts[0].read_only());

        assert_eq!(hub.service.desired_count, 2);
        assert_eq!(hub.service.health_check.path, "/hub");
        assert_eq!(hub.service.health_check.healthy_http_codes, "200-302");
        assert_eq!(hub.service.listener.port, 443);
        assert_eq!(hub.service.listener.certificate_arn, "arn:aws:acm:eu-central-1:1:certificate/abc");

        assert!(hub.dns_record.is_none());
        config.spec.deployment.hosted_zone_id = Some("Z123".to_string());
        let record = HubDeployment::from_config(&config).dns_record.unwrap();
        assert_eq!(record.record_name, "pluto-course");
        assert_eq!(record.zone_name, "example.org");
    }

    #[test]
    fn test_hub_plan_carries_no_environment() {
        let plan = ProvisioningPlan::build(&config(), &descriptors(), "Temp-123");
        assert!(plan.hub.task_definition.container.environment.is_empty());
        let json = serde_json::to_value(&plan).unwrap();
        assert!(json["hub"]["task_definition"]["container"].get("environment").is_none());
    }
}
