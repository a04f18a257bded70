// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::provisioning::{
    AccessPointRequest, BackendError, DnsRecordRequest, HubServiceRequest, HubTaskDefinitionRequest,
    IdentityAccountRequest, ProvisioningBackend, TaskDefinitionRequest,
};

const DEFAULT_ACCOUNT: &str = "000000000000";

#[derive(Debug, Default)]
struct Recorded {
    access_points: Vec<AccessPointRequest>,
    task_definitions: Vec<TaskDefinitionRequest>,
    identity_accounts: Vec<IdentityAccountRequest>,
    hub_task_definitions: Vec<HubTaskDefinitionRequest>,
    hub_services: Vec<HubServiceRequest>,
    dns_records: Vec<DnsRecordRequest>,
}

/// Records every request and answers with deterministic identifiers.
///
/// Used for dry runs (`pluto plan`, `pluto env`) and tests.
#[derive(Clone)]
pub struct InMemoryProvisioningBackend {
    region: String,
    account: String,
    rejected: HashSet<String>,
    recorded: Arc<RwLock<Recorded>>,
}

impl InMemoryProvisioningBackend {
    pub fn new(region: impl Into<String>, account: Option<String>) -> Self {
        Self {
            region: region.into(),
            account: account.unwrap_or_else(|| DEFAULT_ACCOUNT.to_string()),
            rejected: HashSet::new(),
            recorded: Arc::new(RwLock::new(Recorded::default())),
        }
    }

    /// Reject any request whose logical id (or identity account username) matches
    pub fn with_rejected(mut self, id: impl Into<String>) -> Self {
        self.rejected.insert(id.into());
        self
    }

    fn check(&self, id: &str) -> Result<(), BackendError> {
        if self.rejected.contains(id) {
            return Err(BackendError::Rejected(format!("{} rejected by in-memory backend", id)));
        }
        Ok(())
    }

    pub async fn access_points(&self) -> Vec<AccessPointRequest> {
        self.recorded.read().await.access_points.clone()
    }

    pub async fn task_definitions(&self) -> Vec<TaskDefinitionRequest> {
        self.recorded.read().await.task_definitions.clone()
    }

    pub async fn identity_accounts(&self) -> Vec<IdentityAccountRequest> {
        self.recorded.read().await.identity_accounts.clone()
    }

    pub async fn hub_task_definitions(&self) -> Vec<HubTaskDefinitionRequest> {
        self.recorded.read().await.hub_task_definitions.clone()
    }

    pub async fn hub_services(&self) -> Vec<HubServiceRequest> {
        self.recorded.read().await.hub_services.clone()
    }

    pub async fn dns_records(&self) -> Vec<DnsRecordRequest> {
        self.recorded.read().await.dns_records.clone()
    }

    fn task_definition_arn(&self, logical_id: &str) -> String {
        format!(
            "arn:aws:ecs:{}:{}:task-definition/{}:1",
            self.region, self.account, logical_id
        )
    }
}

#[async_trait]
impl ProvisioningBackend for InMemoryProvisioningBackend {
    async fn create_access_point(&self, request: &AccessPointRequest) -> Result<String, BackendError> {
        self.check(&request.logical_id)?;
        let mut guard = self.recorded.write().await;
        guard.access_points.push(request.clone());
        Ok(format!("fsap-{}", request.logical_id))
    }

    async fn register_task_definition(&self, request: &TaskDefinitionRequest) -> Result<String, BackendError> {
        self.check(&request.logical_id)?;
        let mut guard = self.recorded.write().await;
        guard.task_definitions.push(request.clone());
        Ok(self.task_definition_arn(&request.logical_id))
    }

    async fn create_identity_account(&self, request: &IdentityAccountRequest) -> Result<(), BackendError> {
        self.check(&request.username)?;
        let mut guard = self.recorded.write().await;
        guard.identity_accounts.push(request.clone());
        Ok(())
    }

    async fn register_hub_task_definition(&self, request: &HubTaskDefinitionRequest) -> Result<String, BackendError> {
        self.check(&request.logical_id)?;
        let mut guard = self.recorded.write().await;
        guard.hub_task_definitions.push(request.clone());
        Ok(self.task_definition_arn(&request.logical_id))
    }

    async fn create_hub_service(&self, request: &HubServiceRequest) -> Result<String, BackendError> {
        self.check(&request.logical_id)?;
        let mut guard = self.recorded.write().await;
        guard.hub_services.push(request.clone());
        Ok(format!(
            "arn:aws:ecs:{}:{}:service/{}",
            self.region, self.account, request.logical_id
        ))
    }

    async fn create_dns_record(&self, request: &DnsRecordRequest) -> Result<(), BackendError> {
        self.check(&request.logical_id)?;
        let mut guard = self.recorded.write().await;
        guard.dns_records.push(request.clone());
        Ok(())
    }
}
