// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provisioning service tests against the in-memory backend.

use pluto_hub_core::application::hub_environment::{vars, HubEnvironment, HubRuntimeSettings, ProvisionedOutputs};
use pluto_hub_core::application::provisioning::{
    BackendError, ProvisioningError, ProvisioningPlan, ProvisioningService, REFERENCE_ACCESS_POINT,
};
use pluto_hub_core::domain::hub_config::HubConfigManifest;
use pluto_hub_core::domain::roster::Roster;
use pluto_hub_core::infrastructure::InMemoryProvisioningBackend;
use std::collections::BTreeMap;
use std::sync::Arc;

fn config() -> HubConfigManifest {
    let mut config = HubConfigManifest::default();
    config.spec.deployment.base_name = "Pluto".to_string();
    config.spec.deployment.domain_prefix = "test".to_string();
    config.spec.deployment.hosted_zone_name = "example.org".to_string();
    config.spec.identity.cognito_user_pool_id = "eu-central-1_pool".to_string();
    config.spec.identity.temp_password = "Welcome-123".to_string();
    config.spec.deployment.certificate_arn = "arn:aws:acm:eu-central-1:123456789012:certificate/abc".to_string();
    config.spec.hub.num_containers = 2;
    config
}

fn plan(config: &HubConfigManifest) -> ProvisioningPlan {
    let roster = Roster::from_handles(
        ["alice@tudelft.nl"],
        ["bob@gmail.com", "carol@tudelft.nl"],
        &config.spec.identity.internal_domain_suffix,
    );
    let descriptors = config.access_policy().resolve(&roster);
    ProvisioningPlan::from_config(config, &descriptors).unwrap()
}

#[tokio::test]
async fn test_apply_routes_every_user_to_a_task_definition() {
    let config = config();
    let backend = InMemoryProvisioningBackend::new("eu-central-1", Some("123456789012".to_string()));
    let service = ProvisioningService::new(Arc::new(backend.clone()));

    let routing = service.apply(&plan(&config)).await.unwrap();

    assert_eq!(routing.len(), 3);
    assert_eq!(
        routing.get("alice@tudelft.nl"),
        Some("arn:aws:ecs:eu-central-1:123456789012:task-definition/alice_tudelft_nlTaskDef:1")
    );

    let access_points = backend.access_points().await;
    assert_eq!(access_points.len(), 4);
    assert_eq!(access_points[0].logical_id, REFERENCE_ACCESS_POINT);

    let accounts = backend.identity_accounts().await;
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].username, "bob@gmail.com");
    assert_eq!(accounts[0].temporary_password, "Welcome-123");
}

#[tokio::test]
async fn test_registered_task_definitions_carry_provider_access_point_ids() {
    let config = config();
    let backend = InMemoryProvisioningBackend::new("eu-central-1", None);
    let service = ProvisioningService::new(Arc::new(backend.clone()));
    service.apply(&plan(&config)).await.unwrap();

    let task_definitions = backend.task_definitions().await;
    assert_eq!(task_definitions.len(), 3);
    for task_definition in &task_definitions {
        assert!(task_definition
            .volumes
            .iter()
            .all(|v| v.access_point.as_deref().is_some_and(|id| id.starts_with("fsap-"))));
        assert_eq!(
            task_definition.volumes[1].access_point.as_deref(),
            Some("fsap-ReferenceAccessPt")
        );
    }
}

#[tokio::test]
async fn test_backend_failure_aborts_apply() {
    let config = config();
    let backend = InMemoryProvisioningBackend::new("eu-central-1", None).with_rejected("bob_gmail_comTaskDef");
    let service = ProvisioningService::new(Arc::new(backend));

    let err = service.apply(&plan(&config)).await.unwrap_err();
    match err {
        ProvisioningError::Backend { resource, source } => {
            assert_eq!(resource, "bob_gmail_comTaskDef");
            assert!(matches!(source, BackendError::Rejected(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_reference_failure_stops_before_users() {
    let config = config();
    let backend = InMemoryProvisioningBackend::new("eu-central-1", None).with_rejected(REFERENCE_ACCESS_POINT);
    let service = ProvisioningService::new(Arc::new(backend.clone()));

    assert!(service.apply(&plan(&config)).await.is_err());
    assert!(backend.task_definitions().await.is_empty());
}

#[tokio::test]
async fn test_hub_spawns_from_provisioned_routing() {
    let config = config();
    let backend = InMemoryProvisioningBackend::new("eu-central-1", None);
    let service = ProvisioningService::new(Arc::new(backend));
    let roster = Roster::from_handles(["alice@tudelft.nl"], ["bob@gmail.com"], "tudelft.nl");
    let descriptors = config.access_policy().resolve(&roster);
    let plan = ProvisioningPlan::from_config(&config, &descriptors).unwrap();
    let routing = service.apply(&plan).await.unwrap();

    let outputs = ProvisionedOutputs {
        cluster_name: "PlutoCluster".to_string(),
        subnet_ids: vec!["subnet-a".to_string()],
        ..ProvisionedOutputs::default()
    };
    let env = HubEnvironment::build(&config, &roster, &routing, &outputs).unwrap();
    assert_eq!(env.get(vars::ADMIN_USERS), Some(r#"["alice@tudelft.nl"]"#));

    let settings = HubRuntimeSettings::from_env_map(env.as_map()).unwrap();
    let request = settings.run_task_request("bob@gmail.com", &BTreeMap::new()).unwrap();
    assert_eq!(request.cluster, "PlutoCluster");
    assert!(request.task_definition.ends_with("task-definition/bob_gmail_comTaskDef:1"));
    assert!(settings.run_task_request("mallory@evil.com", &BTreeMap::new()).is_err());
}

#[tokio::test]
async fn test_deploy_hub_binds_environment_and_task_definition() {
    let mut config = config();
    config.spec.deployment.hosted_zone_id = Some("Z0123".to_string());
    let backend = InMemoryProvisioningBackend::new("eu-central-1", Some("123456789012".to_string()));
    let service = ProvisioningService::new(Arc::new(backend.clone()));

    let roster = Roster::from_handles(["alice@tudelft.nl"], ["bob@gmail.com"], "tudelft.nl");
    let descriptors = config.access_policy().resolve(&roster);
    let plan = ProvisioningPlan::from_config(&config, &descriptors).unwrap();
    let routing = service.apply(&plan).await.unwrap();
    let env = HubEnvironment::build(&config, &roster, &routing, &ProvisionedOutputs::default()).unwrap();

    let service_id = service.deploy_hub(&plan.hub, &env).await.unwrap();
    assert_eq!(service_id, "arn:aws:ecs:eu-central-1:123456789012:service/PlutoHubService");

    let hub_task_definitions = backend.hub_task_definitions().await;
    assert_eq!(hub_task_definitions.len(), 1);
    assert_eq!(&hub_task_definitions[0].container.environment, env.as_map());
    assert_eq!(hub_task_definitions[0].container.name, "PlutoContainer");

    let services = backend.hub_services().await;
    assert_eq!(services.len(), 1);
    assert_eq!(
        services[0].task_definition,
        "arn:aws:ecs:eu-central-1:123456789012:task-definition/PlutoTaskDefinition:1"
    );
    assert_eq!(services[0].desired_count, 2);
    assert_eq!(
        services[0].listener.certificate_arn,
        "arn:aws:acm:eu-central-1:123456789012:certificate/abc"
    );

    let records = backend.dns_records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_name, "pluto-test");
}

#[tokio::test]
async fn test_deploy_hub_failure_skips_service() {
    let config = config();
    let backend = InMemoryProvisioningBackend::new("eu-central-1", None).with_rejected("PlutoTaskDefinition");
    let service = ProvisioningService::new(Arc::new(backend.clone()));
    let plan = plan(&config);

    let err = service.deploy_hub(&plan.hub, &HubEnvironment::default()).await.unwrap_err();
    assert!(matches!(err, ProvisioningError::Backend { ref resource, .. } if resource == "PlutoTaskDefinition"));
    assert!(backend.hub_services().await.is_empty());
    assert!(backend.dns_records().await.is_empty());
}
