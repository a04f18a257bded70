// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod hub_environment;
pub mod provisioning;

pub use hub_environment::{HubEnvironment, HubEnvironmentError, HubRuntimeSettings, ProvisionedOutputs, RunTaskRequest};
pub use provisioning::{
    BackendError, ProvisioningBackend, ProvisioningError, ProvisioningPlan, ProvisioningService, TaskDefinitionRouting,
};
