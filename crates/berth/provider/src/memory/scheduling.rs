//! Simulated container-scheduling provider

use super::Journal;
use crate::api::SchedulingApi;
use async_trait::async_trait;
use berth_types::{
    ClusterSummary, ProviderError, ProviderResult, ServiceSpec, ServiceSummary, ServiceUpdate,
    TaskDefinitionRef, TaskDefinitionSpec,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchedulingOperation {
    RegisterTaskDefinition,
    CreateService,
    UpdateService,
    CreateCluster,
}

/// A call received by [`InMemorySchedulingApi`], with its full payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulingCall {
    RegisterTaskDefinition(TaskDefinitionSpec),
    CreateService(ServiceSpec),
    UpdateService(ServiceUpdate),
    CreateCluster(String),
}

/// In-memory scheduling provider.
///
/// Revisions are numbered per family starting at 1. Services are keyed by
/// cluster and name; creating one twice is rejected the way the real
/// provider rejects a non-idempotent create.
pub struct InMemorySchedulingApi {
    revisions: DashMap<String, u32>,
    services: DashMap<(String, String), ServiceSummary>,
    clusters: DashMap<String, ClusterSummary>,
    failures: DashMap<SchedulingOperation, VecDeque<ProviderError>>,
    journal: Journal<SchedulingCall>,
}

impl InMemorySchedulingApi {
    pub fn new() -> Self {
        Self {
            revisions: DashMap::new(),
            services: DashMap::new(),
            clusters: DashMap::new(),
            failures: DashMap::new(),
            journal: Journal::new(),
        }
    }

    /// Insert an already running service
    pub fn seed_service(&self, cluster: &str, service: &str, task_definition: &str) {
        self.services.insert(
            (cluster.to_string(), service.to_string()),
            ServiceSummary {
                service_name: service.to_string(),
                cluster: cluster.to_string(),
                task_definition: task_definition.to_string(),
                status: Some("ACTIVE".into()),
            },
        );
    }

    pub fn fail_next(&self, operation: SchedulingOperation, error: ProviderError) {
        self.failures.entry(operation).or_default().push_back(error);
    }

    pub fn calls(&self) -> Vec<SchedulingCall> {
        self.journal.snapshot()
    }

    /// Task definition the service currently runs
    pub fn service_task_definition(&self, cluster: &str, service: &str) -> Option<String> {
        self.services
            .get(&(cluster.to_string(), service.to_string()))
            .map(|s| s.task_definition.clone())
    }

    /// Latest registered revision of a family
    pub fn latest_revision(&self, family: &str) -> Option<u32> {
        self.revisions.get(family).map(|r| *r)
    }

    fn injected(&self, operation: SchedulingOperation) -> Option<ProviderError> {
        self.failures
            .get_mut(&operation)
            .and_then(|mut queue| queue.pop_front())
    }
}

impl Default for InMemorySchedulingApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchedulingApi for InMemorySchedulingApi {
    async fn register_task_definition(
        &self,
        spec: &TaskDefinitionSpec,
    ) -> ProviderResult<TaskDefinitionRef> {
        self.journal
            .record(SchedulingCall::RegisterTaskDefinition(spec.clone()));
        if let Some(err) = self.injected(SchedulingOperation::RegisterTaskDefinition) {
            return Err(err);
        }

        let mut revision = self.revisions.entry(spec.family.clone()).or_insert(0);
        *revision += 1;
        Ok(TaskDefinitionRef::new(spec.family.clone(), *revision))
    }

    async fn create_service(&self, spec: &ServiceSpec) -> ProviderResult<ServiceSummary> {
        self.journal.record(SchedulingCall::CreateService(spec.clone()));
        if let Some(err) = self.injected(SchedulingOperation::CreateService) {
            return Err(err);
        }

        let key = (spec.cluster.clone(), spec.service_name.clone());
        if self.services.contains_key(&key) {
            return Err(ProviderError::already_exists(
                "CreateService",
                "Creation of service was not idempotent.",
            )
            .with_code("InvalidParameterException"));
        }

        let summary = ServiceSummary {
            service_name: spec.service_name.clone(),
            cluster: spec.cluster.clone(),
            task_definition: spec.task_definition.clone(),
            status: Some("ACTIVE".into()),
        };
        self.services.insert(key, summary.clone());
        Ok(summary)
    }

    async fn update_service(&self, update: &ServiceUpdate) -> ProviderResult<ServiceSummary> {
        self.journal.record(SchedulingCall::UpdateService(update.clone()));
        if let Some(err) = self.injected(SchedulingOperation::UpdateService) {
            return Err(err);
        }

        let key = (update.cluster.clone(), update.service.clone());
        let mut service = self.services.get_mut(&key).ok_or_else(|| {
            ProviderError::not_found("UpdateService", "Service not found.")
                .with_code("ServiceNotFoundException")
        })?;
        service.task_definition = update.task_definition.clone();
        Ok(service.clone())
    }

    async fn create_cluster(&self, name: &str) -> ProviderResult<ClusterSummary> {
        self.journal
            .record(SchedulingCall::CreateCluster(name.to_string()));
        if let Some(err) = self.injected(SchedulingOperation::CreateCluster) {
            return Err(err);
        }

        let cluster = self
            .clusters
            .entry(name.to_string())
            .or_insert_with(|| ClusterSummary {
                cluster_name: name.to_string(),
                cluster_arn: Some(format!("arn:memory:cluster/{name}")),
                status: Some("ACTIVE".into()),
            });
        Ok(cluster.clone())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_types::ContainerDefinition;

    fn service(task_definition: &str) -> ServiceSpec {
        ServiceSpec {
            service_name: "svc".into(),
            cluster: "cluster".into(),
            desired_count: 2,
            task_definition: task_definition.into(),
            load_balancers: Vec::new(),
            role: None,
            deployment_configuration: None,
            client_token: None,
        }
    }

    #[tokio::test]
    async fn test_revisions_increase_per_family() {
        let api = InMemorySchedulingApi::new();
        let spec = TaskDefinitionSpec::new("family").with_container(ContainerDefinition::new("c", "i"));

        assert_eq!(api.register_task_definition(&spec).await.unwrap().revision, 1);
        assert_eq!(api.register_task_definition(&spec).await.unwrap().revision, 2);
        assert_eq!(
            api.register_task_definition(&TaskDefinitionSpec::new("other"))
                .await
                .unwrap()
                .revision,
            1
        );
    }

    #[tokio::test]
    async fn test_second_create_is_rejected_and_update_applies() {
        let api = InMemorySchedulingApi::new();
        api.create_service(&service("family:1")).await.unwrap();

        let err = api.create_service(&service("family:2")).await.unwrap_err();
        assert!(err.is_already_exists());

        api.update_service(&service("family:2").into_update())
            .await
            .unwrap();
        assert_eq!(
            api.service_task_definition("cluster", "svc").as_deref(),
            Some("family:2")
        );
    }

    #[tokio::test]
    async fn test_create_cluster_is_idempotent() {
        let api = InMemorySchedulingApi::new();
        let first = api.create_cluster("test-cluster").await.unwrap();
        let second = api.create_cluster("test-cluster").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(api.calls().len(), 2);
    }
}
