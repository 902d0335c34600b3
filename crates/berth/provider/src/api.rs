//! Provider capability traits

use async_trait::async_trait;
use berth_types::{
    ClusterSummary, ProviderResult, ServiceSpec, ServiceSummary, ServiceUpdate, StackDescription,
    StackRequest, TaskDefinitionRef, TaskDefinitionSpec,
};

/// Declarative infrastructure-stack API
#[async_trait]
pub trait StackApi: Send + Sync {
    /// Describe every stack the provider returns for `name`.
    ///
    /// A stack the provider does not know is reported as a
    /// [`berth_types::ProviderErrorKind::NotFound`] error, not an empty list.
    async fn describe_stacks(&self, name: &str) -> ProviderResult<Vec<StackDescription>>;

    /// Start creating a stack
    async fn create_stack(&self, request: &StackRequest) -> ProviderResult<()>;

    /// Start updating an existing stack.
    ///
    /// Reports `NoUpdates` when the stack already matches the request and
    /// `NotFound` when there is nothing to update.
    async fn update_stack(&self, request: &StackRequest) -> ProviderResult<()>;

    /// Name for logging
    fn name(&self) -> &str;
}

/// Container-scheduling API
#[async_trait]
pub trait SchedulingApi: Send + Sync {
    /// Register a new, immutable task definition revision
    async fn register_task_definition(
        &self,
        spec: &TaskDefinitionSpec,
    ) -> ProviderResult<TaskDefinitionRef>;

    /// Create a service; `AlreadyExists` when it is already there
    async fn create_service(&self, spec: &ServiceSpec) -> ProviderResult<ServiceSummary>;

    /// Point an existing service at a new task definition
    async fn update_service(&self, update: &ServiceUpdate) -> ProviderResult<ServiceSummary>;

    async fn create_cluster(&self, name: &str) -> ProviderResult<ClusterSummary>;

    /// Name for logging
    fn name(&self) -> &str;
}
