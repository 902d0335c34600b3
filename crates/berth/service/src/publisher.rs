//! Service publisher

use crate::blueprint::Release;
use crate::error::{PublishError, PublishResult};
use berth_provider::SchedulingApi;
use berth_stack::{Reconciliation, StackReconciler};
use berth_types::{ServiceSummary, TaskDefinitionRef};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// How the service was brought to the new revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceAction {
    Created,
    /// The service already existed; the steady state for redeployments
    Updated,
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceAction::Created => f.write_str("created"),
            ServiceAction::Updated => f.write_str("updated"),
        }
    }
}

/// A completed publication
#[derive(Debug, Clone, Serialize)]
pub struct Publication {
    pub task_definition: TaskDefinitionRef,
    pub stack: Reconciliation,
    pub service: ServiceSummary,
    pub action: ServiceAction,
}

/// Registers task definitions and creates or updates services
pub struct ServicePublisher {
    scheduling: Arc<dyn SchedulingApi>,
    reconciler: StackReconciler,
}

impl ServicePublisher {
    pub fn new(scheduling: Arc<dyn SchedulingApi>, reconciler: StackReconciler) -> Self {
        Self {
            scheduling,
            reconciler,
        }
    }

    /// Publish a release: [`ServicePublisher::register`], then
    /// [`ServicePublisher::publish_registered`].
    ///
    /// No service action is attempted without a registered revision, and a
    /// failure after registration leaves the new revision in place: nothing
    /// is rolled back.
    pub async fn publish(
        &self,
        release: &Release,
        cancel: &CancellationToken,
    ) -> PublishResult<Publication> {
        let task_definition = self.register(release).await?;
        self.publish_registered(release, task_definition, cancel).await
    }

    /// Register a new task definition revision for the release
    #[instrument(skip(self, release), fields(family = %release.task_definition.family))]
    pub async fn register(&self, release: &Release) -> PublishResult<TaskDefinitionRef> {
        let task_definition = self
            .scheduling
            .register_task_definition(&release.task_definition)
            .await
            .map_err(PublishError::Registration)?;

        info!(
            family = %task_definition.family,
            revision = task_definition.revision,
            "Task definition revision registered"
        );
        Ok(task_definition)
    }

    /// Converge the release's stack and point the service at an already
    /// registered revision.
    #[instrument(skip(self, release, cancel), fields(service = %release.service.service_name, task_definition = %task_definition))]
    pub async fn publish_registered(
        &self,
        release: &Release,
        task_definition: TaskDefinitionRef,
        cancel: &CancellationToken,
    ) -> PublishResult<Publication> {
        // Converge the owning stack
        let stack = self.reconciler.reconcile(&release.stack, cancel).await?;

        // Create, falling back to update
        let spec = release.service.build(
            release.stack.name(),
            &stack.completion.outputs,
            &task_definition,
            Uuid::new_v4().to_string(),
        )?;

        let (service, action) = match self.scheduling.create_service(&spec).await {
            Ok(service) => {
                info!(service = %service.service_name, "Service created");
                (service, ServiceAction::Created)
            }
            Err(err) if err.is_already_exists() => {
                info!(service = %spec.service_name, "Service already created, updating it");
                let update = spec.into_update();
                let service = self
                    .scheduling
                    .update_service(&update)
                    .await
                    .map_err(|e| {
                        warn!(service = %update.service, error = %e, "Service update failed");
                        PublishError::UpdateService(e)
                    })?;
                info!(
                    service = %service.service_name,
                    task_definition = %service.task_definition,
                    "Service updated"
                );
                (service, ServiceAction::Updated)
            }
            Err(err) => {
                warn!(service = %spec.service_name, error = %err, "Service creation failed");
                return Err(PublishError::CreateService(err));
            }
        };

        Ok(Publication {
            task_definition,
            stack,
            service,
            action,
        })
    }
}
