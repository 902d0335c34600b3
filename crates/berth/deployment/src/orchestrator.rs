//! Deployment Orchestrator - one application, one environment, one run
//!
//! Sequences cluster lookup, task role carry-forward and service publication,
//! and reports the terminal outcome both as a return value and as an event.

use crate::catalog::{AppCatalog, Target};
use crate::error::{DeployError, DeployResult};
use crate::events::{DeploymentEvent, DeploymentEventEnvelope};
use crate::release::{self, CLUSTER_NAME_OUTPUT, ELB_SECURITY_GROUP_OUTPUT};
use crate::template::TASK_ROLE_OUTPUT;
use berth_provider::{SchedulingApi, StackApi};
use berth_service::{ServiceAction, ServicePublisher};
use berth_stack::{ClusterLookup, PollConfig, ReconcileAction, StackReconciler};
use berth_types::StackOutputs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// What to deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRequest {
    pub environment: String,
    pub application: String,
    /// Image tag; empty means `latest`
    #[serde(default)]
    pub image_tag: String,
}

impl DeployRequest {
    pub fn new(
        environment: impl Into<String>,
        application: impl Into<String>,
        image_tag: impl Into<String>,
    ) -> Self {
        Self {
            environment: environment.into(),
            application: application.into(),
            image_tag: image_tag.into(),
        }
    }
}

/// Outcome of a successful deployment
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub deployment_id: Uuid,
    pub application: String,
    pub environment: String,
    pub stack_name: String,
    pub image: String,
    /// `family:revision` now running
    pub task_definition: String,
    pub stack_action: ReconcileAction,
    pub service_action: ServiceAction,
    /// Outputs of the settled application stack
    pub outputs: StackOutputs,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Deploys catalog applications
pub struct DeploymentOrchestrator {
    catalog: AppCatalog,
    lookup: ClusterLookup,
    publisher: ServicePublisher,
    event_tx: broadcast::Sender<DeploymentEventEnvelope>,
}

impl DeploymentOrchestrator {
    pub fn new(
        catalog: AppCatalog,
        stacks: Arc<dyn StackApi>,
        scheduling: Arc<dyn SchedulingApi>,
        poll: PollConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let reconciler = StackReconciler::new(stacks.clone(), poll);

        Self {
            catalog,
            lookup: ClusterLookup::new(stacks),
            publisher: ServicePublisher::new(scheduling, reconciler),
            event_tx,
        }
    }

    pub fn catalog(&self) -> &AppCatalog {
        &self.catalog
    }

    /// Subscribe to deployment events
    pub fn subscribe(&self) -> broadcast::Receiver<DeploymentEventEnvelope> {
        self.event_tx.subscribe()
    }

    /// Run one deployment to its terminal outcome.
    ///
    /// Deployments of the same application and environment must not overlap;
    /// the caller is responsible for serialising them.
    #[instrument(skip(self, cancel), fields(application = %request.application, environment = %request.environment))]
    pub async fn deploy(
        &self,
        request: &DeployRequest,
        cancel: &CancellationToken,
    ) -> DeployResult<DeploymentReport> {
        let deployment_id = Uuid::new_v4();
        let started_at = Utc::now();

        match self.run(deployment_id, started_at, request, cancel).await {
            Ok(report) => {
                let duration_ms = (report.finished_at - started_at)
                    .num_milliseconds()
                    .max(0) as u64;
                self.emit_event(deployment_id, DeploymentEvent::Completed { duration_ms });
                info!(
                    deployment_id = %deployment_id,
                    task_definition = %report.task_definition,
                    "Deployment completed"
                );
                Ok(report)
            }
            Err(err) => {
                self.emit_event(
                    deployment_id,
                    DeploymentEvent::Failed {
                        error: err.to_string(),
                    },
                );
                error!(deployment_id = %deployment_id, error = %err, "Deployment failed");
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        deployment_id: Uuid,
        started_at: DateTime<Utc>,
        request: &DeployRequest,
        cancel: &CancellationToken,
    ) -> DeployResult<DeploymentReport> {
        let image_tag = request.image_tag.as_str();

        // 1. Resolve the target
        let target = self
            .catalog
            .resolve(&request.application, &request.environment)?;
        let image = target.image(image_tag);
        self.emit_event(
            deployment_id,
            DeploymentEvent::Started {
                application: target.application.clone(),
                environment: target.environment.clone(),
                image: image.clone(),
            },
        );

        // 2. Cluster outputs; the cluster stack must exist exactly once
        let (cluster, elb_security_group) = self.resolve_cluster(&target).await?;
        self.emit_event(
            deployment_id,
            DeploymentEvent::ClusterResolved {
                cluster_stack: target.env.cluster_stack.clone(),
                cluster: cluster.clone(),
            },
        );

        // 3. Existing application stack, absent on first deployment
        let stack_name = target.stack_name();
        let existing = self.lookup.find(&stack_name).await?;
        if let Some(outputs) = &existing {
            let task_role_arn = outputs.get(TASK_ROLE_OUTPUT).map(str::to_string);
            info!(stack = %stack_name, task_role = ?task_role_arn, "Application stack exists");
            self.emit_event(
                deployment_id,
                DeploymentEvent::ExistingStackFound {
                    stack: stack_name.clone(),
                    task_role_arn,
                },
            );
        }

        // 4. Publish
        let release = release::release(
            &target,
            image_tag,
            &cluster,
            &elb_security_group,
            existing.as_ref(),
        );
        let registered = self.publisher.register(&release).await?;
        let task_definition = registered.to_string();
        // A later failure leaves this revision registered
        self.emit_event(
            deployment_id,
            DeploymentEvent::TaskDefinitionRegistered {
                task_definition: task_definition.clone(),
            },
        );

        let publication = self
            .publisher
            .publish_registered(&release, registered, cancel)
            .await?;
        self.emit_event(
            deployment_id,
            DeploymentEvent::StackReconciled {
                stack: stack_name.clone(),
                action: publication.stack.action,
            },
        );
        self.emit_event(
            deployment_id,
            DeploymentEvent::ServicePublished {
                service: publication.service.service_name.clone(),
                action: publication.action,
            },
        );

        Ok(DeploymentReport {
            deployment_id,
            application: target.application,
            environment: target.environment,
            stack_name,
            image,
            task_definition,
            stack_action: publication.stack.action,
            service_action: publication.action,
            outputs: publication.stack.completion.outputs,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn resolve_cluster(&self, target: &Target) -> DeployResult<(String, String)> {
        let stack = &target.env.cluster_stack;
        let outputs = self.lookup.lookup(stack).await?;

        let output = |key: &str| {
            outputs
                .get(key)
                .map(str::to_string)
                .ok_or_else(|| DeployError::MissingClusterOutput {
                    stack: stack.clone(),
                    key: key.to_string(),
                })
        };

        Ok((
            output(CLUSTER_NAME_OUTPUT)?,
            output(ELB_SECURITY_GROUP_OUTPUT)?,
        ))
    }

    fn emit_event(&self, deployment_id: Uuid, event: DeploymentEvent) {
        let _ = self
            .event_tx
            .send(DeploymentEventEnvelope::new(deployment_id, event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_provider::{InMemorySchedulingApi, InMemoryStackApi};
    use berth_types::StackDescription;

    fn catalog() -> AppCatalog {
        serde_json::from_value(serde_json::json!({
            "domain": "example.com",
            "apps": {
                "CurrencyService": {
                    "stack_name": "currency-service",
                    "dns_service_name": "currency",
                    "main_container_name": "CurrencyService",
                    "container_port": 8000,
                    "container_image": "registry/currency",
                    "environments": {
                        "dev": {
                            "cluster_stack": "cluster-dev",
                            "host_port": 8000,
                            "health_check_target": "HTTP:8000/api/check",
                            "application_environment": "dev",
                            "log_environment": "Development"
                        }
                    }
                }
            }
        }))
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_application_emits_single_failure() {
        let orchestrator = DeploymentOrchestrator::new(
            catalog(),
            Arc::new(InMemoryStackApi::new()),
            Arc::new(InMemorySchedulingApi::new()),
            PollConfig::default(),
        );
        let mut events = orchestrator.subscribe();

        let err = orchestrator
            .deploy(
                &DeployRequest::new("dev", "Billing", ""),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::UnknownApplication(_)));
        let envelope = events.recv().await.unwrap();
        assert!(matches!(envelope.event, DeploymentEvent::Failed { .. }));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cluster_without_security_group_output_fails() {
        let stacks = Arc::new(InMemoryStackApi::new());
        stacks.seed(
            StackDescription::new("cluster-dev", "CREATE_COMPLETE")
                .with_output("ECSClusterName", "test-cluster"),
        );
        let scheduling = Arc::new(InMemorySchedulingApi::new());
        let orchestrator =
            DeploymentOrchestrator::new(catalog(), stacks, scheduling.clone(), PollConfig::default());

        let err = orchestrator
            .deploy(
                &DeployRequest::new("dev", "CurrencyService", ""),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::MissingClusterOutput { ref key, .. } if key == "ElbSecurityGroupName"
        ));
        assert!(scheduling.calls().is_empty());
    }
}
