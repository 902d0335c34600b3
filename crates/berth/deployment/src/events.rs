//! Deployment lifecycle events

use berth_service::ServiceAction;
use berth_stack::ReconcileAction;
use serde::Serialize;
use uuid::Uuid;

/// Envelope wrapping every deployment event
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentEventEnvelope {
    pub deployment_id: Uuid,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event: DeploymentEvent,
}

impl DeploymentEventEnvelope {
    pub fn new(deployment_id: Uuid, event: DeploymentEvent) -> Self {
        Self {
            deployment_id,
            timestamp: chrono::Utc::now(),
            event,
        }
    }
}

/// Deployment events, in the order a successful deployment emits them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeploymentEvent {
    Started {
        application: String,
        environment: String,
        image: String,
    },

    /// Cluster stack outputs resolved
    ClusterResolved { cluster_stack: String, cluster: String },

    /// A previous deployment's application stack exists
    ExistingStackFound {
        stack: String,
        task_role_arn: Option<String>,
    },

    TaskDefinitionRegistered { task_definition: String },

    StackReconciled {
        stack: String,
        action: ReconcileAction,
    },

    ServicePublished {
        service: String,
        action: ServiceAction,
    },

    /// Terminal success
    Completed { duration_ms: u64 },

    /// Terminal failure
    Failed { error: String },
}

impl DeploymentEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeploymentEvent::Completed { .. } | DeploymentEvent::Failed { .. }
        )
    }
}
