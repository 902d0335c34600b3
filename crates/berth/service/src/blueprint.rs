//! Release and service blueprint
//!
//! A blueprint is everything about a service that is known before the
//! owning stack settles. It is turned into a [`ServiceSpec`] once the stack
//! outputs and the freshly registered task definition are available.

use crate::error::{PublishError, PublishResult};
use berth_types::{
    DeploymentConfiguration, LoadBalancerBinding, ServiceSpec, StackOutputs, StackRequest,
    TaskDefinitionRef, TaskDefinitionSpec,
};
use serde::{Deserialize, Serialize};

/// Output holding the load balancer the service registers with
pub const LOAD_BALANCER_OUTPUT: &str = "AppElbName";

/// Output holding the role the scheduler uses to manage the load balancer
pub const SERVICE_ROLE_OUTPUT: &str = "EcsServiceRoleName";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBlueprint {
    pub service_name: String,
    pub cluster: String,
    pub desired_count: u32,
    /// Container registered behind the load balancer
    pub container_name: String,
    pub container_port: u16,
    pub deployment_configuration: DeploymentConfiguration,
    /// Stack output naming the load balancer
    pub load_balancer_output: String,
    /// Stack output naming the service role
    pub role_output: String,
}

impl ServiceBlueprint {
    pub fn new(
        service_name: impl Into<String>,
        cluster: impl Into<String>,
        container_name: impl Into<String>,
        container_port: u16,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            cluster: cluster.into(),
            desired_count: 2,
            container_name: container_name.into(),
            container_port,
            deployment_configuration: DeploymentConfiguration::default(),
            load_balancer_output: LOAD_BALANCER_OUTPUT.to_string(),
            role_output: SERVICE_ROLE_OUTPUT.to_string(),
        }
    }

    pub fn with_desired_count(mut self, count: u32) -> Self {
        self.desired_count = count;
        self
    }

    pub fn with_deployment_configuration(mut self, config: DeploymentConfiguration) -> Self {
        self.deployment_configuration = config;
        self
    }

    /// Build the create-service specification.
    ///
    /// `stack` names the stack the outputs came from, for error reporting.
    pub fn build(
        &self,
        stack: &str,
        outputs: &StackOutputs,
        task_definition: &TaskDefinitionRef,
        client_token: impl Into<String>,
    ) -> PublishResult<ServiceSpec> {
        let output = |key: &str| {
            outputs
                .get(key)
                .map(str::to_string)
                .ok_or_else(|| PublishError::MissingOutput {
                    stack: stack.to_string(),
                    key: key.to_string(),
                })
        };

        Ok(ServiceSpec {
            service_name: self.service_name.clone(),
            cluster: self.cluster.clone(),
            desired_count: self.desired_count,
            task_definition: task_definition.to_string(),
            load_balancers: vec![LoadBalancerBinding {
                container_name: self.container_name.clone(),
                container_port: self.container_port,
                load_balancer_name: output(&self.load_balancer_output)?,
            }],
            role: Some(output(&self.role_output)?),
            deployment_configuration: Some(self.deployment_configuration),
            client_token: Some(client_token.into()),
        })
    }
}

/// Everything one publication needs
#[derive(Debug, Clone)]
pub struct Release {
    /// Stack owning the service's load balancer and roles
    pub stack: StackRequest,
    pub task_definition: TaskDefinitionSpec,
    pub service: ServiceBlueprint,
}
