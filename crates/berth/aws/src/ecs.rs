//! ECS scheduling adapter

use crate::config::AwsSettings;
use crate::error::{classify_ecs, from_sdk};
use async_trait::async_trait;
use aws_sdk_ecs::types::{
    ContainerDefinition, DeploymentConfiguration, KeyValuePair, LoadBalancer, LogConfiguration,
    LogDriver, PortMapping, Service,
};
use aws_sdk_ecs::Client;
use berth_provider::SchedulingApi;
use berth_types::{
    ClusterSummary, ProviderError, ProviderResult, ServiceSpec, ServiceSummary, ServiceUpdate,
    TaskDefinitionRef, TaskDefinitionSpec,
};
use tracing::debug;

/// [`SchedulingApi`] backed by ECS
#[derive(Clone)]
pub struct AwsSchedulingApi {
    client: Client,
}

impl AwsSchedulingApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn from_settings(settings: &AwsSettings) -> Self {
        Self::new(Client::new(&settings.scheduling_sdk_config().await))
    }
}

/// SDK integers are signed; values past `i32::MAX` saturate.
fn int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn container(
    spec: &berth_types::ContainerDefinition,
) -> ProviderResult<ContainerDefinition> {
    let log_configuration = spec
        .log_configuration
        .as_ref()
        .map(|log| {
            LogConfiguration::builder()
                .log_driver(LogDriver::from(log.log_driver.as_str()))
                .set_options(Some(log.options.clone().into_iter().collect()))
                .build()
                .map_err(|e| ProviderError::other("RegisterTaskDefinition", e.to_string()))
        })
        .transpose()?;

    Ok(ContainerDefinition::builder()
        .name(&spec.name)
        .image(&spec.image)
        .cpu(int(spec.cpu))
        .set_memory(spec.memory.map(int))
        .set_memory_reservation(spec.memory_reservation.map(int))
        .set_port_mappings(Some(
            spec.port_mappings
                .iter()
                .map(|p| {
                    PortMapping::builder()
                        .container_port(i32::from(p.container_port))
                        .host_port(i32::from(p.host_port))
                        .build()
                })
                .collect(),
        ))
        .set_environment(Some(
            spec.environment
                .iter()
                .map(|e| KeyValuePair::builder().name(&e.name).value(&e.value).build())
                .collect(),
        ))
        .set_docker_labels(Some(spec.docker_labels.clone().into_iter().collect()))
        .set_log_configuration(log_configuration)
        .build())
}

fn summarize(
    service: Option<&Service>,
    fallback_name: &str,
    fallback_cluster: &str,
    fallback_task_definition: &str,
) -> ServiceSummary {
    ServiceSummary {
        service_name: service
            .and_then(Service::service_name)
            .unwrap_or(fallback_name)
            .to_string(),
        cluster: service
            .and_then(Service::cluster_arn)
            .unwrap_or(fallback_cluster)
            .to_string(),
        task_definition: service
            .and_then(Service::task_definition)
            .unwrap_or(fallback_task_definition)
            .to_string(),
        status: service.and_then(Service::status).map(str::to_string),
    }
}

#[async_trait]
impl SchedulingApi for AwsSchedulingApi {
    async fn register_task_definition(
        &self,
        spec: &TaskDefinitionSpec,
    ) -> ProviderResult<TaskDefinitionRef> {
        let containers = spec
            .container_definitions
            .iter()
            .map(container)
            .collect::<ProviderResult<Vec<_>>>()?;

        let output = self
            .client
            .register_task_definition()
            .family(&spec.family)
            .set_task_role_arn(spec.task_role_arn.clone())
            .set_container_definitions(Some(containers))
            .send()
            .await
            .map_err(|e| from_sdk("RegisterTaskDefinition", e, classify_ecs))?;

        let registered = output.task_definition().ok_or_else(|| {
            ProviderError::other("RegisterTaskDefinition", "response carried no task definition")
        })?;
        let revision = u32::try_from(registered.revision()).unwrap_or_default();
        debug!(family = %spec.family, revision, "Registered task definition");

        Ok(TaskDefinitionRef::new(
            registered.family().unwrap_or(&spec.family),
            revision,
        ))
    }

    async fn create_service(&self, spec: &ServiceSpec) -> ProviderResult<ServiceSummary> {
        let load_balancers = spec
            .load_balancers
            .iter()
            .map(|lb| {
                LoadBalancer::builder()
                    .container_name(&lb.container_name)
                    .container_port(i32::from(lb.container_port))
                    .load_balancer_name(&lb.load_balancer_name)
                    .build()
            })
            .collect();

        let deployment_configuration = spec.deployment_configuration.map(|c| {
            DeploymentConfiguration::builder()
                .maximum_percent(int(c.maximum_percent))
                .minimum_healthy_percent(int(c.minimum_healthy_percent))
                .build()
        });

        let output = self
            .client
            .create_service()
            .service_name(&spec.service_name)
            .cluster(&spec.cluster)
            .desired_count(int(spec.desired_count))
            .task_definition(&spec.task_definition)
            .set_load_balancers(Some(load_balancers))
            .set_role(spec.role.clone())
            .set_deployment_configuration(deployment_configuration)
            .set_client_token(spec.client_token.clone())
            .send()
            .await
            .map_err(|e| from_sdk("CreateService", e, classify_ecs))?;

        Ok(summarize(
            output.service(),
            &spec.service_name,
            &spec.cluster,
            &spec.task_definition,
        ))
    }

    async fn update_service(&self, update: &ServiceUpdate) -> ProviderResult<ServiceSummary> {
        let output = self
            .client
            .update_service()
            .service(&update.service)
            .cluster(&update.cluster)
            .task_definition(&update.task_definition)
            .send()
            .await
            .map_err(|e| from_sdk("UpdateService", e, classify_ecs))?;

        Ok(summarize(
            output.service(),
            &update.service,
            &update.cluster,
            &update.task_definition,
        ))
    }

    async fn create_cluster(&self, name: &str) -> ProviderResult<ClusterSummary> {
        let output = self
            .client
            .create_cluster()
            .cluster_name(name)
            .send()
            .await
            .map_err(|e| from_sdk("CreateCluster", e, classify_ecs))?;

        let cluster = output.cluster();
        Ok(ClusterSummary {
            cluster_name: cluster
                .and_then(|c| c.cluster_name())
                .unwrap_or(name)
                .to_string(),
            cluster_arn: cluster.and_then(|c| c.cluster_arn()).map(str::to_string),
            status: cluster.and_then(|c| c.status()).map(str::to_string),
        })
    }

    fn name(&self) -> &str {
        "ecs"
    }
}
