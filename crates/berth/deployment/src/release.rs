//! Release assembly
//!
//! Turns a resolved [`Target`] plus what was learned from the provider
//! (cluster outputs, an existing application stack) into a
//! [`berth_service::Release`].

use crate::catalog::Target;
use crate::template::{self, TASK_ROLE_OUTPUT};
use berth_service::{Release, ServiceBlueprint};
use berth_types::{
    ContainerDefinition, DeploymentConfiguration, EnvironmentVariable, LogConfiguration,
    PortMapping, StackOutputs, TaskDefinitionSpec,
};
use std::collections::BTreeMap;

/// Cluster stack output naming the cluster
pub const CLUSTER_NAME_OUTPUT: &str = "ECSClusterName";
/// Cluster stack output naming the load balancer security group
pub const ELB_SECURITY_GROUP_OUTPUT: &str = "ElbSecurityGroupName";

const LOG_DRIVER: &str = "json-file";
const LOG_LABELS: &str = "logstash,environment,type";

/// Task definition for one deployment.
///
/// The task role of an existing application stack is carried forward so
/// the running role keeps its identity across redeployments.
pub fn task_definition(
    target: &Target,
    image_tag: &str,
    existing: Option<&StackOutputs>,
) -> TaskDefinitionSpec {
    let mut container =
        ContainerDefinition::new(&target.app.main_container_name, target.image(image_tag));
    container.cpu = target.app.cpu;
    container.memory = Some(target.app.memory);
    container.memory_reservation = Some(target.app.memory_reservation);
    container.port_mappings = vec![PortMapping {
        container_port: target.app.container_port,
        host_port: target.env.host_port,
    }];
    container.environment = vec![EnvironmentVariable {
        name: "application_environment".to_string(),
        value: target.env.application_environment.clone(),
    }];
    container.docker_labels = BTreeMap::from([
        ("environment".to_string(), target.env.log_environment.clone()),
        ("type".to_string(), target.log_type().to_string()),
        ("logstash".to_string(), "true".to_string()),
    ]);
    container.log_configuration = Some(LogConfiguration {
        log_driver: LOG_DRIVER.to_string(),
        options: BTreeMap::from([("labels".to_string(), LOG_LABELS.to_string())]),
    });

    let spec = TaskDefinitionSpec::new(target.task_family()).with_container(container);
    match existing.and_then(|outputs| outputs.get(TASK_ROLE_OUTPUT)) {
        Some(role) => spec.with_task_role(role),
        None => spec,
    }
}

/// Service blueprint; the service is named after the application stack
pub fn service_blueprint(target: &Target, cluster: &str) -> ServiceBlueprint {
    ServiceBlueprint::new(
        target.stack_name(),
        cluster,
        &target.app.main_container_name,
        target.app.container_port,
    )
    .with_desired_count(target.app.desired_count)
    .with_deployment_configuration(DeploymentConfiguration {
        maximum_percent: target.env.maximum_percent,
        minimum_healthy_percent: target.env.minimum_healthy_percent,
    })
}

pub fn release(
    target: &Target,
    image_tag: &str,
    cluster: &str,
    elb_security_group: &str,
    existing: Option<&StackOutputs>,
) -> Release {
    Release {
        stack: template::application_stack(target, elb_security_group),
        task_definition: task_definition(target, image_tag, existing),
        service: service_blueprint(target, cluster),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AppCatalog;

    fn target() -> Target {
        let catalog: AppCatalog = serde_json::from_value(serde_json::json!({
            "domain": "example.com",
            "apps": {
                "CurrencyService": {
                    "stack_name": "currency-service",
                    "dns_service_name": "currency",
                    "main_container_name": "CurrencyService",
                    "container_port": 8000,
                    "container_image": "registry/currency",
                    "log_type": "MemberService",
                    "environments": {
                        "dev": {
                            "cluster_stack": "cluster",
                            "host_port": 8110,
                            "health_check_target": "HTTP:8110/api/check",
                            "application_environment": "dev",
                            "log_environment": "Development",
                            "minimum_healthy_percent": 50,
                            "maximum_percent": 100
                        }
                    }
                }
            }
        }))
        .unwrap();
        catalog.resolve("CurrencyService", "dev").unwrap()
    }

    #[test]
    fn test_task_definition_describes_main_container() {
        let spec = task_definition(&target(), "", None);

        assert_eq!(spec.family, "CurrencyService-dev");
        assert!(spec.task_role_arn.is_none());

        let container = &spec.container_definitions[0];
        assert_eq!(container.image, "registry/currency:latest");
        assert_eq!(container.cpu, 10);
        assert_eq!(container.memory, Some(750));
        assert_eq!(container.memory_reservation, Some(600));
        assert_eq!(
            container.port_mappings,
            vec![PortMapping {
                container_port: 8000,
                host_port: 8110
            }]
        );
        assert_eq!(container.environment[0].value, "dev");
        assert_eq!(container.docker_labels["environment"], "Development");
        assert_eq!(container.docker_labels["type"], "MemberService");
        assert_eq!(
            container.log_configuration.as_ref().unwrap().options["labels"],
            "logstash,environment,type"
        );
    }

    #[test]
    fn test_task_role_is_carried_forward() {
        let existing: StackOutputs = [("EcsTaskRoleArn", "arn:aws:iam::1:role/task")]
            .into_iter()
            .collect();

        let spec = task_definition(&target(), "7", Some(&existing));
        assert_eq!(spec.task_role_arn.as_deref(), Some("arn:aws:iam::1:role/task"));

        let without_role = StackOutputs::new();
        assert!(task_definition(&target(), "7", Some(&without_role))
            .task_role_arn
            .is_none());
    }

    #[test]
    fn test_service_blueprint_uses_environment_bounds() {
        let blueprint = service_blueprint(&target(), "test-cluster");
        assert_eq!(blueprint.service_name, "currency-service-dev");
        assert_eq!(blueprint.cluster, "test-cluster");
        assert_eq!(blueprint.desired_count, 2);
        assert_eq!(blueprint.deployment_configuration.minimum_healthy_percent, 50);
        assert_eq!(blueprint.deployment_configuration.maximum_percent, 100);
    }
}
