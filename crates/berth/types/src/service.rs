//! Scheduled service types
//!
//! A service is created once with the full specification. Every later
//! deployment updates it with the reduced [`ServiceUpdate`], which by
//! construction cannot carry fields the provider rejects on update.

use serde::{Deserialize, Serialize};

/// Binding of a container port to a load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerBinding {
    pub container_name: String,
    pub container_port: u16,
    pub load_balancer_name: String,
}

/// Rolling deployment bounds, in percent of the desired count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfiguration {
    pub maximum_percent: u32,
    pub minimum_healthy_percent: u32,
}

impl Default for DeploymentConfiguration {
    fn default() -> Self {
        Self {
            maximum_percent: 200,
            minimum_healthy_percent: 100,
        }
    }
}

/// Full create-service specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub service_name: String,
    pub cluster: String,
    pub desired_count: u32,
    /// `family:revision` of the task definition to run
    pub task_definition: String,
    #[serde(default)]
    pub load_balancers: Vec<LoadBalancerBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_configuration: Option<DeploymentConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_token: Option<String>,
}

impl ServiceSpec {
    /// Reduce to the update form.
    ///
    /// Drops client token, role, load balancers, deployment configuration and
    /// desired count; the service name travels as `service`.
    pub fn into_update(self) -> ServiceUpdate {
        ServiceUpdate {
            service: self.service_name,
            cluster: self.cluster,
            task_definition: self.task_definition,
        }
    }
}

/// Update-service request: only fields mutable on an existing service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUpdate {
    pub service: String,
    pub cluster: String,
    pub task_definition: String,
}

/// Service as reported back by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub service_name: String,
    pub cluster: String,
    pub task_definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Cluster as reported back by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub cluster_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ServiceSpec {
        ServiceSpec {
            service_name: "currency-service-dev".into(),
            cluster: "test-cluster".into(),
            desired_count: 2,
            task_definition: "CurrencyService-dev:3".into(),
            load_balancers: vec![LoadBalancerBinding {
                container_name: "CurrencyService".into(),
                container_port: 8000,
                load_balancer_name: "elb1".into(),
            }],
            role: Some("role1".into()),
            deployment_configuration: Some(DeploymentConfiguration {
                maximum_percent: 100,
                minimum_healthy_percent: 50,
            }),
            client_token: Some("token".into()),
        }
    }

    #[test]
    fn test_update_request_drops_create_only_fields() {
        let update = serde_json::to_value(spec().into_update()).unwrap();
        let object = update.as_object().unwrap();

        for field in [
            "clientToken",
            "role",
            "loadBalancers",
            "deploymentConfiguration",
            "desiredCount",
            "serviceName",
        ] {
            assert!(!object.contains_key(field), "{field} must not be sent on update");
        }
        assert_eq!(update["service"], "currency-service-dev");
        assert_eq!(update["taskDefinition"], "CurrencyService-dev:3");
        assert_eq!(update["cluster"], "test-cluster");
    }

    #[test]
    fn test_create_request_uses_provider_field_names() {
        let create = serde_json::to_value(spec()).unwrap();
        assert_eq!(create["serviceName"], "currency-service-dev");
        assert_eq!(create["desiredCount"], 2);
        assert_eq!(create["loadBalancers"][0]["loadBalancerName"], "elb1");
        assert_eq!(create["deploymentConfiguration"]["minimumHealthyPercent"], 50);
    }
}
