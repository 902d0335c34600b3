//! Application catalog
//!
//! Static description of every deployable application and its environments.
//! Resolving an application/environment pair yields a [`Target`], from which
//! all provider-side names are derived.
//!
//! Layered configuration may fold map keys to lowercase, so application and
//! environment names resolve case-insensitively and tags are a list rather
//! than a map.

use crate::error::{DeployError, DeployResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every deployable application, plus settings shared between them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCatalog {
    /// DNS zone the service records are created in, e.g. `example.com`
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub hosted_zone_id: String,
    /// Default subnets of the load balancer subnet parameter
    #[serde(default)]
    pub public_subnets: Vec<String>,
    /// Tags put on the load balancer, in order
    #[serde(default)]
    pub tags: Vec<ResourceTag>,
    #[serde(default)]
    pub apps: BTreeMap<String, AppConfig>,
}

/// A provider resource tag. Keys are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTag {
    pub key: String,
    pub value: String,
}

impl ResourceTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Stack name prefix; the environment is appended
    pub stack_name: String,
    pub dns_service_name: String,
    pub main_container_name: String,
    /// Port the application listens on inside the container
    pub container_port: u16,
    /// Image repository, without tag
    pub container_image: String,
    #[serde(default = "default_lb_protocol")]
    pub lb_protocol: String,
    #[serde(default = "default_desired_count")]
    pub desired_count: u32,
    #[serde(default = "default_cpu")]
    pub cpu: u32,
    #[serde(default = "default_memory")]
    pub memory: u32,
    #[serde(default = "default_memory_reservation")]
    pub memory_reservation: u32,
    /// Value of the `type` log label; the main container name when unset
    #[serde(default)]
    pub log_type: Option<String>,
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

/// One environment of an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Stack exposing `ECSClusterName` and `ElbSecurityGroupName`
    pub cluster_stack: String,
    /// Appended to the application stack name
    #[serde(default)]
    pub service_stack_suffix: String,
    /// Port exposed on the container hosts. Unique per application.
    pub host_port: u16,
    #[serde(default = "default_elb_port")]
    pub elb_port: u16,
    #[serde(default)]
    pub dns_suffix: String,
    /// Template parameter holding the load balancer subnets
    #[serde(default = "default_subnets")]
    pub subnets: String,
    pub health_check_target: String,
    pub application_environment: String,
    pub log_environment: String,
    #[serde(default = "default_minimum_healthy_percent")]
    pub minimum_healthy_percent: u32,
    #[serde(default = "default_maximum_percent")]
    pub maximum_percent: u32,
}

fn default_lb_protocol() -> String {
    "TCP".to_string()
}

fn default_desired_count() -> u32 {
    2
}

fn default_cpu() -> u32 {
    10
}

fn default_memory() -> u32 {
    750
}

fn default_memory_reservation() -> u32 {
    600
}

fn default_elb_port() -> u16 {
    80
}

fn default_subnets() -> String {
    "PublicSubnets".to_string()
}

fn default_minimum_healthy_percent() -> u32 {
    100
}

fn default_maximum_percent() -> u32 {
    200
}

impl AppCatalog {
    /// Resolve an application in an environment
    ///
    /// Names match case-insensitively; an exact match wins over a folded one.
    /// The target keeps the application name as requested and the
    /// environment name as configured, since the latter ends up in stack
    /// names.
    pub fn resolve(&self, application: &str, environment: &str) -> DeployResult<Target> {
        let (_, app) = lookup(&self.apps, application)
            .ok_or_else(|| DeployError::UnknownApplication(application.to_string()))?;
        let (environment, env) = lookup(&app.environments, environment).ok_or_else(|| {
            DeployError::UnknownEnvironment {
                application: application.to_string(),
                environment: environment.to_string(),
            }
        })?;

        Ok(Target {
            application: application.to_string(),
            environment: environment.to_string(),
            domain: self.domain.clone(),
            hosted_zone_id: self.hosted_zone_id.clone(),
            public_subnets: self.public_subnets.clone(),
            tags: self.tags.clone(),
            app: app.clone(),
            env: env.clone(),
        })
    }
}

fn lookup<'a, V>(entries: &'a BTreeMap<String, V>, name: &str) -> Option<(&'a str, &'a V)> {
    entries
        .get_key_value(name)
        .or_else(|| entries.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)))
        .map(|(key, value)| (key.as_str(), value))
}

/// An application resolved in one environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub application: String,
    pub environment: String,
    pub domain: String,
    pub hosted_zone_id: String,
    pub public_subnets: Vec<String>,
    pub tags: Vec<ResourceTag>,
    pub app: AppConfig,
    pub env: EnvironmentConfig,
}

impl Target {
    /// Application stack name; also the service name
    pub fn stack_name(&self) -> String {
        format!(
            "{}-{}{}",
            self.app.stack_name, self.environment, self.env.service_stack_suffix
        )
    }

    pub fn task_family(&self) -> String {
        format!("{}-{}", self.app.main_container_name, self.environment)
    }

    pub fn dns_name(&self) -> String {
        format!(
            "{}{}.{}",
            self.app.dns_service_name, self.env.dns_suffix, self.domain
        )
    }

    /// Image reference; an empty tag means `latest`
    pub fn image(&self, tag: &str) -> String {
        let tag = if tag.is_empty() { "latest" } else { tag };
        format!("{}:{}", self.app.container_image, tag)
    }

    pub fn log_type(&self) -> &str {
        self.app
            .log_type
            .as_deref()
            .unwrap_or(&self.app.main_container_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> AppCatalog {
        let value = serde_json::json!({
            "domain": "example.com",
            "hosted_zone_id": "Z1",
            "apps": {
                "CurrencyService": {
                    "stack_name": "currency-service",
                    "dns_service_name": "currency",
                    "main_container_name": "CurrencyService",
                    "container_port": 8000,
                    "container_image": "registry/currency",
                    "environments": {
                        "dev": {
                            "cluster_stack": "EC2ContainerService-testCluster",
                            "host_port": 8000,
                            "dns_suffix": "-dev",
                            "health_check_target": "HTTP:8000/api/check",
                            "application_environment": "dev",
                            "log_environment": "Development"
                        },
                        "prod": {
                            "cluster_stack": "EC2ContainerService-testCluster",
                            "service_stack_suffix": "-v2",
                            "host_port": 10000,
                            "health_check_target": "HTTP:10000/api/check",
                            "application_environment": "prod",
                            "log_environment": "Production"
                        }
                    }
                }
            }
        });
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_resolve_derives_names() {
        let dev = catalog().resolve("CurrencyService", "dev").unwrap();
        assert_eq!(dev.stack_name(), "currency-service-dev");
        assert_eq!(dev.task_family(), "CurrencyService-dev");
        assert_eq!(dev.dns_name(), "currency-dev.example.com");
        assert_eq!(dev.image(""), "registry/currency:latest");
        assert_eq!(dev.image("1.4.2"), "registry/currency:1.4.2");

        let prod = catalog().resolve("CurrencyService", "prod").unwrap();
        assert_eq!(prod.stack_name(), "currency-service-prod-v2");
        assert_eq!(prod.dns_name(), "currency.example.com");
    }

    #[test]
    fn test_defaults_fill_optional_fields() {
        let dev = catalog().resolve("CurrencyService", "dev").unwrap();
        assert_eq!(dev.app.lb_protocol, "TCP");
        assert_eq!(dev.app.desired_count, 2);
        assert_eq!((dev.app.cpu, dev.app.memory, dev.app.memory_reservation), (10, 750, 600));
        assert_eq!(dev.env.elb_port, 80);
        assert_eq!(dev.log_type(), "CurrencyService");
    }

    #[test]
    fn test_names_resolve_regardless_of_key_case() {
        let mut catalog = catalog();
        let app = catalog.apps.remove("CurrencyService").unwrap();
        catalog.apps.insert("currencyservice".to_string(), app);

        let target = catalog.resolve("CurrencyService", "DEV").unwrap();
        assert_eq!(target.application, "CurrencyService");
        assert_eq!(target.environment, "dev");
        assert_eq!(target.stack_name(), "currency-service-dev");
        assert_eq!(target.env.host_port, 8000);
    }

    #[test]
    fn test_tags_keep_key_case_and_order() {
        let catalog: AppCatalog = serde_json::from_value(serde_json::json!({
            "tags": [
                {"key": "Service", "value": "MobileApp"},
                {"key": "BusinessUnit", "value": "CES"}
            ]
        }))
        .unwrap();
        assert_eq!(
            catalog.tags,
            vec![
                ResourceTag::new("Service", "MobileApp"),
                ResourceTag::new("BusinessUnit", "CES")
            ]
        );
    }

    #[test]
    fn test_unknown_application_and_environment() {
        assert!(matches!(
            catalog().resolve("Billing", "dev"),
            Err(DeployError::UnknownApplication(ref app)) if app == "Billing"
        ));
        assert!(matches!(
            catalog().resolve("CurrencyService", "qa"),
            Err(DeployError::UnknownEnvironment { ref environment, .. }) if environment == "qa"
        ));
    }
}
