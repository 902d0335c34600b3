//! Configuration for the berth CLI
//!
//! Layered with the `config` crate: built-in defaults, then the file given
//! with `--config`, then `BERTH_` environment variables (`__` separates
//! nested keys, e.g. `BERTH_POLL__INTERVAL_SECS=5`).

use berth_aws::{AwsSchedulingApi, AwsSettings, AwsStackApi};
use berth_deployment::AppCatalog;
use berth_provider::{InMemorySchedulingApi, InMemoryStackApi, SchedulingApi, StackApi};
use berth_stack::PollConfig;
use berth_types::{StackDescription, StackOutput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Main CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BerthConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub catalog: AppCatalog,
}

/// Which provider the commands talk to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// CloudFormation and ECS
    Aws(AwsSettings),

    /// Simulated providers, for dry runs
    Memory(MemoryProviderConfig),
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Aws(AwsSettings::default())
    }
}

/// Initial state of the simulated providers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryProviderConfig {
    /// Describes a created or updated stack stays in progress for
    #[serde(default)]
    pub pending_polls: u32,

    /// Stacks that already exist
    #[serde(default)]
    pub stacks: Vec<SeedStack>,

    /// Outputs published by stacks once created or updated
    #[serde(default)]
    pub declared_outputs: Vec<DeclaredOutputs>,

    /// Services that already exist
    #[serde(default)]
    pub services: Vec<SeedService>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedStack {
    pub name: String,
    #[serde(default = "default_stack_status")]
    pub status: String,
    #[serde(default)]
    pub outputs: Vec<StackOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclaredOutputs {
    pub stack: String,
    pub outputs: Vec<StackOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedService {
    pub cluster: String,
    pub service: String,
    pub task_definition: String,
}

fn default_stack_status() -> String {
    "CREATE_COMPLETE".to_string()
}

/// Provider handles built from configuration
pub struct Providers {
    pub stacks: Arc<dyn StackApi>,
    pub scheduling: Arc<dyn SchedulingApi>,
}

impl BerthConfig {
    /// Load configuration from defaults, file and environment
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&BerthConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("BERTH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Build the provider handles
    pub async fn providers(&self) -> Providers {
        match &self.provider {
            ProviderConfig::Aws(settings) => Providers {
                stacks: Arc::new(AwsStackApi::from_settings(settings).await),
                scheduling: Arc::new(AwsSchedulingApi::from_settings(settings).await),
            },
            ProviderConfig::Memory(memory) => memory.build(),
        }
    }
}

impl MemoryProviderConfig {
    fn build(&self) -> Providers {
        let stacks = InMemoryStackApi::with_pending_polls(self.pending_polls);
        for seed in &self.stacks {
            let mut description = StackDescription::new(&seed.name, &seed.status);
            description.outputs = seed.outputs.clone();
            stacks.seed(description);
        }
        for declared in &self.declared_outputs {
            stacks.declare_outputs(
                &declared.stack,
                declared
                    .outputs
                    .iter()
                    .map(|o| (o.key.as_str(), o.value.as_str()))
                    .collect(),
            );
        }

        let scheduling = InMemorySchedulingApi::new();
        for seed in &self.services {
            scheduling.seed_service(&seed.cluster, &seed.service, &seed.task_definition);
        }

        Providers {
            stacks: Arc::new(stacks),
            scheduling: Arc::new(scheduling),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_deployment::template::application_template;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = BerthConfig::default();
        assert!(matches!(config.provider, ProviderConfig::Aws(_)));
        assert_eq!(config.poll.interval_secs, 10);
        assert_eq!(config.poll.max_retries, 60);
        assert!(config.catalog.apps.is_empty());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "provider:\n  kind: memory\n  pending_polls: 3\n  stacks:\n    - name: cluster\n      outputs:\n        - key: ECSClusterName\n          value: test-cluster\npoll:\n  interval_secs: 1\n"
        )
        .unwrap();

        let config = BerthConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.poll.interval_secs, 1);
        assert_eq!(config.poll.max_retries, 60);
        match config.provider {
            ProviderConfig::Memory(memory) => {
                assert_eq!(memory.pending_polls, 3);
                assert_eq!(memory.stacks[0].status, "CREATE_COMPLETE");
                assert_eq!(memory.stacks[0].outputs[0].value, "test-cluster");
            }
            other => panic!("expected memory provider, got {other:?}"),
        }
    }

    #[test]
    fn test_catalog_keeps_tag_case_and_resolves_mixed_case_apps() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r#"
catalog:
  domain: example.com
  tags:
    - key: Service
      value: MobileApp
    - key: BusinessUnit
      value: CES
  apps:
    CurrencyService:
      stack_name: currency-service
      dns_service_name: currency
      main_container_name: CurrencyService
      container_port: 8000
      container_image: registry/currency
      environments:
        dev:
          cluster_stack: EC2ContainerService-testCluster
          host_port: 8000
          health_check_target: HTTP:8000/api/check
          application_environment: dev
          log_environment: Development
"#
        )
        .unwrap();

        let config = BerthConfig::load(file.path().to_str()).unwrap();
        let target = config.catalog.resolve("CurrencyService", "dev").unwrap();
        assert_eq!(target.stack_name(), "currency-service-dev");

        let template = application_template(&target, "sg-elb");
        assert_eq!(
            template["Resources"]["EcsElasticLoadBalancer"]["Properties"]["Tags"],
            serde_json::json!([
                {"Key": "Service", "Value": "MobileApp"},
                {"Key": "BusinessUnit", "Value": "CES"}
            ])
        );
    }
}
