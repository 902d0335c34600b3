//! Output lookup for stacks that are expected to exist already

use crate::error::{StackError, StackResult};
use berth_provider::StackApi;
use berth_types::StackOutputs;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Resolves a named stack's outputs.
///
/// Exactly one stack must be described for the name. The lookup never picks
/// one of several candidates.
#[derive(Clone)]
pub struct ClusterLookup {
    api: Arc<dyn StackApi>,
}

impl ClusterLookup {
    pub fn new(api: Arc<dyn StackApi>) -> Self {
        Self { api }
    }

    /// Outputs of the stack named `name`.
    ///
    /// Fails with [`StackError::NotFound`] when the provider does not know the
    /// stack and [`StackError::Ambiguous`] when it describes zero or several.
    #[instrument(skip(self), fields(stack = %name))]
    pub async fn lookup(&self, name: &str) -> StackResult<StackOutputs> {
        let stacks = self.api.describe_stacks(name).await.map_err(|err| {
            if err.is_not_found() {
                StackError::NotFound {
                    stack: name.to_string(),
                }
            } else {
                StackError::provider(name, err)
            }
        })?;

        match stacks.as_slice() {
            [stack] => {
                let outputs = StackOutputs::from_stack(stack);
                info!(stack = %name, outputs = outputs.len(), "Resolved stack outputs");
                Ok(outputs)
            }
            other => {
                warn!(
                    stack = %name,
                    count = other.len(),
                    "Too many or zero stacks found for name"
                );
                Err(StackError::Ambiguous {
                    stack: name.to_string(),
                    count: other.len(),
                })
            }
        }
    }

    /// Like [`ClusterLookup::lookup`], but a stack that does not exist yet is
    /// `None` rather than an error.
    pub async fn find(&self, name: &str) -> StackResult<Option<StackOutputs>> {
        match self.lookup(name).await {
            Ok(outputs) => Ok(Some(outputs)),
            Err(StackError::NotFound { .. }) | Err(StackError::Ambiguous { count: 0, .. }) => {
                debug!(stack = %name, "Stack does not exist yet");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use berth_provider::InMemoryStackApi;
    use berth_types::{ProviderResult, StackDescription, StackRequest};

    /// Returns a fixed description list for every name
    struct Fixed(Vec<StackDescription>);

    #[async_trait]
    impl StackApi for Fixed {
        async fn describe_stacks(&self, _name: &str) -> ProviderResult<Vec<StackDescription>> {
            Ok(self.0.clone())
        }
        async fn create_stack(&self, _request: &StackRequest) -> ProviderResult<()> {
            Ok(())
        }
        async fn update_stack(&self, _request: &StackRequest) -> ProviderResult<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_single_stack_outputs_are_flattened() {
        let api = Arc::new(InMemoryStackApi::new());
        api.seed(
            StackDescription::new("EC2ContainerService-testCluster", "CREATE_COMPLETE")
                .with_output("ECSClusterName", "test-cluster")
                .with_output("ElbSecurityGroupName", "sg-123"),
        );

        let outputs = ClusterLookup::new(api)
            .lookup("EC2ContainerService-testCluster")
            .await
            .unwrap();
        assert_eq!(outputs.get("ECSClusterName"), Some("test-cluster"));
        assert_eq!(outputs.get("ElbSecurityGroupName"), Some("sg-123"));
    }

    #[tokio::test]
    async fn test_zero_stacks_is_an_error() {
        let err = ClusterLookup::new(Arc::new(Fixed(Vec::new())))
            .lookup("cluster")
            .await
            .unwrap_err();
        assert!(matches!(err, StackError::Ambiguous { count: 0, .. }));
    }

    #[tokio::test]
    async fn test_several_stacks_is_an_error() {
        let stacks = vec![
            StackDescription::new("cluster", "CREATE_COMPLETE"),
            StackDescription::new("cluster", "UPDATE_COMPLETE"),
        ];
        let lookup = ClusterLookup::new(Arc::new(Fixed(stacks)));

        let err = lookup.lookup("cluster").await.unwrap_err();
        assert!(matches!(err, StackError::Ambiguous { count: 2, .. }));
        assert!(lookup.find("cluster").await.is_err());
    }

    #[tokio::test]
    async fn test_find_tolerates_missing_stack() {
        let lookup = ClusterLookup::new(Arc::new(InMemoryStackApi::new()));
        assert!(matches!(
            lookup.lookup("app-x-dev").await,
            Err(StackError::NotFound { .. })
        ));
        assert!(lookup.find("app-x-dev").await.unwrap().is_none());
    }
}
