//! CloudFormation stack adapter

use crate::config::AwsSettings;
use crate::error::{classify_cloudformation, from_sdk};
use async_trait::async_trait;
use aws_sdk_cloudformation::types::{Capability, Parameter, Stack};
use aws_sdk_cloudformation::Client;
use berth_provider::StackApi;
use berth_types::{ProviderResult, StackDescription, StackOutput, StackRequest};
use tracing::debug;

/// [`StackApi`] backed by CloudFormation
#[derive(Clone)]
pub struct AwsStackApi {
    client: Client,
}

impl AwsStackApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn from_settings(settings: &AwsSettings) -> Self {
        Self::new(Client::new(&settings.stack_sdk_config().await))
    }

    fn parameters(request: &StackRequest) -> Vec<Parameter> {
        request
            .parameters()
            .iter()
            .map(|p| {
                Parameter::builder()
                    .parameter_key(&p.key)
                    .parameter_value(&p.value)
                    .build()
            })
            .collect()
    }

    fn capabilities(request: &StackRequest) -> Vec<Capability> {
        request
            .capabilities()
            .iter()
            .map(|c| Capability::from(c.as_str()))
            .collect()
    }
}

/// Stacks without a name are skipped. A missing status is reported empty,
/// which classifies as pending.
fn describe(stack: &Stack) -> Option<StackDescription> {
    Some(StackDescription {
        name: stack.stack_name()?.to_string(),
        status: stack
            .stack_status()
            .map(|status| status.as_str().to_string())
            .unwrap_or_default(),
        outputs: stack
            .outputs()
            .iter()
            .filter_map(|o| {
                let key = o.output_key()?;
                let mut output = StackOutput::new(key, o.output_value().unwrap_or_default());
                output.description = o.description().map(str::to_string);
                Some(output)
            })
            .collect(),
    })
}

#[async_trait]
impl StackApi for AwsStackApi {
    async fn describe_stacks(&self, name: &str) -> ProviderResult<Vec<StackDescription>> {
        let output = self
            .client
            .describe_stacks()
            .stack_name(name)
            .send()
            .await
            .map_err(|e| from_sdk("DescribeStacks", e, classify_cloudformation))?;

        let stacks: Vec<StackDescription> = output.stacks().iter().filter_map(describe).collect();
        debug!(stack = %name, count = stacks.len(), "Described stacks");
        Ok(stacks)
    }

    async fn create_stack(&self, request: &StackRequest) -> ProviderResult<()> {
        self.client
            .create_stack()
            .stack_name(request.name())
            .template_body(request.template_body())
            .set_parameters(Some(Self::parameters(request)))
            .set_capabilities(Some(Self::capabilities(request)))
            .send()
            .await
            .map_err(|e| from_sdk("CreateStack", e, classify_cloudformation))?;
        Ok(())
    }

    async fn update_stack(&self, request: &StackRequest) -> ProviderResult<()> {
        self.client
            .update_stack()
            .stack_name(request.name())
            .template_body(request.template_body())
            .set_parameters(Some(Self::parameters(request)))
            .set_capabilities(Some(Self::capabilities(request)))
            .send()
            .await
            .map_err(|e| from_sdk("UpdateStack", e, classify_cloudformation))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "cloudformation"
    }
}
