//! AWS client settings

use aws_config::{BehaviorVersion, Region, SdkConfig};
use serde::{Deserialize, Serialize};

/// Where each provider API is reached.
///
/// Unset regions fall back to the default provider chain (environment,
/// profile, instance metadata).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsSettings {
    /// Region of the infrastructure-stack API
    #[serde(default)]
    pub stack_region: Option<String>,
    /// Region of the container-scheduling API
    #[serde(default)]
    pub scheduling_region: Option<String>,
    /// Named credentials profile
    #[serde(default)]
    pub profile: Option<String>,
}

impl AwsSettings {
    pub async fn stack_sdk_config(&self) -> SdkConfig {
        load(self.stack_region.as_deref(), self.profile.as_deref()).await
    }

    pub async fn scheduling_sdk_config(&self) -> SdkConfig {
        load(self.scheduling_region.as_deref(), self.profile.as_deref()).await
    }
}

async fn load(region: Option<&str>, profile: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    loader.load().await
}
