use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::info;

use crate::config::mode::DeploymentMode;
use crate::error::StarshipError;

/// AWS context shared by the secret store and the token source.
///
/// Local mode never loads the SDK configuration; anything that needs it
/// fails with [`StarshipError::CloudConfigMissing`].
#[derive(Debug, Clone)]
pub struct CloudContext {
    region: String,
    sdk: Option<SdkConfig>,
}

impl CloudContext {
    pub fn offline(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            sdk: None,
        }
    }

    pub async fn load(mode: &DeploymentMode, region: impl Into<String>) -> Self {
        let region = region.into();
        if mode.is_local() {
            return Self::offline(region);
        }

        let sdk = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;
        info!(region = %region, "loaded AWS configuration");
        Self {
            region,
            sdk: Some(sdk),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn sdk(&self) -> Result<&SdkConfig, StarshipError> {
        self.sdk.as_ref().ok_or(StarshipError::CloudConfigMissing)
    }
}
