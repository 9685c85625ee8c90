//! AWS SDK configuration
//!
//! Builds the Bedrock Runtime client from settings. Credentials are resolved
//! by the SDK default chain (environment, profile, instance role) when the
//! first call is made, so a missing credential shows up as a provider error on
//! that call rather than at startup.

use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region, SdkConfig};
use aws_sdk_bedrockruntime::Client as BedrockRuntimeClient;

use crate::config::Settings;

pub struct AwsConfigBuilder<'a> {
    settings: &'a Settings,
}

impl<'a> AwsConfigBuilder<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Shared SDK configuration: the configured region first, then the
    /// SDK's own region lookup.
    pub async fn build_sdk_config(&self) -> SdkConfig {
        let region_provider =
            RegionProviderChain::first_try(Region::new(self.settings.aws_region.clone()))
                .or_default_provider();

        aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await
    }

    /// Bedrock Runtime client, honoring `BEDROCK_ENDPOINT_URL` when set.
    pub async fn build_bedrock_client(&self) -> BedrockRuntimeClient {
        let sdk_config = self.build_sdk_config().await;

        match &self.settings.bedrock_endpoint_url {
            Some(endpoint_url) => {
                tracing::info!(endpoint = %endpoint_url, "Using custom Bedrock endpoint");

                let bedrock_config = aws_sdk_bedrockruntime::config::Builder::from(&sdk_config)
                    .endpoint_url(endpoint_url)
                    .build();

                BedrockRuntimeClient::from_conf(bedrock_config)
            }
            None => BedrockRuntimeClient::new(&sdk_config),
        }
    }
}

pub async fn create_bedrock_client(settings: &Settings) -> BedrockRuntimeClient {
    AwsConfigBuilder::new(settings).build_bedrock_client().await
}
