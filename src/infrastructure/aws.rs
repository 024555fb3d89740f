//! Shared AWS SDK setup

use aws_smithy_types::error::display::DisplayErrorContext;

use crate::config::AwsConfig;

/// Load SDK configuration from the default provider chain, applying configured overrides
pub async fn load_sdk_config(config: &AwsConfig) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

    if let Some(region) = &config.region {
        loader = loader.region(aws_config::Region::new(region.clone()));
    }

    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }

    loader.load().await
}

/// Render an SDK error with its full source chain
pub(crate) fn error_context<E: std::error::Error>(err: E) -> String {
    DisplayErrorContext(err).to_string()
}
