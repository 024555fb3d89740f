//! Application configuration loaded from files and `BEDROCK_KB__*` environment variables

mod app_config;

pub use app_config::{
    foundation_model_arn, AppConfig, AwsConfig, GenerationConfig, IngestionConfig, LogFormat,
    LoggingConfig, OpenSearchConfig, ProvisioningConfig, RetrievalConfig,
};
