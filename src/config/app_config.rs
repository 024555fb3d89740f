use std::time::Duration;

use serde::Deserialize;

use crate::domain::knowledge_base::{FieldMapping, PollPolicy, VectorStorage};
use crate::domain::DomainError;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// AWS client settings; unset values fall back to the default provider chain
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Foundation model used when no model ARN is given
    #[serde(default = "default_foundation_model")]
    pub foundation_model: String,
    /// Full model ARN; overrides `foundation_model`
    pub model_arn: Option<String>,
    #[serde(default = "default_number_of_results")]
    pub max_results: u32,
}

impl GenerationConfig {
    /// Resolve the generation model ARN for `region`
    pub fn resolve_model_arn(&self, region: Option<&str>) -> Result<String, DomainError> {
        if let Some(arn) = &self.model_arn {
            return Ok(arn.clone());
        }

        let region = region.ok_or_else(|| {
            DomainError::configuration(
                "AWS region is required to build the foundation model ARN",
            )
        })?;

        Ok(foundation_model_arn(region, &self.foundation_model))
    }
}

/// ARN of an on-demand foundation model
pub fn foundation_model_arn(region: &str, model_id: &str) -> String {
    format!("arn:aws:bedrock:{}::foundation-model/{}", region, model_id)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_number_of_results")]
    pub number_of_results: u32,
    /// Page cap when following pagination tokens
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvisioningConfig {
    /// Prefix for generated knowledge base and bucket names
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    #[serde(default = "default_description")]
    pub description: String,
    /// IAM role assumed by Bedrock for the knowledge base
    pub role_arn: Option<String>,
    pub embedding_model_arn: Option<String>,
    #[serde(default)]
    pub opensearch: OpenSearchConfig,
}

impl ProvisioningConfig {
    pub fn role_arn(&self) -> Result<&str, DomainError> {
        self.role_arn.as_deref().ok_or_else(|| {
            DomainError::configuration("provisioning.role_arn is not configured")
        })
    }

    pub fn embedding_model_arn(&self) -> Result<&str, DomainError> {
        self.embedding_model_arn.as_deref().ok_or_else(|| {
            DomainError::configuration("provisioning.embedding_model_arn is not configured")
        })
    }

    /// Vector store settings for a new knowledge base
    pub fn vector_storage(&self) -> Result<VectorStorage, DomainError> {
        let collection_arn = self.opensearch.collection_arn.clone().ok_or_else(|| {
            DomainError::configuration("provisioning.opensearch.collection_arn is not configured")
        })?;

        Ok(VectorStorage::OpensearchServerless {
            collection_arn,
            vector_index_name: self.opensearch.vector_index_name.clone(),
            field_mapping: FieldMapping {
                vector_field: self.opensearch.vector_field.clone(),
                text_field: self.opensearch.text_field.clone(),
                metadata_field: self.opensearch.metadata_field.clone(),
            },
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenSearchConfig {
    pub collection_arn: Option<String>,
    #[serde(default = "default_vector_index_name")]
    pub vector_index_name: String,
    #[serde(default = "default_vector_field")]
    pub vector_field: String,
    #[serde(default = "default_text_field")]
    pub text_field: String,
    #[serde(default = "default_metadata_field")]
    pub metadata_field: String,
}

/// Polling of knowledge base and ingestion job status
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl IngestionConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            Duration::from_secs(self.initial_delay_secs),
            Duration::from_secs(self.max_delay_secs),
            self.multiplier,
            self.max_attempts,
        )
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_foundation_model() -> String {
    "anthropic.claude-3-haiku-20240307-v1:0".to_string()
}

fn default_number_of_results() -> u32 {
    5
}

fn default_max_pages() -> u32 {
    10
}

fn default_name_prefix() -> String {
    "bedrock-kb".to_string()
}

fn default_description() -> String {
    "Multi data source knowledge base.".to_string()
}

fn default_vector_index_name() -> String {
    "bedrock-knowledge-base-default-index".to_string()
}

fn default_vector_field() -> String {
    "bedrock-knowledge-base-default-vector".to_string()
}

fn default_text_field() -> String {
    "AMAZON_BEDROCK_TEXT_CHUNK".to_string()
}

fn default_metadata_field() -> String {
    "AMAZON_BEDROCK_METADATA".to_string()
}

fn default_initial_delay_secs() -> u64 {
    5
}

fn default_max_delay_secs() -> u64 {
    60
}

fn default_multiplier() -> u32 {
    2
}

fn default_max_attempts() -> u32 {
    40
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            foundation_model: default_foundation_model(),
            model_arn: None,
            max_results: default_number_of_results(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            number_of_results: default_number_of_results(),
            max_pages: default_max_pages(),
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            name_prefix: default_name_prefix(),
            description: default_description(),
            role_arn: None,
            embedding_model_arn: None,
            opensearch: OpenSearchConfig::default(),
        }
    }
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        Self {
            collection_arn: None,
            vector_index_name: default_vector_index_name(),
            vector_field: default_vector_field(),
            text_field: default_text_field(),
            metadata_field: default_metadata_field(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            multiplier: default_multiplier(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("BEDROCK_KB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.retrieval.number_of_results, 5);
        assert_eq!(config.generation.max_results, 5);
        assert_eq!(
            config.generation.foundation_model,
            "anthropic.claude-3-haiku-20240307-v1:0"
        );
        assert_eq!(config.ingestion.poll_policy(), PollPolicy::default());
    }

    #[test]
    fn test_resolve_model_arn() {
        let config = GenerationConfig::default();
        assert_eq!(
            config.resolve_model_arn(Some("us-west-2")).unwrap(),
            "arn:aws:bedrock:us-west-2::foundation-model/anthropic.claude-3-haiku-20240307-v1:0"
        );
        assert!(config.resolve_model_arn(None).is_err());

        let explicit = GenerationConfig {
            model_arn: Some("arn:aws:bedrock:eu-west-1::foundation-model/custom".to_string()),
            ..GenerationConfig::default()
        };
        assert_eq!(
            explicit.resolve_model_arn(None).unwrap(),
            "arn:aws:bedrock:eu-west-1::foundation-model/custom"
        );
    }

    #[test]
    fn test_vector_storage_requires_collection() {
        let mut config = ProvisioningConfig::default();
        assert!(matches!(
            config.vector_storage(),
            Err(DomainError::Configuration { .. })
        ));
        assert!(config.role_arn().is_err());

        config.opensearch.collection_arn =
            Some("arn:aws:aoss:us-east-1:123456789012:collection/kb".to_string());
        let VectorStorage::OpensearchServerless {
            vector_index_name,
            field_mapping,
            ..
        } = config.vector_storage().unwrap();

        assert_eq!(vector_index_name, "bedrock-knowledge-base-default-index");
        assert_eq!(field_mapping.text_field, "AMAZON_BEDROCK_TEXT_CHUNK");
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [logging]
                format = "json"

                [ingestion]
                max_attempts = 3
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.ingestion.max_attempts, 3);
        assert_eq!(config.ingestion.initial_delay_secs, 5);
    }
}
