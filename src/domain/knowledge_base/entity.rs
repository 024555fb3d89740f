//! Knowledge base entity and related types

use serde::{Deserialize, Serialize};

use super::chunking::ChunkingStrategy;
use super::validation::{
    validate_bucket_name, validate_resource_id, KnowledgeBaseValidationError,
};

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier after validation
            pub fn new(id: impl Into<String>) -> Result<Self, KnowledgeBaseValidationError> {
                let id = id.into();
                validate_resource_id($kind, &id)?;
                Ok(Self(id))
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = KnowledgeBaseValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

resource_id!(
    /// Knowledge base identifier assigned by Bedrock
    KnowledgeBaseId,
    "knowledge base"
);

resource_id!(
    /// Data source identifier assigned by Bedrock
    DataSourceId,
    "data source"
);

resource_id!(
    /// Ingestion job identifier assigned by Bedrock
    IngestionJobId,
    "ingestion job"
);

/// Lifecycle status of a knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum KnowledgeBaseStatus {
    Creating,
    Active,
    Deleting,
    Updating,
    Failed,
    DeleteUnsuccessful,
    /// Status string not known to this client
    Unknown(String),
}

impl KnowledgeBaseStatus {
    /// Map the service's wire value
    pub fn from_service(value: &str) -> Self {
        match value {
            "CREATING" => Self::Creating,
            "ACTIVE" => Self::Active,
            "DELETING" => Self::Deleting,
            "UPDATING" => Self::Updating,
            "FAILED" => Self::Failed,
            "DELETE_UNSUCCESSFUL" => Self::DeleteUnsuccessful,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether the knowledge base has settled and further polling is pointless
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Active | Self::Failed | Self::DeleteUnsuccessful
        )
    }
}

impl std::fmt::Display for KnowledgeBaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creating => write!(f, "CREATING"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Deleting => write!(f, "DELETING"),
            Self::Updating => write!(f, "UPDATING"),
            Self::Failed => write!(f, "FAILED"),
            Self::DeleteUnsuccessful => write!(f, "DELETE_UNSUCCESSFUL"),
            Self::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// A knowledge base as reported by the service
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeBase {
    pub id: KnowledgeBaseId,
    pub name: String,
    pub description: Option<String>,
    pub arn: Option<String>,
    pub status: KnowledgeBaseStatus,
    pub failure_reasons: Vec<String>,
}

impl KnowledgeBase {
    /// Create a knowledge base record
    pub fn new(id: KnowledgeBaseId, name: impl Into<String>, status: KnowledgeBaseStatus) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            arn: None,
            status,
            failure_reasons: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_arn(mut self, arn: impl Into<String>) -> Self {
        self.arn = Some(arn.into());
        self
    }

    pub fn with_failure_reasons(mut self, reasons: Vec<String>) -> Self {
        self.failure_reasons = reasons;
        self
    }
}

/// Field names inside an OpenSearch Serverless vector index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub vector_field: String,
    pub text_field: String,
    pub metadata_field: String,
}

/// Vector store backing a knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VectorStorage {
    OpensearchServerless {
        collection_arn: String,
        vector_index_name: String,
        field_mapping: FieldMapping,
    },
}

/// Request to create a vector knowledge base
#[derive(Debug, Clone)]
pub struct CreateKnowledgeBaseRequest {
    pub name: String,
    pub description: Option<String>,
    /// IAM role Bedrock assumes to read data sources and write the index
    pub role_arn: String,
    pub embedding_model_arn: String,
    pub storage: VectorStorage,
}

impl CreateKnowledgeBaseRequest {
    pub fn validate(&self) -> Result<(), KnowledgeBaseValidationError> {
        if self.name.trim().is_empty() {
            return Err(KnowledgeBaseValidationError::EmptyName);
        }
        Ok(())
    }
}

/// Type tag of a data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataSourceType {
    S3,
}

impl std::str::FromStr for DataSourceType {
    type Err = KnowledgeBaseValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "S3" => Ok(Self::S3),
            _ => Err(KnowledgeBaseValidationError::UnsupportedDataSourceType {
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for DataSourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::S3 => write!(f, "S3"),
        }
    }
}

/// Declaration of a data source to attach to a knowledge base
#[derive(Debug, Clone, PartialEq)]
pub struct DataSourceSpec {
    pub name: String,
    pub source_type: DataSourceType,
    pub bucket_name: String,
    pub chunking: ChunkingStrategy,
}

impl DataSourceSpec {
    /// S3 data source named after its bucket
    pub fn s3(bucket_name: impl Into<String>, chunking: ChunkingStrategy) -> Self {
        let bucket_name = bucket_name.into();
        Self {
            name: bucket_name.clone(),
            source_type: DataSourceType::S3,
            bucket_name,
            chunking,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// ARN form of the bucket as required by the data source configuration
    pub fn bucket_arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.bucket_name)
    }

    pub fn validate(&self) -> Result<(), KnowledgeBaseValidationError> {
        validate_bucket_name(&self.bucket_name)
    }
}

/// Lifecycle status of a data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DataSourceStatus {
    Available,
    Deleting,
    DeleteUnsuccessful,
    Unknown(String),
}

impl DataSourceStatus {
    pub fn from_service(value: &str) -> Self {
        match value {
            "AVAILABLE" => Self::Available,
            "DELETING" => Self::Deleting,
            "DELETE_UNSUCCESSFUL" => Self::DeleteUnsuccessful,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for DataSourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "AVAILABLE"),
            Self::Deleting => write!(f, "DELETING"),
            Self::DeleteUnsuccessful => write!(f, "DELETE_UNSUCCESSFUL"),
            Self::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// A data source registered with a knowledge base
#[derive(Debug, Clone, Serialize)]
pub struct DataSource {
    pub id: DataSourceId,
    pub knowledge_base_id: KnowledgeBaseId,
    pub name: String,
    pub status: DataSourceStatus,
}
