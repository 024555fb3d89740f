//! Knowledge base validation utilities

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Length of identifiers assigned by Bedrock (knowledge bases, data sources, ingestion jobs)
pub const RESOURCE_ID_LENGTH: usize = 10;

/// Lower bound for `numberOfResults`
pub const MIN_NUMBER_OF_RESULTS: u32 = 1;

/// Upper bound for `numberOfResults`
pub const MAX_NUMBER_OF_RESULTS: u32 = 100;

static RESOURCE_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-zA-Z]{10}$").expect("valid resource id regex"));

// S3 bucket naming: 3-63 chars, lowercase letters, digits, dots and hyphens
static BUCKET_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").expect("valid bucket name regex")
});

/// Knowledge base validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeBaseValidationError {
    /// ID is empty
    EmptyId,
    /// ID does not match the service identifier format
    InvalidIdFormat { kind: &'static str, id: String },
    /// Result count outside the accepted range
    InvalidNumberOfResults { value: u32, min: u32, max: u32 },
    /// Bucket name violates S3 naming rules
    InvalidBucketName { name: String },
    /// Knowledge base name is empty
    EmptyName,
    /// Data source type tag not supported by this client
    UnsupportedDataSourceType { value: String },
}

impl fmt::Display for KnowledgeBaseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "Identifier cannot be empty"),
            Self::InvalidIdFormat { kind, id } => {
                write!(
                    f,
                    "Invalid {} ID '{}': must be {} alphanumeric characters",
                    kind, id, RESOURCE_ID_LENGTH
                )
            }
            Self::InvalidNumberOfResults { value, min, max } => {
                write!(
                    f,
                    "Invalid number of results {}: must be between {} and {}",
                    value, min, max
                )
            }
            Self::InvalidBucketName { name } => {
                write!(f, "Invalid S3 bucket name '{}'", name)
            }
            Self::EmptyName => write!(f, "Knowledge base name cannot be empty"),
            Self::UnsupportedDataSourceType { value } => {
                write!(f, "Unsupported data source type '{}': expected S3", value)
            }
        }
    }
}

impl std::error::Error for KnowledgeBaseValidationError {}

/// Validate a service-assigned resource ID (knowledge base, data source, ingestion job)
pub fn validate_resource_id(
    kind: &'static str,
    id: &str,
) -> Result<(), KnowledgeBaseValidationError> {
    if id.is_empty() {
        return Err(KnowledgeBaseValidationError::EmptyId);
    }

    if !RESOURCE_ID_PATTERN.is_match(id) {
        return Err(KnowledgeBaseValidationError::InvalidIdFormat {
            kind,
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Validate a knowledge base ID
pub fn validate_knowledge_base_id(id: &str) -> Result<(), KnowledgeBaseValidationError> {
    validate_resource_id("knowledge base", id)
}

/// Validate the number of results requested from retrieval
pub fn validate_number_of_results(value: u32) -> Result<(), KnowledgeBaseValidationError> {
    if !(MIN_NUMBER_OF_RESULTS..=MAX_NUMBER_OF_RESULTS).contains(&value) {
        return Err(KnowledgeBaseValidationError::InvalidNumberOfResults {
            value,
            min: MIN_NUMBER_OF_RESULTS,
            max: MAX_NUMBER_OF_RESULTS,
        });
    }

    Ok(())
}

/// Validate an S3 bucket name
pub fn validate_bucket_name(name: &str) -> Result<(), KnowledgeBaseValidationError> {
    if !BUCKET_NAME_PATTERN.is_match(name) || name.contains("..") {
        return Err(KnowledgeBaseValidationError::InvalidBucketName {
            name: name.to_string(),
        });
    }

    Ok(())
}
