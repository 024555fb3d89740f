use thiserror::Error;

use super::knowledge_base::KnowledgeBaseValidationError;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    #[error("Ingestion job {job_id} failed: {message}")]
    Ingestion { job_id: String, message: String },

    #[error("Timed out: {message}")]
    Timeout { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn knowledge_base(message: impl Into<String>) -> Self {
        Self::KnowledgeBase(message.into())
    }

    pub fn ingestion(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ingestion {
            job_id: job_id.into(),
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }
}

impl From<KnowledgeBaseValidationError> for DomainError {
    fn from(err: KnowledgeBaseValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Knowledge base 'ABCDE12345' not found");
        assert_eq!(
            error.to_string(),
            "Not found: Knowledge base 'ABCDE12345' not found"
        );
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Invalid input");
        assert_eq!(error.to_string(), "Validation error: Invalid input");
    }

    #[test]
    fn test_ingestion_error() {
        let error = DomainError::ingestion("JOB1234567", "2 documents failed");
        assert_eq!(
            error.to_string(),
            "Ingestion job JOB1234567 failed: 2 documents failed"
        );
    }

    #[test]
    fn test_from_validation_error() {
        let error: DomainError = KnowledgeBaseValidationError::EmptyId.into();
        assert!(matches!(error, DomainError::Validation { .. }));
    }
}
