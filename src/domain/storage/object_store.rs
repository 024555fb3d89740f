//! Object store trait

use std::path::Path;

use async_trait::async_trait;

use crate::domain::error::DomainError;

#[cfg(test)]
use mockall::automock;

/// Bucket/key object storage (S3 or compatible)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether the bucket exists and is accessible
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, DomainError>;

    /// Create a bucket in the store's region
    async fn create_bucket(&self, bucket: &str) -> Result<(), DomainError>;

    /// Upload a local file, overwriting any object already stored under `key`
    async fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> Result<(), DomainError>;
}
