//! Amazon S3 object store implementation

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client as S3Client;
use tracing::debug;

use crate::domain::storage::ObjectStore;
use crate::domain::DomainError;
use crate::infrastructure::aws::error_context;

/// Region where buckets are created without a location constraint
const DEFAULT_S3_REGION: &str = "us-east-1";

/// Object store backed by Amazon S3
pub struct S3ObjectStore {
    client: S3Client,
    region: Option<String>,
}

impl Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("region", &self.region)
            .finish()
    }
}

impl S3ObjectStore {
    /// Create with an existing AWS SDK config
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: S3Client::new(sdk_config),
            region: sdk_config.region().map(|r| r.as_ref().to_string()),
        }
    }
}

/// CreateBucket configuration for `region`; us-east-1 rejects an explicit constraint
fn bucket_configuration(region: Option<&str>) -> Option<CreateBucketConfiguration> {
    match region {
        None | Some(DEFAULT_S3_REGION) => None,
        Some(region) => Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build(),
        ),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, DomainError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_not_found())
                    .unwrap_or(false);

                if not_found {
                    Ok(false)
                } else {
                    Err(DomainError::storage(format!(
                        "S3 HeadBucket on '{}' failed: {}",
                        bucket,
                        error_context(e)
                    )))
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), DomainError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        if let Some(configuration) = bucket_configuration(self.region.as_deref()) {
            request = request.create_bucket_configuration(configuration);
        }

        request.send().await.map_err(|e| {
            DomainError::storage(format!(
                "S3 CreateBucket '{}' failed: {}",
                bucket,
                error_context(e)
            ))
        })?;

        Ok(())
    }

    async fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> Result<(), DomainError> {
        let body = ByteStream::from_path(path).await.map_err(|e| {
            DomainError::storage(format!("Failed to read '{}': {}", path.display(), e))
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "S3 PutObject s3://{}/{} failed: {}",
                    bucket,
                    key,
                    error_context(e)
                ))
            })?;

        debug!(bucket = %bucket, key = %key, "Object uploaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_east_1_has_no_location_constraint() {
        assert!(bucket_configuration(Some("us-east-1")).is_none());
        assert!(bucket_configuration(None).is_none());
    }

    #[test]
    fn test_other_regions_set_location_constraint() {
        let configuration = bucket_configuration(Some("eu-west-1")).unwrap();
        assert_eq!(
            configuration.location_constraint(),
            Some(&BucketLocationConstraint::EuWest1)
        );
    }
}
