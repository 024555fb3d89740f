//! Directory upload service - stages local documents into an object store bucket

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::domain::storage::ObjectStore;
use crate::domain::DomainError;

/// One uploaded file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedObject {
    pub path: PathBuf,
    pub key: String,
}

/// Outcome of a directory upload
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub bucket: String,
    pub objects: Vec<UploadedObject>,
    /// Keys written more than once during this upload
    pub overwritten_keys: Vec<String>,
}

impl UploadReport {
    fn empty(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            ..Default::default()
        }
    }

    pub fn uploaded(&self) -> usize {
        self.objects.len()
    }
}

/// Uploads every file under a directory, flattened to its base name
pub struct DirectoryUploader {
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for DirectoryUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryUploader").finish()
    }
}

impl DirectoryUploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Create the bucket when it does not exist yet; returns whether it was created
    pub async fn ensure_bucket(&self, bucket: &str) -> Result<bool, DomainError> {
        if self.store.bucket_exists(bucket).await? {
            return Ok(false);
        }

        self.store.create_bucket(bucket).await?;
        info!(bucket = %bucket, "Bucket created");
        Ok(true)
    }

    /// Upload all files found recursively under `path`.
    ///
    /// Keys are file base names, so files sharing a name in different
    /// subdirectories overwrite each other (last walked wins). A missing or
    /// non-directory `path` is logged and yields an empty report.
    pub async fn upload_directory(
        &self,
        path: &Path,
        bucket: &str,
    ) -> Result<UploadReport, DomainError> {
        if !path.is_dir() {
            error!(
                path = %path.display(),
                "Directory does not exist or is not a directory"
            );
            return Ok(UploadReport::empty(bucket));
        }

        let mut report = UploadReport::empty(bucket);
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let key = entry.file_name().to_string_lossy().into_owned();
            let file_path = entry.into_path();

            if let Some(previous) = seen.insert(key.clone(), file_path.clone()) {
                warn!(
                    bucket = %bucket,
                    key = %key,
                    previous = %previous.display(),
                    path = %file_path.display(),
                    "Key collision, object will be overwritten"
                );
                report.overwritten_keys.push(key.clone());
            }

            self.store.upload_file(&file_path, bucket, &key).await?;
            info!(bucket = %bucket, key = %key, "Uploaded file");

            report.objects.push(UploadedObject {
                path: file_path,
                key,
            });
        }

        info!(
            bucket = %bucket,
            uploaded = report.uploaded(),
            "Directory upload complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::MockObjectStore;
    use crate::infrastructure::storage::InMemoryObjectStore;
    use std::fs;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_uploads_each_nested_file_once() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("a.txt"), "a");
        write(&dir.path().join("nested/b.txt"), "b");
        write(&dir.path().join("nested/deeper/c.md"), "c");

        let mut store = MockObjectStore::new();
        store
            .expect_upload_file()
            .times(3)
            .returning(|_, _, _| Ok(()));

        let uploader = DirectoryUploader::new(Arc::new(store));
        let report = uploader.upload_directory(dir.path(), "docs").await.unwrap();

        assert_eq!(report.uploaded(), 3);
        let keys: Vec<&str> = report.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a.txt", "b.txt", "c.md"]);
    }

    #[tokio::test]
    async fn test_keys_are_base_names() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("reports/2024/q1.pdf"), "q1");

        let store = Arc::new(InMemoryObjectStore::with_buckets(&["docs"]));
        let uploader = DirectoryUploader::new(store.clone());
        uploader.upload_directory(dir.path(), "docs").await.unwrap();

        assert_eq!(store.keys("docs"), vec!["q1.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_basename_collision_last_walked_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a/readme.txt");
        let second = dir.path().join("b/readme.txt");
        write(&first, "first");
        write(&second, "second");

        let store = Arc::new(InMemoryObjectStore::with_buckets(&["docs"]));
        let uploader = DirectoryUploader::new(store.clone());
        let report = uploader.upload_directory(dir.path(), "docs").await.unwrap();

        assert_eq!(report.uploaded(), 2);
        assert_eq!(report.overwritten_keys, vec!["readme.txt".to_string()]);
        assert_eq!(store.put_count(), 2);
        assert_eq!(store.keys("docs").len(), 1);
        assert_eq!(store.object("docs", "readme.txt"), Some(second));
    }

    #[tokio::test]
    async fn test_missing_directory_uploads_nothing() {
        let dir = tempfile::tempdir().unwrap();

        let mut store = MockObjectStore::new();
        store.expect_upload_file().times(0);

        let uploader = DirectoryUploader::new(Arc::new(store));
        let report = uploader
            .upload_directory(&dir.path().join("missing"), "docs")
            .await
            .unwrap();

        assert_eq!(report.uploaded(), 0);
        assert_eq!(report.bucket, "docs");
    }

    #[tokio::test]
    async fn test_file_path_uploads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("single.txt");
        write(&file, "x");

        let mut store = MockObjectStore::new();
        store.expect_upload_file().times(0);

        let uploader = DirectoryUploader::new(Arc::new(store));
        let report = uploader.upload_directory(&file, "docs").await.unwrap();

        assert_eq!(report.uploaded(), 0);
    }

    #[tokio::test]
    async fn test_upload_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("a.txt"), "a");
        write(&dir.path().join("b.txt"), "b");

        let mut store = MockObjectStore::new();
        store
            .expect_upload_file()
            .times(1)
            .returning(|_, _, _| Err(DomainError::storage("access denied")));

        let uploader = DirectoryUploader::new(Arc::new(store));
        let result = uploader.upload_directory(dir.path(), "docs").await;

        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_ensure_bucket_creates_missing_bucket() {
        let store = Arc::new(InMemoryObjectStore::new());
        let uploader = DirectoryUploader::new(store.clone());

        assert!(uploader.ensure_bucket("docs").await.unwrap());
        assert!(!uploader.ensure_bucket("docs").await.unwrap());
        assert!(store.bucket_exists("docs").await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_bucket_skips_existing_bucket() {
        let mut store = MockObjectStore::new();
        store.expect_bucket_exists().returning(|_| Ok(true));
        store.expect_create_bucket().times(0);

        let uploader = DirectoryUploader::new(Arc::new(store));
        assert!(!uploader.ensure_bucket("docs").await.unwrap());
    }
}
