//! In-memory object store implementation

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::storage::ObjectStore;
use crate::domain::DomainError;

/// Thread-safe in-memory object store
///
/// Records which local file each key was last written from; nothing leaves the process.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    buckets: RwLock<HashSet<String>>,
    objects: RwLock<HashMap<(String, String), PathBuf>>,
    puts: RwLock<usize>,
}

impl InMemoryObjectStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with the given buckets already present
    pub fn with_buckets(buckets: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut set = store.buckets.write().unwrap();

            for bucket in buckets {
                set.insert(bucket.to_string());
            }
        }
        store
    }

    /// Source path of the object stored under `bucket`/`key`
    pub fn object(&self, bucket: &str, key: &str) -> Option<PathBuf> {
        self.objects
            .read()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Sorted keys stored in `bucket`
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Total number of upload calls, including overwrites
    pub fn put_count(&self) -> usize {
        *self.puts.read().unwrap()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, DomainError> {
        Ok(self.buckets.read().unwrap().contains(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), DomainError> {
        self.buckets.write().unwrap().insert(bucket.to_string());
        Ok(())
    }

    async fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> Result<(), DomainError> {
        if !self.buckets.read().unwrap().contains(bucket) {
            return Err(DomainError::not_found(format!(
                "Bucket '{}' does not exist",
                bucket
            )));
        }

        if !path.is_file() {
            return Err(DomainError::storage(format!(
                "Cannot read '{}'",
                path.display()
            )));
        }

        self.objects
            .write()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), path.to_path_buf());
        *self.puts.write().unwrap() += 1;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_requires_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "a").unwrap();

        let store = InMemoryObjectStore::new();
        assert!(store.upload_file(&file, "docs", "a.txt").await.is_err());

        store.create_bucket("docs").await.unwrap();
        assert!(store.bucket_exists("docs").await.unwrap());
        store.upload_file(&file, "docs", "a.txt").await.unwrap();

        assert_eq!(store.keys("docs"), vec!["a.txt".to_string()]);
        assert_eq!(store.object("docs", "a.txt"), Some(file));
    }

    #[tokio::test]
    async fn test_upload_overwrites_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        std::fs::write(&first, "1").unwrap();
        std::fs::write(&second, "2").unwrap();

        let store = InMemoryObjectStore::with_buckets(&["docs"]);
        store.upload_file(&first, "docs", "same").await.unwrap();
        store.upload_file(&second, "docs", "same").await.unwrap();

        assert_eq!(store.object("docs", "same"), Some(second));
        assert_eq!(store.put_count(), 2);
        assert_eq!(store.keys("docs").len(), 1);
    }
}
