//! In-memory derived-object store.
//!
//! Keys live in a `tokio::sync::RwLock<HashSet<...>>`.  Every batch request
//! is recorded, and the store can be told to fail, so the cascade can be
//! exercised without an S3 service.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::RwLock;

use super::backend::{BatchDeleteSummary, DerivedObjectStore};

pub struct MemoryDerivedStore {
    bucket: String,
    objects: RwLock<HashSet<String>>,
    /// Key lists of every batch request, in call order.
    requests: RwLock<Vec<Vec<String>>>,
    /// When set, every batch delete fails with this message.
    failure: Option<String>,
}

impl MemoryDerivedStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: RwLock::new(HashSet::new()),
            requests: RwLock::new(Vec::new()),
            failure: None,
        }
    }

    /// A store whose batch deletes always fail with `message`.
    pub fn failing(bucket: &str, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(bucket)
        }
    }

    pub async fn insert(&self, key: &str) {
        self.objects.write().await.insert(key.to_string());
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains(key)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Key lists of every batch request received so far.
    pub async fn requests(&self) -> Vec<Vec<String>> {
        self.requests.read().await.clone()
    }
}

impl DerivedObjectStore for MemoryDerivedStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn delete_batch(
        &self,
        keys: &[String],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<BatchDeleteSummary>> + Send + '_>> {
        let keys = keys.to_vec();
        Box::pin(async move {
            self.requests.write().await.push(keys.clone());

            if let Some(ref message) = self.failure {
                anyhow::bail!("{message}");
            }

            let mut objects = self.objects.write().await;
            let mut summary = BatchDeleteSummary::default();
            for key in keys {
                if objects.remove(&key) {
                    summary.deleted.push(key);
                } else {
                    summary.missing += 1;
                }
            }
            Ok(summary)
        })
    }
}
