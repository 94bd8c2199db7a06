//! In-memory photo metadata store.
//!
//! Holds `photos` rows in a `tokio::sync::RwLock<HashSet<PhotoKey>>` and
//! counts delete calls, so tests can assert whether the database step ran.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;

use super::store::{PhotoKey, PhotoMetadataStore};

pub struct MemoryPhotoStore {
    rows: RwLock<HashSet<PhotoKey>>,
    delete_calls: AtomicUsize,
    /// When set, every delete fails with this message.
    failure: Option<String>,
}

impl Default for MemoryPhotoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPhotoStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashSet::new()),
            delete_calls: AtomicUsize::new(0),
            failure: None,
        }
    }

    /// A store whose deletes always fail with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub async fn insert(&self, key: PhotoKey) {
        self.rows.write().await.insert(key);
    }

    pub async fn contains(&self, key: &PhotoKey) -> bool {
        self.rows.read().await.contains(key)
    }

    /// Number of delete statements issued against this store.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

impl PhotoMetadataStore for MemoryPhotoStore {
    fn delete_photo(
        &self,
        key: &PhotoKey,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<u64>> + Send + '_>> {
        let key = key.clone();
        Box::pin(async move {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(ref message) = self.failure {
                anyhow::bail!("{message}");
            }

            let removed = self.rows.write().await.remove(&key);
            Ok(u64::from(removed))
        })
    }
}
