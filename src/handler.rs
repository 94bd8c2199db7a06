//! Deletion cascade handler.
//!
//! Runs once per S3 removal notification:
//!
//! 1. take the first record of the event,
//! 2. parse its key, stopping early for keys that do not name a file,
//! 3. batch-delete the derived objects from the resized bucket,
//! 4. delete the metadata row.
//!
//! Step 4 only runs when step 3 succeeded.  A failure in step 4 does not
//! restore the objects removed in step 3.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::errors::CascadeError;
use crate::event::S3Event;
use crate::keys::{self, KeyParse, ParsedKey};
use crate::metadata::store::{PhotoKey, PhotoMetadataStore};
use crate::metrics;
use crate::storage::backend::{BatchDeleteSummary, DerivedObjectStore};

/// What a handled event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeOutcome {
    /// The key does not name a file; nothing was deleted.
    Skipped { key: String },
    /// Derived objects and metadata were both deleted.
    Completed {
        name: String,
        directory: String,
        source_bucket: String,
        source_key: String,
        objects_deleted: usize,
        rows_deleted: u64,
    },
}

impl CascadeOutcome {
    /// Confirmation returned to the invoker, `None` for skipped keys.
    pub fn message(&self) -> Option<String> {
        match self {
            CascadeOutcome::Skipped { .. } => None,
            CascadeOutcome::Completed {
                name,
                source_bucket,
                source_key,
                ..
            } => Some(format!(
                "delete image {name} ({source_bucket}/{source_key}) from resized bucket and from photos meta db"
            )),
        }
    }
}

pub struct CascadeHandler {
    storage: Arc<dyn DerivedObjectStore>,
    metadata: Arc<dyn PhotoMetadataStore>,
}

impl CascadeHandler {
    pub fn new(
        storage: Arc<dyn DerivedObjectStore>,
        metadata: Arc<dyn PhotoMetadataStore>,
    ) -> Self {
        Self { storage, metadata }
    }

    /// Handle one removal notification.
    pub async fn handle(&self, event: &S3Event) -> Result<CascadeOutcome, CascadeError> {
        debug!("Reading options from event: {:?}", event);

        let result = self.run(event).await;
        match &result {
            Ok(CascadeOutcome::Skipped { .. }) => metrics::record_event("skipped"),
            Ok(CascadeOutcome::Completed { .. }) => metrics::record_event("completed"),
            Err(e) => metrics::record_event(e.kind()),
        }
        result
    }

    async fn run(&self, event: &S3Event) -> Result<CascadeOutcome, CascadeError> {
        let deletion = event.first_deletion().ok_or(CascadeError::EmptyEvent)?;
        info!(
            bucket = %deletion.bucket_name,
            key = %deletion.object_key,
            event_name = deletion.event_name.as_deref().unwrap_or("unknown"),
            "Handling deleted object"
        );

        let parsed = match keys::parse_key(&deletion.object_key) {
            KeyParse::File(parsed) => parsed,
            KeyParse::NotAFile => {
                info!(
                    key = %deletion.object_key,
                    "The file from event does not have an extension. May be a directory."
                );
                return Ok(CascadeOutcome::Skipped {
                    key: deletion.object_key,
                });
            }
        };

        info!(
            object_key = %parsed.object_key(),
            file_name = %parsed.file_name(),
            base_name = %parsed.base_name,
            directory = %parsed.directory,
            "Parsed object key"
        );

        let summary = self.delete_derived_objects(&parsed).await?;
        let rows_deleted = self.delete_metadata(&parsed).await?;

        Ok(CascadeOutcome::Completed {
            name: parsed.base_name,
            directory: parsed.directory,
            source_bucket: deletion.bucket_name,
            source_key: deletion.object_key,
            objects_deleted: summary.deleted.len(),
            rows_deleted,
        })
    }

    async fn delete_derived_objects(
        &self,
        parsed: &ParsedKey,
    ) -> Result<BatchDeleteSummary, CascadeError> {
        let derived = keys::derived_keys(parsed);
        let bucket = self.storage.bucket().to_string();
        let started = Instant::now();

        let result = self.storage.delete_batch(&derived).await;
        let elapsed = started.elapsed();
        metrics::record_step("derived_objects", result.is_ok(), elapsed);

        match result {
            Ok(summary) => {
                info!(
                    bucket = %bucket,
                    requested = derived.len(),
                    deleted = summary.deleted.len(),
                    missing = summary.missing,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Successfully deleted resized photos of {}",
                    parsed.base_name
                );
                debug!("Deleted keys: {:?}", summary.deleted);
                metrics::record_derived_objects_deleted(summary.deleted.len());
                Ok(summary)
            }
            Err(e) => {
                error!(
                    bucket = %bucket,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Could not delete resized photos of {}: {:#}",
                    parsed.base_name,
                    e
                );
                Err(CascadeError::DerivedObjectDeletionFailed { bucket, source: e })
            }
        }
    }

    async fn delete_metadata(&self, parsed: &ParsedKey) -> Result<u64, CascadeError> {
        let key = PhotoKey::from(parsed);
        let started = Instant::now();

        let result = self.metadata.delete_photo(&key).await;
        let elapsed = started.elapsed();
        metrics::record_step("metadata", result.is_ok(), elapsed);

        match result {
            Ok(rows) => {
                info!(
                    name = %key.name,
                    dir_path = %key.dir_path,
                    rows,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Deleted photo metadata"
                );
                metrics::record_metadata_rows_deleted(rows);
                Ok(rows)
            }
            Err(e) => {
                error!(
                    name = %key.name,
                    dir_path = %key.dir_path,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Failed to delete from db: {:#}",
                    e
                );
                Err(CascadeError::MetadataDeletionFailed {
                    name: key.name,
                    dir_path: key.dir_path,
                    source: e,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::memory::MemoryPhotoStore;
    use crate::storage::memory::MemoryDerivedStore;

    fn event_for(bucket: &str, key: &str) -> S3Event {
        let json = serde_json::json!({
            "Records": [{
                "eventName": "ObjectRemoved:Delete",
                "s3": {
                    "bucket": { "name": bucket },
                    "object": { "key": key }
                }
            }]
        });
        serde_json::from_value(json).unwrap()
    }

    fn handler(
        storage: &Arc<MemoryDerivedStore>,
        metadata: &Arc<MemoryPhotoStore>,
    ) -> CascadeHandler {
        CascadeHandler::new(storage.clone(), metadata.clone())
    }

    #[tokio::test]
    async fn test_end_to_end_vacation_photo() {
        let storage = Arc::new(MemoryDerivedStore::new("RESIZED_PHOTOS_BUCKET"));
        let metadata = Arc::new(MemoryPhotoStore::new());
        storage.insert("photos/2023/vacation_small.avif").await;
        storage.insert("photos/2023/vacation_large@2x.jpeg").await;
        storage.insert("photos/2023/other_small.avif").await;
        metadata
            .insert(PhotoKey::new("vacation", "photos/2023/"))
            .await;

        let outcome = handler(&storage, &metadata)
            .handle(&event_for("src", "photos/2023/vacation.png"))
            .await
            .unwrap();

        let requests = storage.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].len(), 12);
        assert_eq!(requests[0][0], "photos/2023/vacation_small.avif");
        assert_eq!(requests[0][3], "photos/2023/vacation_small@2x.avif");
        assert_eq!(requests[0][11], "photos/2023/vacation_large@2x.jpeg");

        assert!(!storage.contains("photos/2023/vacation_small.avif").await);
        assert!(storage.contains("photos/2023/other_small.avif").await);
        assert_eq!(metadata.delete_calls(), 1);
        assert!(
            !metadata
                .contains(&PhotoKey::new("vacation", "photos/2023/"))
                .await
        );

        assert_eq!(
            outcome,
            CascadeOutcome::Completed {
                name: "vacation".to_string(),
                directory: "photos/2023/".to_string(),
                source_bucket: "src".to_string(),
                source_key: "photos/2023/vacation.png".to_string(),
                objects_deleted: 2,
                rows_deleted: 1,
            }
        );
        let message = outcome.message().unwrap();
        assert!(message.contains("vacation"));
        assert!(message.contains("resized bucket"));
        assert!(message.contains("photos meta db"));
    }

    #[tokio::test]
    async fn test_directory_marker_is_skipped() {
        let storage = Arc::new(MemoryDerivedStore::new("resized"));
        let metadata = Arc::new(MemoryPhotoStore::new());

        let outcome = handler(&storage, &metadata)
            .handle(&event_for("src", "uploads/"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CascadeOutcome::Skipped {
                key: "uploads/".to_string()
            }
        );
        assert_eq!(outcome.message(), None);
        assert!(storage.requests().await.is_empty());
        assert_eq!(metadata.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_keys_without_extension_perform_no_deletions() {
        for key in ["uploads", "a/b/c", "albums.2023/cover", ""] {
            let storage = Arc::new(MemoryDerivedStore::new("resized"));
            let metadata = Arc::new(MemoryPhotoStore::new());

            let outcome = handler(&storage, &metadata)
                .handle(&event_for("src", key))
                .await
                .unwrap();

            assert!(matches!(outcome, CascadeOutcome::Skipped { .. }), "{key}");
            assert!(storage.requests().await.is_empty(), "{key}");
            assert_eq!(metadata.delete_calls(), 0, "{key}");
        }
    }

    #[tokio::test]
    async fn test_storage_failure_skips_database() {
        let storage = Arc::new(MemoryDerivedStore::failing("resized", "Access Denied"));
        let metadata = Arc::new(MemoryPhotoStore::new());
        metadata.insert(PhotoKey::new("vacation", "photos/")).await;

        let err = handler(&storage, &metadata)
            .handle(&event_for("src", "photos/vacation.png"))
            .await
            .unwrap_err();

        match err {
            CascadeError::DerivedObjectDeletionFailed { bucket, source } => {
                assert_eq!(bucket, "resized");
                assert_eq!(source.to_string(), "Access Denied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(metadata.delete_calls(), 0);
        assert!(metadata.contains(&PhotoKey::new("vacation", "photos/")).await);
    }

    #[tokio::test]
    async fn test_database_failure_after_storage_success() {
        let storage = Arc::new(MemoryDerivedStore::new("resized"));
        let metadata = Arc::new(MemoryPhotoStore::failing("connection terminated"));
        storage.insert("photos/vacation_small.webp").await;

        let err = handler(&storage, &metadata)
            .handle(&event_for("src", "photos/vacation.png"))
            .await
            .unwrap_err();

        match err {
            CascadeError::MetadataDeletionFailed {
                name,
                dir_path,
                source,
            } => {
                assert_eq!(name, "vacation");
                assert_eq!(dir_path, "photos/");
                assert_eq!(source.to_string(), "connection terminated");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // No retry, and derived objects stay deleted.
        assert_eq!(metadata.delete_calls(), 1);
        assert_eq!(storage.requests().await.len(), 1);
        assert!(!storage.contains("photos/vacation_small.webp").await);
    }

    #[tokio::test]
    async fn test_missing_derived_objects_and_row_still_succeed() {
        let storage = Arc::new(MemoryDerivedStore::new("resized"));
        let metadata = Arc::new(MemoryPhotoStore::new());

        let outcome = handler(&storage, &metadata)
            .handle(&event_for("src", "never-resized.jpg"))
            .await
            .unwrap();

        match outcome {
            CascadeOutcome::Completed {
                name,
                directory,
                objects_deleted,
                rows_deleted,
                ..
            } => {
                assert_eq!(name, "never-resized");
                assert_eq!(directory, "");
                assert_eq!(objects_deleted, 0);
                assert_eq!(rows_deleted, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(storage.requests().await[0][0], "never-resized_small.avif");
    }

    #[tokio::test]
    async fn test_extension_only_name_propagates_empty_base_name() {
        let storage = Arc::new(MemoryDerivedStore::new("resized"));
        let metadata = Arc::new(MemoryPhotoStore::new());
        metadata.insert(PhotoKey::new("", "photos/")).await;

        handler(&storage, &metadata)
            .handle(&event_for("src", "photos/.jpg"))
            .await
            .unwrap();

        assert_eq!(storage.requests().await[0][0], "photos/_small.avif");
        assert!(!metadata.contains(&PhotoKey::new("", "photos/")).await);
    }

    #[tokio::test]
    async fn test_only_first_record_is_handled() {
        let storage = Arc::new(MemoryDerivedStore::new("resized"));
        let metadata = Arc::new(MemoryPhotoStore::new());
        let event: S3Event = serde_json::from_value(serde_json::json!({
            "Records": [
                {"s3": {"bucket": {"name": "src"}, "object": {"key": "a.jpg"}}},
                {"s3": {"bucket": {"name": "src"}, "object": {"key": "b.jpg"}}}
            ]
        }))
        .unwrap();

        handler(&storage, &metadata).handle(&event).await.unwrap();

        let requests = storage.requests().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].iter().all(|k| k.starts_with("a_")));
        assert_eq!(metadata.delete_calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_event_is_rejected() {
        let storage = Arc::new(MemoryDerivedStore::new("resized"));
        let metadata = Arc::new(MemoryPhotoStore::new());
        let event: S3Event = serde_json::from_str(r#"{"Records": []}"#).unwrap();

        let err = handler(&storage, &metadata)
            .handle(&event)
            .await
            .unwrap_err();

        assert!(matches!(err, CascadeError::EmptyEvent));
        assert!(storage.requests().await.is_empty());
        assert_eq!(metadata.delete_calls(), 0);
    }
}
