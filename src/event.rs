//! S3 event notification payload.
//!
//! Only the fields the cascade needs are modelled; everything else in the
//! notification is ignored during deserialization.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3EventRecord {
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub aws_region: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

/// Removal notifications carry no `size`, so it is optional here.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub sequencer: Option<String>,
}

/// The deleted original photo a cascade runs for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionEvent {
    pub bucket_name: String,
    pub object_key: String,
    pub event_name: Option<String>,
}

impl S3Event {
    /// The deletion described by the first record.
    ///
    /// Further records are ignored: the bucket notification is configured to
    /// deliver one object per event.
    pub fn first_deletion(&self) -> Option<DeletionEvent> {
        self.records.first().map(|record| DeletionEvent {
            bucket_name: record.s3.bucket.name.clone(),
            object_key: record.s3.object.key.clone(),
            event_name: record.event_name.clone(),
        })
    }
}
