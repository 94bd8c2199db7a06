//! AWS S3 derived-object store.
//!
//! Issues one `DeleteObjects` request per cascade against the resized
//! photos bucket.  S3 itself reports keys that never existed as deleted;
//! S3-compatible stores that answer with a per-key `NoSuchKey` error are
//! treated the same way.
//!
//! Credentials are resolved via the standard AWS credential chain
//! (env vars, `~/.aws/credentials`, IAM role, etc.).

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info, warn};

use super::backend::{BatchDeleteSummary, DerivedObjectStore};

/// Per-key error code meaning the object was already gone.
const NO_SUCH_KEY: &str = "NoSuchKey";

/// Derived-object store backed by an S3 bucket.
pub struct S3DerivedStore {
    /// AWS S3 SDK client.
    client: Client,
    /// The resized photos bucket.
    bucket: String,
}

impl S3DerivedStore {
    /// Wrap an already configured client.
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Build a client from the default AWS configuration chain.
    ///
    /// `endpoint_url` points the client at an S3-compatible service such
    /// as MinIO or LocalStack, which usually also needs path-style
    /// addressing.
    pub async fn connect(
        bucket: String,
        endpoint_url: Option<String>,
        force_path_style: bool,
    ) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(ref endpoint) = endpoint_url {
            config_loader = config_loader.endpoint_url(endpoint);
        }

        let sdk_config = config_loader.load().await;

        let s3_config_builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(force_path_style);

        let client = Client::from_conf(s3_config_builder.build());

        info!(
            "S3 derived-object store initialized: bucket={} endpoint={}",
            bucket,
            endpoint_url.as_deref().unwrap_or("default")
        );

        Self { client, bucket }
    }

    /// Map an AWS SDK error to an anyhow error with context.
    fn map_sdk_error(context: &str, err: impl std::error::Error) -> anyhow::Error {
        anyhow::anyhow!("AWS S3 {context}: {}", DisplayErrorContext(err))
    }

    fn object_identifiers(keys: &[String]) -> anyhow::Result<Vec<ObjectIdentifier>> {
        keys.iter()
            .map(|key| {
                ObjectIdentifier::builder()
                    .key(key)
                    .build()
                    .map_err(|e| Self::map_sdk_error("delete_objects build", e))
            })
            .collect()
    }
}

/// Split per-key errors from a `DeleteObjects` response into the count of
/// missing keys and descriptions of real failures.
fn classify_errors(errors: &[aws_sdk_s3::types::Error]) -> (usize, Vec<String>) {
    let mut missing = 0;
    let mut failures = Vec::new();

    for error in errors {
        if error.code() == Some(NO_SUCH_KEY) {
            missing += 1;
        } else {
            failures.push(format!(
                "{}: {} ({})",
                error.key().unwrap_or("<unknown key>"),
                error.code().unwrap_or("UnknownError"),
                error.message().unwrap_or("no message"),
            ));
        }
    }

    (missing, failures)
}

impl DerivedObjectStore for S3DerivedStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn delete_batch(
        &self,
        keys: &[String],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<BatchDeleteSummary>> + Send + '_>> {
        let keys = keys.to_vec();
        Box::pin(async move {
            if keys.is_empty() {
                return Ok(BatchDeleteSummary::default());
            }

            debug!(
                "AWS delete_objects: bucket={} keys={}",
                self.bucket,
                keys.len()
            );

            let delete = Delete::builder()
                .set_objects(Some(Self::object_identifiers(&keys)?))
                .quiet(false)
                .build()
                .map_err(|e| Self::map_sdk_error("delete_objects build", e))?;

            let resp = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("delete_objects", e))?;

            let (missing, failures) = classify_errors(resp.errors());
            if !failures.is_empty() {
                warn!(
                    "AWS delete_objects partially failed: bucket={} failed={}",
                    self.bucket,
                    failures.len()
                );
                anyhow::bail!(
                    "{} of {} objects could not be deleted from {}: {}",
                    failures.len(),
                    keys.len(),
                    self.bucket,
                    failures.join("; ")
                );
            }

            let deleted = resp
                .deleted()
                .iter()
                .filter_map(|obj| obj.key().map(str::to_string))
                .collect();

            Ok(BatchDeleteSummary { deleted, missing })
        })
    }
}

// -- Tests -------------------------------------------------------------------
