//! Abstract derived-object store trait.
//!
//! Every destination store must implement [`DerivedObjectStore`].  The
//! trait is bound to a single bucket chosen at construction time.

use std::future::Future;
use std::pin::Pin;

/// Outcome of a batch delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeleteSummary {
    /// Keys the store reported as deleted.
    pub deleted: Vec<String>,
    /// Keys the store reported as already absent.
    pub missing: usize,
}

impl BatchDeleteSummary {
    /// Number of keys the request covered.
    pub fn total(&self) -> usize {
        self.deleted.len() + self.missing
    }
}

/// Async contract for the bucket holding resized photos.
pub trait DerivedObjectStore: Send + Sync + 'static {
    /// Name of the bucket deletes are issued against.
    fn bucket(&self) -> &str;

    /// Delete every key in `keys` with a single batch request.
    ///
    /// Missing keys are not an error.  Any other per-key failure fails the
    /// whole call.
    fn delete_batch(
        &self,
        keys: &[String],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<BatchDeleteSummary>> + Send + '_>>;
}
