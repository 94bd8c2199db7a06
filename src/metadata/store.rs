//! Abstract photo metadata store trait.
//!
//! Any metadata backend must implement [`PhotoMetadataStore`].  The trait
//! uses manually desugared async methods (pinned boxed futures) so it can be
//! held as `Arc<dyn PhotoMetadataStore>`.

use std::future::Future;
use std::pin::Pin;

use crate::keys::ParsedKey;

/// Identity of a row in the `photos` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhotoKey {
    /// Photo file name without extension (`photos.name`).
    pub name: String,
    /// Directory the photo lives in, trailing `/` included (`photos.dir_path`).
    pub dir_path: String,
}

impl PhotoKey {
    pub fn new(name: &str, dir_path: &str) -> Self {
        Self {
            name: name.to_string(),
            dir_path: dir_path.to_string(),
        }
    }
}

impl From<&ParsedKey> for PhotoKey {
    fn from(parsed: &ParsedKey) -> Self {
        Self::new(&parsed.base_name, &parsed.directory)
    }
}

/// Async photo metadata contract.
pub trait PhotoMetadataStore: Send + Sync + 'static {
    /// Delete the row matching `key` exactly, returning the number of rows
    /// removed.  Zero rows is not an error.
    fn delete_photo(
        &self,
        key: &PhotoKey,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<u64>> + Send + '_>>;
}
