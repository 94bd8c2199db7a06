//! Cascade error types.
//!
//! Backends report failures as [`anyhow::Error`]; the handler wraps them in
//! the variant for the step that failed so the invocation error names it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CascadeError {
    /// The notification carried no records.
    #[error("event contains no records")]
    EmptyEvent,

    /// The batch delete against the resized bucket failed.  The metadata
    /// row is left untouched.
    #[error("could not delete photos")]
    DerivedObjectDeletionFailed {
        bucket: String,
        #[source]
        source: anyhow::Error,
    },

    /// The metadata row could not be deleted.  Derived objects are already
    /// gone at this point and are not restored.
    #[error("failed to delete from db")]
    MetadataDeletionFailed {
        name: String,
        dir_path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CascadeError {
    /// Short machine-readable name, used as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            CascadeError::EmptyEvent => "empty_event",
            CascadeError::DerivedObjectDeletionFailed { .. } => "derived_object_deletion_failed",
            CascadeError::MetadataDeletionFailed { .. } => "metadata_deletion_failed",
        }
    }
}
