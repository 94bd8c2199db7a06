//! photo-cascade library -- cleanup of resized photos and their metadata.
//!
//! When an original photo is deleted from its bucket, the
//! [`handler::CascadeHandler`] removes every resized variant of it from the
//! resized photos bucket and deletes its row from the `photos` metadata
//! table.  Both stores sit behind traits so the handler can run against S3
//! and Postgres in production and against in-memory stores in tests.

pub mod config;
pub mod errors;
pub mod event;
pub mod handler;
pub mod keys;
pub mod metadata;
pub mod metrics;
pub mod storage;

pub use errors::CascadeError;
pub use event::S3Event;
pub use handler::{CascadeHandler, CascadeOutcome};
