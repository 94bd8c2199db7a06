//! Photo metadata storage layer.
//!
//! The metadata store keeps one row per original photo in the `photos`
//! table.  The [`store::PhotoMetadataStore`] trait defines the interface;
//! [`postgres::PostgresPhotoStore`] is the production implementation.

pub mod memory;
pub mod postgres;
pub mod store;
