//! Derived-object stores.
//!
//! The [`backend::DerivedObjectStore`] trait abstracts over the bucket
//! holding resized photos.  [`aws::S3DerivedStore`] talks to S3;
//! [`memory::MemoryDerivedStore`] keeps keys in process.

pub mod aws;
pub mod backend;
pub mod memory;
