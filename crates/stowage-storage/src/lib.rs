//! # stowage-storage
//!
//! [`BlobStore`](stowage_core::traits::BlobStore) implementation over the
//! local filesystem, plus the zip archiver used for folder downloads.

pub mod archive;
pub mod providers;

pub use providers::LocalBlobStore;
