//! Core traits defined in `stowage-core` and implemented by other crates.

pub mod blob;

pub use blob::{BlobEntry, BlobStore, ByteStream};
