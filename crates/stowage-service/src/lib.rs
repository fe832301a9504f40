//! # stowage-service
//!
//! The hierarchy engine. Services orchestrate the [`Catalog`](stowage_database::Catalog)
//! and a [`BlobStore`](stowage_core::traits::BlobStore) so the metadata
//! tree, the per-user directory tree and the recycle bin stay in step.
//!
//! Every operation takes an [`AuthContext`] naming the acting user and
//! only ever touches that user's rows and directories.

pub mod context;
mod engine;
pub mod file;
pub mod folder;
pub mod naming;
pub mod paths;
pub mod quota;
pub mod recycle;
pub mod search;
pub mod upload;
pub mod user;

pub use context::AuthContext;
pub use file::{ArchiveDownload, DownloadService, FileDownload, FileService, PurgeOutcome, RecoverOutcome};
pub use folder::FolderService;
pub use search::{SearchQuery, SearchResults, SearchService};
pub use upload::{UploadFailure, UploadItem, UploadOutcome};
pub use user::{UserProfile, UserService};
