//! File operations and downloads.

pub mod download;
pub mod service;

pub use download::{ArchiveDownload, DownloadService, FileDownload};
pub use service::{FileService, PurgeOutcome, RecoverOutcome};
