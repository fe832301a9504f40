//! Folder operations and folder-tree uploads.

pub mod service;
pub mod upload;

pub use service::FolderService;
pub use upload::{NEW_FOLDER_NAME, UPLOADED_FOLDER_NAME};
