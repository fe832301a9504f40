//! Folder domain entities.

pub mod model;
pub mod tree;

pub use model::{CreateFolder, Folder, FolderDetails};
pub use tree::descendant_folder_ids;
