//! File domain entities.

pub mod model;

pub use model::{CreateFileItem, FileItem, join_file_name};
