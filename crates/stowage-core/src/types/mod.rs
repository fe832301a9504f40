//! Core type definitions used across the Stowage workspace.

pub mod id;
pub mod size;

pub use id::*;
pub use size::{BYTES_PER_MB, SizeMb};
