//! # stowage-core
//!
//! Core crate for Stowage. Contains the [`traits::BlobStore`] collaborator
//! trait, configuration schemas, typed identifiers, the fixed-point
//! [`types::SizeMb`] quantity, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Stowage crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
