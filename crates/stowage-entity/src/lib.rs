//! # stowage-entity
//!
//! Catalog record models for Stowage. Every struct in this crate represents
//! a database table row or a value derived from one. All entities derive
//! `Debug`, `Clone`, `Serialize`, `Deserialize`, and table rows
//! additionally derive `sqlx::FromRow`.

pub mod file;
pub mod folder;
pub mod user;
