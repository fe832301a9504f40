//! Request handlers, one module per domain.

pub mod auth;
pub mod file;
pub mod folder;
pub mod health;
pub mod search;
